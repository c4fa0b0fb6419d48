//! The instance event bus: `$on`/`$once`/`$off`/`$emit` (spec §4.8).

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use wisp_reactive::Value;

use crate::config::GlobalConfig;

/// An event handler. `$once` wraps the user handler in a self-removing shim
/// that still compares equal (by `.fn` reference) to the original for
/// `$off(name, handler)` lookups, per spec §4.8.
#[derive(Clone)]
struct Handler {
    /// The callable invoked on `$emit`.
    call: Rc<dyn Fn(&[Value])>,
    /// Identity used for `$off` removal: the user-supplied handler's
    /// pointer, which for a `$once` shim differs from `call`.
    identity: usize,
}

/// `name -> ordered list of handlers`, owned by an [`crate::instance::Instance`].
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<String, Vec<Handler>>>,
}

fn identity_of(f: &Rc<dyn Fn(&[Value])>) -> usize {
    Rc::as_ptr(f) as *const () as usize
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$on(name, handler)`: appends to the ordered handler list.
    pub fn on(&self, name: impl Into<String>, handler: Rc<dyn Fn(&[Value])>) {
        let identity = identity_of(&handler);
        self.handlers
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(Handler {
                call: handler,
                identity,
            });
    }

    /// `$once(name, handler)`: the stored callable removes itself from the
    /// bus before delegating to `handler`, but is keyed by `handler`'s own
    /// identity so `$off(name, handler)` still finds and removes it before
    /// it ever fires.
    pub fn once(self: &Rc<Self>, name: impl Into<String>, handler: Rc<dyn Fn(&[Value])>) {
        let name = name.into();
        let identity = identity_of(&handler);
        let bus = Rc::downgrade(self);
        let name_for_shim = name.clone();
        let shim: Rc<dyn Fn(&[Value])> = Rc::new(move |args: &[Value]| {
            if let Some(bus) = bus.upgrade() {
                bus.off_handler(&name_for_shim, identity);
            }
            handler(args);
        });
        self.handlers
            .borrow_mut()
            .entry(name)
            .or_default()
            .push(Handler {
                call: shim,
                identity,
            });
    }

    fn off_handler(&self, name: &str, identity: usize) {
        if let Some(list) = self.handlers.borrow_mut().get_mut(name) {
            list.retain(|h| h.identity != identity);
        }
    }

    /// `$off()`: resets every registration.
    pub fn off_all(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// `$off(name)`: clears every handler registered for `name`.
    pub fn off_event(&self, name: &str) {
        self.handlers.borrow_mut().remove(name);
    }

    /// `$off(name, handler)`: removes the specific handler, matching either
    /// its own identity or (for `$once` registrations) the original
    /// handler's identity.
    pub fn off(&self, name: &str, handler: &Rc<dyn Fn(&[Value])>) {
        self.off_handler(name, identity_of(handler));
    }

    /// `$emit(name, ..args)`: snapshots the handler list before invoking so
    /// handlers added/removed mid-emit don't affect this dispatch, then
    /// calls each with the instance as receiver via an error-trapping
    /// invoker (spec §4.8, §7: routed to the error channel rather than
    /// unwinding past `$emit`).
    pub fn emit(&self, name: &str, args: &[Value]) {
        self.case_sensitivity_tip(name);
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default();
        for handler in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| (handler.call)(args)));
            if result.is_err() {
                GlobalConfig::warn(format!("error in event handler for {name:?}"));
            }
        }
    }

    fn case_sensitivity_tip(&self, name: &str) {
        let lower = name.to_ascii_lowercase();
        if lower == name {
            return;
        }
        let handlers = self.handlers.borrow();
        if handlers.contains_key(&lower) && !handlers.contains_key(name) {
            GlobalConfig::warn(format!(
                "event {name:?} is emitted in mixed case but handlers are registered for \
                 {lower:?}; HTML attributes are case-insensitive, consider using kebab-case \
                 event names"
            ));
        }
    }
}
