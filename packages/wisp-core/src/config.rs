//! Process-global configuration, mirroring the real framework's well-known
//! mutable config object (spec §5's "Shared resource policy": set once
//! before any [`crate::definition::Definition`] is created).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::CoreError;

/// Whether development-only warnings (prop validation, duplicate option
/// definitions, readonly writes, …) are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

struct ConfigState {
    mode: Mode,
    warn_handler: Option<Rc<dyn Fn(&str)>>,
    error_handler: Option<Rc<dyn Fn(CoreError)>>,
}

thread_local! {
    static CONFIG: RefCell<ConfigState> = RefCell::new(ConfigState {
        mode: Mode::Development,
        warn_handler: None,
        error_handler: None,
    });
    static SILENT: Cell<bool> = const { Cell::new(false) };
}

/// Process-wide knobs for warnings, error routing, and development-mode
/// checks. There is exactly one of these per thread; set it up before
/// constructing any [`crate::definition::Definition`].
pub struct GlobalConfig;

impl GlobalConfig {
    /// Sets [`Mode::Production`] or [`Mode::Development`]. Development is the
    /// default.
    pub fn set_mode(mode: Mode) {
        CONFIG.with(|c| c.borrow_mut().mode = mode);
    }

    pub fn mode() -> Mode {
        CONFIG.with(|c| c.borrow().mode)
    }

    pub fn is_development() -> bool {
        matches!(Self::mode(), Mode::Development)
    }

    /// Installs the sink that development-only warning strings (spec §7's
    /// `options.warn`) are routed to.
    pub fn set_warn_handler(handler: impl Fn(&str) + 'static) {
        CONFIG.with(|c| c.borrow_mut().warn_handler = Some(Rc::new(handler)));
    }

    /// Installs the sink that [`CoreError`]s are routed to. This is the
    /// `errorCaptured`/global-error-handler terminus spec §7 describes for
    /// user-function exceptions that reach the top without being caught by
    /// an ancestor.
    pub fn set_error_handler(handler: impl Fn(CoreError) + 'static) {
        CONFIG.with(|c| c.borrow_mut().error_handler = Some(Rc::new(handler)));
    }

    /// Emits a development-only warning. No-op in [`Mode::Production`].
    pub fn warn(message: impl AsRef<str>) {
        if !Self::is_development() || SILENT.with(|s| s.get()) {
            return;
        }
        let message = message.as_ref();
        CONFIG.with(|c| {
            if let Some(handler) = c.borrow().warn_handler.as_ref() {
                handler(message);
            } else {
                #[cfg(feature = "trace")]
                tracing::warn!(target: "wisp_core", "{message}");
                #[cfg(not(feature = "trace"))]
                let _ = message;
            }
        });
    }

    /// Routes a [`CoreError`] to the installed error handler, or logs it via
    /// `tracing` if none is installed.
    pub fn report_error(err: CoreError) {
        CONFIG.with(|c| {
            if let Some(handler) = c.borrow().error_handler.as_ref() {
                handler(err);
            } else {
                #[cfg(feature = "trace")]
                tracing::error!(target: "wisp_core", %err, "unhandled core error");
                #[cfg(not(feature = "trace"))]
                let _ = err;
            }
        });
    }

    /// Runs `f` with warnings suppressed, for tests that intentionally
    /// exercise a warning path without wanting it printed.
    pub fn silence_warnings<T>(f: impl FnOnce() -> T) -> T {
        SILENT.with(|s| s.set(true));
        let ret = f();
        SILENT.with(|s| s.set(false));
        ret
    }

    #[cfg(test)]
    pub(crate) fn reset_for_tests() {
        CONFIG.with(|c| {
            let mut c = c.borrow_mut();
            c.mode = Mode::Development;
            c.warn_handler = None;
            c.error_handler = None;
        });
        SILENT.with(|s| s.set(false));
    }
}
