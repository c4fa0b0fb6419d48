//! Array mutation notifies a watcher of that array's `length`, with the
//! callback receiving `(new, old)`.

use std::cell::RefCell;
use std::rc::Rc;

use wisp_reactive::{depend_array, Value, Watcher, WatcherOptions};

#[test]
fn push_notifies_length_watcher_with_new_and_old() {
    let arr = Value::array([Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
    let arr_for_getter = arr.clone();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_cb = seen.clone();

    let _watcher: Watcher<usize> = Watcher::new(
        "arr.length",
        move || {
            depend_array(&arr_for_getter);
            arr_for_getter.len()
        },
        Some(Box::new(move |new, old| {
            seen_in_cb.borrow_mut().push((*new, *old));
        })),
        WatcherOptions {
            sync: true,
            ..Default::default()
        },
    );

    arr.push(Value::Number(4.0));

    assert_eq!(*seen.borrow(), vec![(4, 3)]);
}
