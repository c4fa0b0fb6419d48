//! End-to-end instance construction covering spec §8's Scenario A (computed
//! + watch interaction) and Scenario C (deep `data` merge across `extend`).

use std::cell::RefCell;
use std::rc::Rc;

use wisp_core::options::{RawOptions, WatchDef};
use wisp_core::Definition;
use wisp_reactive::Value;

#[test]
fn scenario_a_computed_watch_interaction() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_for_watch = log.clone();

    let options = RawOptions::new()
        .with_data(|_| serde_json::json!({ "n": 1.0 }))
        .with_computed("d", |vm| {
            let n = vm.data_get("n").as_number().unwrap_or(0.0);
            Value::Number(n * 2.0)
        })
        .with_watch(
            "d",
            WatchDef {
                handler: Rc::new(move |_vm, new, _old| {
                    log_for_watch.borrow_mut().push(new.as_number().unwrap());
                }),
                deep: false,
                immediate: false,
                sync: false,
            },
        );

    let def = Definition::root(options);
    let instance = def.instantiate(Default::default(), None, Vec::new());

    instance.data_set("n", Value::Number(3.0));
    instance.data_set("n", Value::Number(3.0));
    instance.data_set("n", Value::Number(4.0));

    assert_eq!(*log.borrow(), vec![6.0, 8.0]);
}

#[test]
fn scenario_c_extend_deep_merges_data() {
    let base = RawOptions::new().with_data(|_| serde_json::json!({ "a": 1, "b": { "x": 1 } }));
    let root = Definition::root(base);

    let child = Rc::new(RawOptions::new().with_data(|_| serde_json::json!({ "b": { "y": 2 }, "c": 3 })));
    let sub = root.extend(child);

    let instance = sub.instantiate(Default::default(), None, Vec::new());
    let snapshot = instance.data_snapshot();

    assert_eq!(
        snapshot,
        serde_json::json!({ "a": 1, "b": { "x": 1, "y": 2 }, "c": 3 })
    );
}

#[test]
fn computed_caches_between_reads_and_reevaluates_after_write() {
    let calls = Rc::new(RefCell::new(0));
    let calls_for_getter = calls.clone();

    let options = RawOptions::new()
        .with_data(|_| serde_json::json!({ "a": 1.0, "b": 2.0 }))
        .with_computed("sum", move |vm| {
            *calls_for_getter.borrow_mut() += 1;
            let a = vm.data_get("a").as_number().unwrap_or(0.0);
            let b = vm.data_get("b").as_number().unwrap_or(0.0);
            Value::Number(a + b)
        });

    let instance = Definition::root(options).instantiate(Default::default(), None, Vec::new());

    assert_eq!(instance.computed_get("sum").unwrap().as_number(), Some(3.0));
    assert_eq!(instance.computed_get("sum").unwrap().as_number(), Some(3.0));
    assert_eq!(*calls.borrow(), 1);

    instance.data_set("a", Value::Number(10.0));
    assert_eq!(instance.computed_get("sum").unwrap().as_number(), Some(12.0));
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn provide_resolves_after_data_and_inject_resolves_before() {
    let parent_options = RawOptions::new()
        .with_data(|_| serde_json::json!({ "theme": "dark" }))
        .with_provide(|vm| {
            let theme = vm.data_get("theme").as_str().unwrap_or_default().to_string();
            serde_json::json!({ "theme": theme })
        });
    let parent = Definition::root(parent_options).instantiate(Default::default(), None, Vec::new());

    let child_options = RawOptions::new().with_inject(
        "theme",
        wisp_core::options::InjectSpec {
            from: "theme".to_string(),
            default: None,
        },
    );
    let child = Definition::root(child_options).instantiate(Default::default(), Some(parent), Vec::new());

    assert_eq!(child.data_get("theme").as_str(), Some("dark"));
}

#[test]
fn event_bus_once_fires_exactly_once() {
    let count = Rc::new(RefCell::new(0));
    let count_for_handler = count.clone();

    let instance = Definition::root(RawOptions::new()).instantiate(Default::default(), None, Vec::new());
    instance.once(
        "tick",
        Rc::new(move |_args| {
            *count_for_handler.borrow_mut() += 1;
        }),
    );

    instance.emit("tick", &[]);
    instance.emit("tick", &[]);

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn set_on_array_index_splices_in_place() {
    let arr = Value::array([Value::Number(1.0), Value::Number(2.0)]);
    wisp_core::Instance::set(&arr, "1", Value::Number(99.0));
    assert_eq!(arr.index(1).as_number(), Some(99.0));
    assert_eq!(arr.len(), 2);
}

#[test]
fn delete_on_array_index_removes_element() {
    let arr = Value::array([Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
    wisp_core::Instance::delete(&arr, "1");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr.index(1).as_number(), Some(3.0));
}

#[test]
fn watch_immediate_invokes_callback_at_registration() {
    let options = RawOptions::new().with_data(|_| serde_json::json!({ "n": 5.0 }));
    let instance = Definition::root(options).instantiate(Default::default(), None, Vec::new());

    let log = Rc::new(RefCell::new(Vec::new()));
    let log_for_cb = log.clone();
    let _unwatch = instance.watch_path(
        "n".to_string(),
        Rc::new(move |_vm, new, _old| log_for_cb.borrow_mut().push(new.as_number().unwrap())),
        false,
        true,
        true,
    );

    assert_eq!(*log.borrow(), vec![5.0]);
}
