//! [`OptionValue`], the dynamic, JSON-shaped representation used for prop
//! type descriptors, `propsData`, and anything else in an option record that
//! is data rather than a closure.

use wisp_reactive::Value as ReactiveValue;

/// A `serde_json::Value`-backed dynamic value: the shape raw user option
/// data takes before it's either consumed by normalization (props/inject
/// schemas) or converted into a live [`ReactiveValue`] during instance init.
pub type OptionValue = serde_json::Value;

/// Deep-merges `child` over `parent`: object keys are merged recursively
/// (child wins on conflict, new child-only keys are added), anything else
/// (arrays, scalars, a type mismatch) is a full replacement by `child`
/// unless `child` is `Null`, in which case `parent` is kept. Used for the
/// `data`/`provide` merge strategy (spec §4.4).
pub fn deep_merge(parent: &OptionValue, child: &OptionValue) -> OptionValue {
    match (parent, child) {
        (_, OptionValue::Null) => parent.clone(),
        (OptionValue::Object(p), OptionValue::Object(c)) => {
            let mut merged = p.clone();
            for (k, cv) in c.iter() {
                match merged.get(k) {
                    Some(pv) => {
                        let m = deep_merge(pv, cv);
                        merged.insert(k.clone(), m);
                    }
                    None => {
                        merged.insert(k.clone(), cv.clone());
                    }
                }
            }
            OptionValue::Object(merged)
        }
        _ => child.clone(),
    }
}

/// Converts a plain JSON value tree into a live, observed [`ReactiveValue`]
/// tree, matching `observe()`'s walk over a freshly-created `data`/`provide`
/// result (spec §4.3).
pub fn json_to_reactive(json: &OptionValue) -> ReactiveValue {
    match json {
        OptionValue::Null => ReactiveValue::Null,
        OptionValue::Bool(b) => ReactiveValue::Bool(*b),
        OptionValue::Number(n) => ReactiveValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        OptionValue::String(s) => ReactiveValue::String(s.as_str().into()),
        OptionValue::Array(items) => ReactiveValue::array(items.iter().map(json_to_reactive)),
        OptionValue::Object(map) => {
            ReactiveValue::object(map.iter().map(|(k, v)| (k.clone(), json_to_reactive(v))))
        }
    }
}

/// The inverse of [`json_to_reactive`], for reading a reactive value back out
/// as plain JSON (e.g. for `$data`/`$props` snapshots). Does not register
/// any dependency beyond what reading each field naturally does.
pub fn reactive_to_json(value: &ReactiveValue) -> OptionValue {
    match value {
        ReactiveValue::Null => OptionValue::Null,
        ReactiveValue::Bool(b) => OptionValue::Bool(*b),
        ReactiveValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(OptionValue::Number)
            .unwrap_or(OptionValue::Null),
        ReactiveValue::String(s) => OptionValue::String(s.to_string()),
        ReactiveValue::Array(_) => {
            let len = value.len();
            let items: Vec<OptionValue> =
                (0..len).map(|i| reactive_to_json(&value.index(i))).collect();
            OptionValue::Array(items)
        }
        ReactiveValue::Object(_) => {
            let mut map = serde_json::Map::new();
            for key in value.keys() {
                map.insert(key.to_string(), reactive_to_json(&value.get(&key)));
            }
            OptionValue::Object(map)
        }
        ReactiveValue::Raw(_) => OptionValue::Null,
    }
}
