//! Prop validation and coercion (spec §4.7).
//!
//! `propsData` here is the programmatic `name -> Value` map a parent passed
//! down; the template compiler's job of turning `<comp prop-name="...">`
//! attribute strings into this map is out of scope (spec §1/§2 places the
//! parser and the render-function pipeline that would wire the two together
//! outside this crate's boundary).

use std::collections::HashMap;

use wisp_reactive::Value;

use crate::config::GlobalConfig;
use crate::error::CoreError;
use crate::options::{resolve_default, OptionValue, PropDef, PropDefault, PropType};

/// Resolves the final `name -> Value` map to install on an instance's
/// `_props`, validating each declared prop against the raw `props_data`.
///
/// `previous_defaults` carries the previously-computed default per prop
/// across re-validations of the same instance (spec §4.7: "previous default
/// reused if propsData re-render yields undefined for the same key");
/// callers that only validate once (most instance construction) can pass an
/// empty map each time.
pub fn validate_props(
    defs: &HashMap<String, PropDef>,
    props_data: &HashMap<String, Value>,
    previous_defaults: &mut HashMap<String, Value>,
) -> HashMap<String, Value> {
    let mut resolved = HashMap::with_capacity(defs.len());
    for (name, def) in defs {
        let value = resolve_one(name, def, props_data, previous_defaults);
        resolved.insert(name.clone(), value);
    }
    resolved
}

fn resolve_one(
    name: &str,
    def: &PropDef,
    props_data: &HashMap<String, Value>,
    previous_defaults: &mut HashMap<String, Value>,
) -> Value {
    let absent = !props_data.contains_key(name);
    let mut value = props_data.get(name).cloned().unwrap_or(Value::Null);

    let has_boolean = def.types.contains(&PropType::Boolean);
    let string_outranks_boolean = def.types.contains(&PropType::String)
        && def
            .types
            .iter()
            .position(|t| *t == PropType::String)
            .unwrap_or(usize::MAX)
            < def
                .types
                .iter()
                .position(|t| *t == PropType::Boolean)
                .unwrap_or(usize::MAX);

    if has_boolean {
        if absent && def.default.is_none() {
            value = Value::Bool(false);
        } else if !string_outranks_boolean {
            if let Value::String(s) = &value {
                if s.is_empty() {
                    value = Value::Bool(true);
                }
            }
        }
    }

    if value.is_null() {
        if let Some(default) = &def.default {
            let needs_factory = def
                .types
                .iter()
                .any(|t| matches!(t, PropType::Object | PropType::Array));
            if needs_factory && matches!(default, PropDefault::Value(_)) {
                GlobalConfig::warn(format!(
                    "invalid default value for prop {name:?}: Object/Array props must use a \
                     factory function to return the default value"
                ));
            }
            let json = resolve_default(default);
            let resolved_value = crate::options::json_to_reactive(&json);
            previous_defaults.insert(name.to_string(), resolved_value.clone());
            value = resolved_value;
        } else if let Some(cached) = previous_defaults.get(name) {
            value = cached.clone();
        } else if def.required {
            let err = CoreError::PropValidationFailed {
                prop: name.to_string(),
                reason: "required prop has no value and no default".to_string(),
            };
            GlobalConfig::warn(err.to_string());
            GlobalConfig::report_error(err);
        }
    }

    if !def.types.is_empty() && !value.is_null() && !type_matches(&def.types, &value) {
        let err = CoreError::PropValidationFailed {
            prop: name.to_string(),
            reason: format!("expected one of {:?}", def.types),
        };
        GlobalConfig::warn(err.to_string());
        GlobalConfig::report_error(err);
    }

    if let Some(validator) = &def.validator {
        if !validator(&value) {
            let err = CoreError::PropValidationFailed {
                prop: name.to_string(),
                reason: "custom validator rejected value".to_string(),
            };
            GlobalConfig::warn(err.to_string());
            GlobalConfig::report_error(err);
        }
    }

    value
}

fn type_matches(types: &[PropType], value: &Value) -> bool {
    types.iter().any(|ty| match ty {
        PropType::String => matches!(value, Value::String(_)),
        PropType::Number => matches!(value, Value::Number(_)),
        PropType::Boolean => matches!(value, Value::Bool(_)),
        PropType::Object => matches!(value, Value::Object(_)),
        PropType::Array => matches!(value, Value::Array(_)),
        PropType::Function => matches!(value, Value::Raw(_)),
    })
}

/// Converts a plain default value into an [`OptionValue`] without invoking a
/// factory, used by callers constructing a [`PropDef`] from a constant.
pub fn constant_default(value: OptionValue) -> PropDefault {
    PropDefault::Value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_boolean_prop_without_default_is_false() {
        let defs = HashMap::from([(
            "visible".to_string(),
            PropDef {
                types: vec![PropType::Boolean],
                ..Default::default()
            },
        )]);
        let resolved = validate_props(&defs, &HashMap::new(), &mut HashMap::new());
        assert_eq!(resolved["visible"].as_bool(), Some(false));
    }

    #[test]
    fn empty_string_boolean_prop_coerces_to_true() {
        let defs = HashMap::from([(
            "disabled".to_string(),
            PropDef {
                types: vec![PropType::Boolean],
                ..Default::default()
            },
        )]);
        let data = HashMap::from([("disabled".to_string(), Value::String("".into()))]);
        let resolved = validate_props(&defs, &data, &mut HashMap::new());
        assert_eq!(resolved["disabled"].as_bool(), Some(true));
    }

    #[test]
    fn string_outranking_boolean_keeps_empty_string_as_string() {
        let defs = HashMap::from([(
            "label".to_string(),
            PropDef {
                types: vec![PropType::String, PropType::Boolean],
                ..Default::default()
            },
        )]);
        let data = HashMap::from([("label".to_string(), Value::String("".into()))]);
        let resolved = validate_props(&defs, &data, &mut HashMap::new());
        assert_eq!(resolved["label"].as_str(), Some(""));
    }

    #[test]
    fn missing_propsdata_reuses_previous_default() {
        let defs = HashMap::from([(
            "count".to_string(),
            PropDef {
                default: Some(PropDefault::Factory(std::rc::Rc::new(|| {
                    serde_json::json!(1)
                }))),
                ..Default::default()
            },
        )]);
        let mut previous = HashMap::new();
        let first = validate_props(&defs, &HashMap::new(), &mut previous);
        let second = validate_props(&defs, &HashMap::new(), &mut previous);
        assert_eq!(first["count"].as_number(), second["count"].as_number());
    }

    #[test]
    fn type_mismatch_reports_core_error() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_for_cb = seen.clone();
        crate::config::GlobalConfig::set_error_handler(move |err| {
            seen_for_cb.borrow_mut().push(err.to_string());
        });

        let defs = HashMap::from([(
            "age".to_string(),
            PropDef {
                types: vec![PropType::Number],
                ..Default::default()
            },
        )]);
        let data = HashMap::from([("age".to_string(), Value::String("old".into()))]);
        crate::config::GlobalConfig::silence_warnings(|| {
            validate_props(&defs, &data, &mut HashMap::new());
        });

        assert_eq!(seen.borrow().len(), 1);
        crate::config::GlobalConfig::reset_for_tests();
    }
}
