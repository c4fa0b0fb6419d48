//! Normalization of the three raw user shapes spec §4.4 calls out:
//! `props`, `inject`, and `directives`. Each can arrive in more than one
//! shape; normalization reduces them to the canonical map [`RawOptions`]
//! stores.
//!
//! Because user input in a typed language can't be "an array of strings or
//! an object of types or an object of descriptors" the way a JS object
//! literal can, each raw shape is its own small input enum that a caller
//! builds explicitly; `normalize_*` converts it to the canonical shape.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::GlobalConfig;
use crate::error::CoreError;
use crate::options::raw::{DirectiveDef, InjectDefault, InjectSpec, PropDef, PropDefault, PropType};
use crate::options::value::OptionValue;

/// Raw user shape for one `props` entry, before normalization.
pub enum PropInput {
    /// Bare name with no type constraint (`props: ["foo"]`).
    Name,
    /// A single declared type.
    Type(PropType),
    /// More than one accepted type.
    Types(Vec<PropType>),
    /// The fully-specified descriptor.
    Full(PropDef),
}

/// Raw user shape for the whole `props` option.
pub enum PropsInput {
    /// `props: ["a", "b"]`.
    List(Vec<String>),
    /// `props: { a: Number, b: { type: String, required: true } }`.
    Map(HashMap<String, PropInput>),
}

/// Converts kebab-case/snake_case prop and inject names to camelCase, per
/// spec §4.4 ("All names camelized").
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' || ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Normalizes a [`PropsInput`] into the canonical `name -> PropDef` map
/// (spec §4.4's props normalization).
pub fn normalize_props(input: PropsInput) -> HashMap<String, PropDef> {
    match input {
        PropsInput::List(names) => names
            .into_iter()
            .map(|name| (camelize(&name), PropDef::default()))
            .collect(),
        PropsInput::Map(map) => map
            .into_iter()
            .map(|(name, input)| {
                let def = match input {
                    PropInput::Name => PropDef::default(),
                    PropInput::Type(ty) => PropDef {
                        types: vec![ty],
                        ..Default::default()
                    },
                    PropInput::Types(types) => PropDef {
                        types,
                        ..Default::default()
                    },
                    PropInput::Full(def) => def,
                };
                (camelize(&name), def)
            })
            .collect(),
    }
}

/// Raw user shape for one `inject` entry.
pub enum InjectInput {
    /// `inject: ["foo"]` — resolves from an ancestor's `provide` under the
    /// same key name.
    Name,
    /// `inject: { localName: "providedKey" }`.
    From(String),
    /// The fully-specified descriptor (`from` plus an optional default).
    Full { from: Option<String>, default: Option<InjectDefault> },
}

/// Raw user shape for the whole `inject` option.
pub enum InjectsInput {
    List(Vec<String>),
    Map(HashMap<String, InjectInput>),
}

/// Normalizes an [`InjectsInput`] into the canonical `key -> InjectSpec` map.
pub fn normalize_inject(input: InjectsInput) -> HashMap<String, InjectSpec> {
    match input {
        InjectsInput::List(keys) => keys
            .into_iter()
            .map(|key| {
                let key = camelize(&key);
                let spec = InjectSpec {
                    from: key.clone(),
                    default: None,
                };
                (key, spec)
            })
            .collect(),
        InjectsInput::Map(map) => map
            .into_iter()
            .map(|(local, input)| {
                let local = camelize(&local);
                let spec = match input {
                    InjectInput::Name => InjectSpec {
                        from: local.clone(),
                        default: None,
                    },
                    InjectInput::From(from) => InjectSpec { from, default: None },
                    InjectInput::Full { from, default } => InjectSpec {
                        from: from.unwrap_or_else(|| local.clone()),
                        default,
                    },
                };
                (local, spec)
            })
            .collect(),
    }
}

/// Raw user shape for one `directives` entry: either the full `{bind,
/// update}` pair, or a bare function applied to both hooks (spec §4.4:
/// "bare function -> `{bind: fn, update: fn}`").
pub enum DirectiveInput {
    Bare(Rc<dyn Fn(&crate::instance::Instance, &wisp_reactive::Value)>),
    Full(DirectiveDef),
}

pub fn normalize_directive(input: DirectiveInput) -> DirectiveDef {
    match input {
        DirectiveInput::Bare(f) => DirectiveDef {
            bind: Some(f.clone()),
            update: Some(Rc::new({
                let f = f.clone();
                move |vm, new, _old| f(vm, new)
            })),
        },
        DirectiveInput::Full(def) => def,
    }
}

/// HTML5 custom-element-ish name check used when registering a `components`
/// entry (spec §4.4: "checked for valid names... reject reserved/built-in
/// tags"). Delegates to `wisp-template`'s reserved-tag tables would create a
/// cyclic dependency, so the small, stable set used for this check is
/// inlined here.
pub fn validate_component_name(name: &str) -> Result<(), CoreError> {
    const RESERVED: &[&str] = &[
        "slot", "component", "html", "script", "style", "template",
    ];
    let lower = name.to_ascii_lowercase();
    if RESERVED.contains(&lower.as_str()) {
        let err = CoreError::ReservedComponentName(name.to_string());
        GlobalConfig::report_error(err.clone());
        return Err(err);
    }
    let valid_grammar = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_grammar {
        let err = CoreError::InvalidOptionShape {
            key: "components".into(),
            reason: format!("{name:?} is not a valid component name"),
        };
        GlobalConfig::report_error(err.clone());
        return Err(err);
    }
    Ok(())
}

/// Invokes a [`PropDefault`]/[`InjectDefault`], materializing it to a plain
/// [`OptionValue`].
pub fn resolve_default(default: &PropDefault) -> OptionValue {
    match default {
        PropDefault::Value(v) => v.clone(),
        PropDefault::Factory(f) => f(),
    }
}

pub fn resolve_inject_default(default: &InjectDefault) -> OptionValue {
    match default {
        InjectDefault::Value(v) => v.clone(),
        InjectDefault::Factory(f) => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camelize_converts_kebab_and_snake_case() {
        assert_eq!(camelize("my-prop"), "myProp");
        assert_eq!(camelize("my_prop"), "myProp");
        assert_eq!(camelize("already-camel-ish"), "alreadyCamelIsh");
        assert_eq!(camelize("plain"), "plain");
    }

    #[test]
    fn props_list_normalizes_to_untyped_defs() {
        let defs = normalize_props(PropsInput::List(vec!["foo-bar".to_string()]));
        assert!(defs.contains_key("fooBar"));
        assert!(defs["fooBar"].types.is_empty());
    }

    #[test]
    fn inject_name_only_resolves_from_same_key() {
        let specs = normalize_inject(InjectsInput::List(vec!["theme".to_string()]));
        assert_eq!(specs["theme"].from, "theme");
        assert!(specs["theme"].default.is_none());
    }

    #[test]
    fn reserved_and_malformed_component_names_are_rejected() {
        assert!(validate_component_name("slot").is_err());
        assert!(validate_component_name("component").is_err());
        assert!(validate_component_name("1bad").is_err());
        assert!(validate_component_name("my-widget").is_ok());
    }
}
