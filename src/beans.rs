//! Getter/setter pairing by JavaBeans naming conventions.

use std::collections::HashMap;

use crate::error::Result;
use crate::introspect::{MethodDescription, TypeDescription, TypeRef};

/// Accessor method names of one property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accessors {
    pub getter: Option<String>,
    pub setter: Option<String>,
}

/// Maps property names to accessor names. Missing entries are not errors.
pub trait PropertyResolver: Send + Sync {
    fn resolve(&self, description: &TypeDescription) -> Result<HashMap<String, Accessors>>;
}

/// `getX()`, `isX()` and `setX(value)` over the declared instance methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanConventions;

impl PropertyResolver for BeanConventions {
    fn resolve(&self, description: &TypeDescription) -> Result<HashMap<String, Accessors>> {
        let mut getters: HashMap<String, &MethodDescription> = HashMap::new();
        let mut setters: HashMap<String, Vec<&MethodDescription>> = HashMap::new();

        for method in description.methods.iter().filter(|m| !m.modifiers.is_static()) {
            if let Some(property) = getter_property(method) {
                // `getX` wins over `isX` when both are declared.
                let keep_existing = getters
                    .get(&property)
                    .is_some_and(|existing| existing.name.starts_with("get"));
                if !keep_existing {
                    getters.insert(property, method);
                }
            } else if let Some(property) = setter_property(method) {
                setters.entry(property).or_default().push(method);
            }
        }

        let mut resolved: HashMap<String, Accessors> = HashMap::new();
        for (property, getter) in &getters {
            resolved.entry(property.clone()).or_default().getter = Some(getter.name.clone());
        }
        for (property, candidates) in setters {
            let getter_type = getters.get(&property).and_then(|g| g.return_type.as_ref());
            let chosen = match getter_type {
                Some(expected) => candidates
                    .into_iter()
                    .find(|s| same_erasure(&s.parameters[0], expected)),
                None => candidates.into_iter().next(),
            };
            if let Some(setter) = chosen {
                resolved.entry(property).or_default().setter = Some(setter.name.clone());
            }
        }
        Ok(resolved)
    }
}

fn getter_property(method: &MethodDescription) -> Option<String> {
    if !method.parameters.is_empty() {
        return None;
    }
    let return_type = method.return_type.as_ref()?;
    if let Some(rest) = method.name.strip_prefix("get") {
        return property_name(rest);
    }
    if let Some(rest) = method.name.strip_prefix("is")
        && return_type.erasure() == "boolean"
    {
        return property_name(rest);
    }
    None
}

fn setter_property(method: &MethodDescription) -> Option<String> {
    if method.parameters.len() != 1 || method.return_type.is_some() {
        return None;
    }
    method.name.strip_prefix("set").and_then(property_name)
}

fn same_erasure(a: &TypeRef, b: &TypeRef) -> bool {
    a.erasure() == b.erasure()
}

/// `Name` → `name`, `URL` → `URL`, empty → none.
pub fn property_name(suffix: &str) -> Option<String> {
    let mut chars = suffix.chars();
    let first = chars.next()?;
    if first.is_lowercase() {
        // `getfoo` is not a bean accessor.
        return None;
    }
    let second_upper = chars.next().is_some_and(char::is_uppercase);
    if second_upper {
        return Some(suffix.to_string());
    }
    let mut name: String = first.to_lowercase().collect();
    name.push_str(&suffix[first.len_utf8()..]);
    Some(name)
}
