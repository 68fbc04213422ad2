use crate::world::ObjectRef;
use std::collections::BTreeMap;

pub const VARIABLE_MARKER: char = '$';

pub fn normalize_var_name(name: &str) -> Option<String> {
    let bare = name.trim().trim_start_matches(VARIABLE_MARKER).trim();
    if bare.is_empty() {
        None
    } else {
        Some(format!("{VARIABLE_MARKER}{bare}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    bindings: BTreeMap<String, ObjectRef>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, object: ObjectRef) -> Option<String> {
        let key = normalize_var_name(name)?;
        self.bindings.insert(key.clone(), object);
        Some(key)
    }

    pub fn get(&self, name: &str) -> Option<ObjectRef> {
        let key = normalize_var_name(name)?;
        self.bindings.get(&key).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectRef)> {
        self.bindings.iter().map(|(name, object)| (name.as_str(), *object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ComponentId, GameObjectId};

    #[test]
    fn names_are_normalized_to_one_marker() {
        assert_eq!(normalize_var_name("x").as_deref(), Some("$x"));
        assert_eq!(normalize_var_name("$x").as_deref(), Some("$x"));
        assert_eq!(normalize_var_name(" $$x ").as_deref(), Some("$x"));
        assert_eq!(normalize_var_name(""), None);
        assert_eq!(normalize_var_name("$"), None);
    }

    #[test]
    fn last_write_wins_and_lookup_ignores_marker() {
        let mut vars = VariableTable::new();
        vars.set("spawner", ObjectRef::GameObject(GameObjectId(1)));
        vars.set("$spawner", ObjectRef::Component(ComponentId(7)));

        assert_eq!(vars.len(), 1);
        assert_eq!(
            vars.get("spawner"),
            Some(ObjectRef::Component(ComponentId(7)))
        );
        assert_eq!(vars.get("$missing"), None);
        assert_eq!(vars.set("  ", ObjectRef::GameObject(GameObjectId(0))), None);
        assert!(vars.contains("$spawner"));
    }
}
