//! Component registry - named, reusable schema fragments.
//!
//! Definitions are grouped by collection (`schemas`, `requestBodies`, ...) and
//! keep insertion order within a collection so output is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TranslateError;

/// Collection name -> definition name -> fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Components {
    collections: BTreeMap<String, Map<String, Value>>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a definition.
    pub fn get(&self, collection: &str, name: &str) -> Option<&Value> {
        self.collections.get(collection)?.get(name)
    }

    pub fn contains(&self, collection: &str, name: &str) -> bool {
        self.get(collection, name).is_some()
    }

    /// Store a definition, returning the one it replaced.
    pub fn insert(
        &mut self,
        collection: impl Into<String>,
        name: impl Into<String>,
        fragment: Value,
    ) -> Option<Value> {
        self.collections
            .entry(collection.into())
            .or_default()
            .insert(name.into(), fragment)
    }

    /// Store a definition, failing if the name already holds a different fragment.
    pub fn insert_strict(
        &mut self,
        collection: &str,
        name: &str,
        fragment: Value,
    ) -> Result<(), TranslateError> {
        match self.get(collection, name) {
            Some(existing) if *existing != fragment => {
                Err(TranslateError::DuplicateDefinitionConflict {
                    collection: collection.to_string(),
                    name: name.to_string(),
                })
            }
            _ => {
                self.insert(collection, name, fragment);
                Ok(())
            }
        }
    }

    /// Merge `other` into this registry. Later definitions win.
    pub fn merge(&mut self, other: &Components) {
        for (collection, defs) in &other.collections {
            let target = self.collections.entry(collection.clone()).or_default();
            for (name, fragment) in defs {
                target.insert(name.clone(), fragment.clone());
            }
        }
    }

    /// Merge `other` into this registry, rejecting conflicting definitions.
    pub fn merge_strict(&mut self, other: &Components) -> Result<(), TranslateError> {
        for (collection, defs) in &other.collections {
            for (name, fragment) in defs {
                self.insert_strict(collection, name, fragment.clone())?;
            }
        }
        Ok(())
    }

    /// A copy of this registry with `other` merged in.
    pub fn merged(&self, other: &Components) -> Components {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// True when no collection holds a definition.
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Map::is_empty)
    }

    /// Total number of definitions across collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(Map::len).sum()
    }

    /// Iterate collections and their definitions.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a registry from its JSON form (`{"schemas": {"Name": {...}}}`).
    ///
    /// # Errors
    ///
    /// Returns `TranslateError::InvalidDescription` if the value is not a
    /// two-level object.
    pub fn from_value(value: &Value) -> Result<Self, TranslateError> {
        let Some(collections) = value.as_object() else {
            return Err(TranslateError::InvalidDescription {
                path: "#".to_string(),
                message: "components must be an object of collections".to_string(),
            });
        };

        let mut result = Components::new();
        for (collection, defs) in collections {
            let Some(defs) = defs.as_object() else {
                return Err(TranslateError::InvalidDescription {
                    path: format!("#/{}", collection),
                    message: "collection must be an object of definitions".to_string(),
                });
            };
            result
                .collections
                .insert(collection.clone(), defs.clone());
        }
        Ok(result)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.collections
                .iter()
                .map(|(k, v)| (k.clone(), Value::Object(v.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_get() {
        let mut components = Components::new();
        assert!(components.is_empty());

        components.insert("schemas", "Email", json!({ "type": "string" }));
        assert!(components.contains("schemas", "Email"));
        assert!(!components.contains("requestBodies", "Email"));
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn merge_last_write_wins() {
        let mut a = Components::new();
        a.insert("schemas", "Id", json!({ "type": "string" }));
        let mut b = Components::new();
        b.insert("schemas", "Id", json!({ "type": "integer" }));

        a.merge(&b);
        assert_eq!(a.get("schemas", "Id"), Some(&json!({ "type": "integer" })));
    }

    #[test]
    fn merged_leaves_inputs_untouched() {
        let mut a = Components::new();
        a.insert("schemas", "A", json!({}));
        let mut b = Components::new();
        b.insert("requestBodies", "B", json!({}));

        let merged = a.merged(&b);
        assert_eq!(merged.len(), 2);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn strict_merge_rejects_conflicts() {
        let mut a = Components::new();
        a.insert("schemas", "Id", json!({ "type": "string" }));

        let mut same = Components::new();
        same.insert("schemas", "Id", json!({ "type": "string" }));
        assert!(a.merge_strict(&same).is_ok());

        let mut different = Components::new();
        different.insert("schemas", "Id", json!({ "type": "integer" }));
        let result = a.merge_strict(&different);
        assert!(matches!(
            result,
            Err(TranslateError::DuplicateDefinitionConflict { name, .. }) if name == "Id"
        ));
    }

    #[test]
    fn value_round_trip() {
        let value = json!({
            "schemas": { "Email": { "type": "string", "format": "email" } },
            "requestBodies": {}
        });
        let components = Components::from_value(&value).unwrap();
        assert_eq!(components.to_value(), value);
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn from_value_rejects_flat_maps() {
        let result = Components::from_value(&json!({ "schemas": [] }));
        assert!(matches!(
            result,
            Err(TranslateError::InvalidDescription { path, .. }) if path == "#/schemas"
        ));
    }
}
