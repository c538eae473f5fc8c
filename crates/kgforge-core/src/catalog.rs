//! Type catalog definitions supplied per extraction run
//!
//! A catalog names the entity and relationship types that are valid for one
//! run, along with their properties and extraction guidelines. An empty
//! catalog means open-world extraction.

use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// Definition of one property on an entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// Declared value type (defaults to "string")
    #[serde(rename = "type", default = "default_property_type")]
    pub property_type: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

fn default_property_type() -> String {
    "string".to_string()
}

impl Default for PropertyDefinition {
    fn default() -> Self {
        Self {
            property_type: default_property_type(),
            description: String::new(),
        }
    }
}

/// Schema for one permitted entity type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectTypeSchema {
    /// Type name
    pub name: String,
    /// Type description
    #[serde(default)]
    pub description: String,
    /// Property name to definition
    #[serde(default)]
    pub properties: HashMap<String, PropertyDefinition>,
    /// Names of properties that must be present
    #[serde(default)]
    pub required: Vec<String>,
    /// Free-text extraction guidelines
    #[serde(default)]
    pub guidelines: String,
}

impl ObjectTypeSchema {
    /// Create a schema with just a name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Add a property definition
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDefinition {
                property_type: property_type.into(),
                description: description.into(),
            },
        );
        self
    }

    /// Mark a property as required
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Check whether a property is in the required list
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// Schema for one permitted relationship type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipTypeSchema {
    /// Type name
    pub name: String,
    /// Type description
    #[serde(default)]
    pub description: String,
    /// Allowed source entity type names (empty = any)
    #[serde(default)]
    pub source_types: Vec<String>,
    /// Allowed target entity type names (empty = any)
    #[serde(default)]
    pub target_types: Vec<String>,
    /// Free-text extraction guidelines
    #[serde(default)]
    pub guidelines: String,
}

impl RelationshipTypeSchema {
    /// Create a schema with just a name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Constrain the allowed source types
    pub fn with_source_types(mut self, types: Vec<String>) -> Self {
        self.source_types = types;
        self
    }

    /// Constrain the allowed target types
    pub fn with_target_types(mut self, types: Vec<String>) -> Self {
        self.target_types = types;
        self
    }
}

/// The caller-supplied catalog constraining one run's extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeCatalog {
    /// Entity type name to schema
    #[serde(default)]
    pub object_types: HashMap<String, ObjectTypeSchema>,
    /// Relationship type name to schema
    #[serde(default)]
    pub relationship_types: HashMap<String, RelationshipTypeSchema>,
}

impl TypeCatalog {
    /// Catalog with no type constraints (open-world extraction)
    pub fn open() -> Self {
        Self::default()
    }

    /// True when neither entity nor relationship types are defined
    pub fn is_empty(&self) -> bool {
        self.object_types.is_empty() && self.relationship_types.is_empty()
    }

    /// Entity type names in deterministic (sorted) order
    pub fn object_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.object_types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Relationship type names in deterministic (sorted) order
    pub fn relationship_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.relationship_types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up an entity type schema by name
    pub fn object_type(&self, name: &str) -> Option<&ObjectTypeSchema> {
        self.object_types.get(name)
    }

    /// Add an entity type schema, keyed by its name
    pub fn with_object_type(mut self, schema: ObjectTypeSchema) -> Self {
        self.object_types.insert(schema.name.clone(), schema);
        self
    }

    /// Add a relationship type schema, keyed by its name
    pub fn with_relationship_type(mut self, schema: RelationshipTypeSchema) -> Self {
        self.relationship_types.insert(schema.name.clone(), schema);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_defaults_to_string() {
        let def: PropertyDefinition = serde_json::from_str(r#"{"description": "a prop"}"#).unwrap();
        assert_eq!(def.property_type, "string");
    }

    #[test]
    fn test_object_schema_builder() {
        let schema = ObjectTypeSchema::new("Person", "A human being")
            .with_property("role", "string", "Job title")
            .with_required("role");

        assert!(schema.is_required("role"));
        assert!(!schema.is_required("age"));
        assert_eq!(schema.properties["role"].property_type, "string");
    }

    #[test]
    fn test_catalog_names_are_sorted() {
        let catalog = TypeCatalog::open()
            .with_object_type(ObjectTypeSchema::new("Organization", ""))
            .with_object_type(ObjectTypeSchema::new("Person", ""))
            .with_object_type(ObjectTypeSchema::new("Location", ""));

        assert_eq!(
            catalog.object_type_names(),
            vec!["Location", "Organization", "Person"]
        );
        assert!(!catalog.is_empty());
        assert!(TypeCatalog::open().is_empty());
    }
}
