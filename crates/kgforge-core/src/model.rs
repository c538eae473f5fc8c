//! Run-scoped data model for extracted entities and relationships
//!
//! Everything here is created fresh at the start of a run and lives only for
//! that run's duration; persistence of the returned graph is the caller's
//! responsibility.

use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// How an extracted mention relates to entities already known to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityAction {
    /// A new entity not present in the prior graph
    #[default]
    Create,
    /// New information about an already-known entity
    Enrich,
    /// A plain mention of an already-known entity
    Reference,
}

/// An entity already known from a prior run, supplied as read-only context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingEntityRef {
    /// Permanent, pre-run identifier
    pub id: String,
    /// Entity name
    pub name: String,
    /// Entity type name
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Entity description
    #[serde(default)]
    pub description: String,
    /// Similarity score in [0, 1] against the current document
    #[serde(default)]
    pub similarity: f32,
}

/// An entity as parsed from generation output, before identifier assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Entity name
    pub name: String,
    /// Entity type name
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Entity description
    #[serde(default)]
    pub description: String,
    /// Additional properties beyond name/type/description
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    /// Identity-resolution action
    #[serde(default)]
    pub action: EntityAction,
    /// Permanent id of the matched entity; required when action is
    /// enrich or reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_entity_id: Option<String>,
}

impl ExtractedEntity {
    /// Create an entity with the given name and type
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            description: String::new(),
            properties: HashMap::new(),
            action: EntityAction::Create,
            existing_entity_id: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An extracted entity with its run-scoped temp-id assigned
///
/// Immutable once assigned: temp-ids are unique within a run and never
/// reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Run-scoped, human-readable identifier
    pub temp_id: String,
    /// The underlying extracted entity
    #[serde(flatten)]
    pub entity: ExtractedEntity,
}

impl Entity {
    /// Entity name
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    /// Entity type name
    pub fn entity_type(&self) -> &str {
        &self.entity.entity_type
    }

    /// Entity description
    pub fn description(&self) -> &str {
        &self.entity.description
    }
}

/// A relationship linking two entities extracted in the same run
///
/// Both refs must be temp-ids produced earlier in the run. A ref to an
/// unknown temp-id is a generation-output defect; this core does not reject
/// it, the quality gate simply sees the endpoints as unconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    /// Temp-id of the source entity
    pub source_ref: String,
    /// Temp-id of the target entity
    pub target_ref: String,
    /// Relationship type name
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Relationship description
    #[serde(default)]
    pub description: String,
}

impl ExtractedRelationship {
    /// Create a relationship between two temp-ids
    pub fn new(
        source_ref: impl Into<String>,
        target_ref: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            rel_type: rel_type.into(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&EntityAction::Enrich).unwrap(),
            "\"enrich\""
        );
        let action: EntityAction = serde_json::from_str("\"reference\"").unwrap();
        assert_eq!(action, EntityAction::Reference);
    }

    #[test]
    fn test_extracted_entity_defaults() {
        let entity: ExtractedEntity =
            serde_json::from_str(r#"{"name": "Alice", "type": "Person"}"#).unwrap();
        assert_eq!(entity.name, "Alice");
        assert_eq!(entity.entity_type, "Person");
        assert_eq!(entity.action, EntityAction::Create);
        assert!(entity.properties.is_empty());
        assert!(entity.existing_entity_id.is_none());
    }

    #[test]
    fn test_entity_flattens_temp_id() {
        let entity = Entity {
            temp_id: "person_alice".to_string(),
            entity: ExtractedEntity::new("Alice", "Person"),
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["temp_id"], "person_alice");
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["type"], "Person");

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn test_relationship_type_field_rename() {
        let rel: ExtractedRelationship = serde_json::from_str(
            r#"{"source_ref": "person_alice", "target_ref": "organization_acme", "type": "works_at"}"#,
        )
        .unwrap();
        assert_eq!(rel.rel_type, "works_at");
        assert_eq!(rel.description, "");
    }
}
