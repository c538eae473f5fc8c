//! Output-schema builders for structured generation
//!
//! The schemas constrain what the generation service may return. When a
//! type catalog is supplied, the `type` field is restricted to an enum of
//! exactly the catalog's names; otherwise it stays an open string.

use kgforge_core::catalog::ObjectTypeSchema;
use kgforge_core::catalog::RelationshipTypeSchema;
use serde_json::json;
use serde_json::Value;
use std::collections::HashMap;

fn type_field(names: Vec<&String>) -> Value {
    if names.is_empty() {
        json!({ "type": "string" })
    } else {
        let mut sorted = names;
        sorted.sort();
        json!({ "type": "string", "enum": sorted })
    }
}

/// Build the output schema for entity extraction
pub fn entity_schema(object_schemas: &HashMap<String, ObjectTypeSchema>) -> Value {
    json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "type": type_field(object_schemas.keys().collect()),
                        "description": { "type": "string" },
                        "properties": { "type": "object" },
                        "action": {
                            "type": "string",
                            "enum": ["create", "enrich", "reference"]
                        },
                        "existing_entity_id": { "type": "string" }
                    },
                    "required": ["name", "type"]
                }
            }
        },
        "required": ["entities"]
    })
}

/// Build the output schema for relationship extraction
pub fn relationship_schema(
    relationship_schemas: &HashMap<String, RelationshipTypeSchema>,
) -> Value {
    json!({
        "type": "object",
        "properties": {
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source_ref": { "type": "string" },
                        "target_ref": { "type": "string" },
                        "type": type_field(relationship_schemas.keys().collect()),
                        "description": { "type": "string" }
                    },
                    "required": ["source_ref", "target_ref", "type"]
                }
            }
        },
        "required": ["relationships"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_schema_has_no_enum() {
        let schema = entity_schema(&HashMap::new());
        let type_field = &schema["properties"]["entities"]["items"]["properties"]["type"];
        assert_eq!(type_field["type"], "string");
        assert!(type_field.get("enum").is_none());
    }

    #[test]
    fn test_catalog_restricts_type_enum() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "Person".to_string(),
            ObjectTypeSchema::new("Person", ""),
        );
        schemas.insert(
            "Organization".to_string(),
            ObjectTypeSchema::new("Organization", ""),
        );

        let schema = entity_schema(&schemas);
        let enum_values = schema["properties"]["entities"]["items"]["properties"]["type"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(enum_values.len(), 2);
        assert!(enum_values.contains(&json!("Person")));
        assert!(enum_values.contains(&json!("Organization")));
    }

    #[test]
    fn test_entity_schema_shape() {
        let schema = entity_schema(&HashMap::new());
        let items = &schema["properties"]["entities"]["items"];
        assert_eq!(items["required"], json!(["name", "type"]));
        assert_eq!(
            items["properties"]["action"]["enum"],
            json!(["create", "enrich", "reference"])
        );
    }

    #[test]
    fn test_relationship_schema_shape() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "works_at".to_string(),
            RelationshipTypeSchema::new("works_at", ""),
        );

        let schema = relationship_schema(&schemas);
        let items = &schema["properties"]["relationships"]["items"];
        assert_eq!(
            items["required"],
            json!(["source_ref", "target_ref", "type"])
        );
        assert_eq!(
            items["properties"]["type"]["enum"],
            json!(["works_at"])
        );
    }
}
