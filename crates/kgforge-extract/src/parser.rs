//! Tolerant normalization of generation output
//!
//! The generation boundary is the one place heterogeneous shapes enter the
//! system: a backend may hand back an already-typed list, raw (possibly
//! Markdown-fenced) text, or JSON decoded by an unrelated decoder. All
//! three normalize to the same typed lists; everything else is a
//! [`kgforge_core::Error::Parse`].

use kgforge_core::error::Error;
use kgforge_core::error::Result;
use kgforge_core::model::ExtractedEntity;
use kgforge_core::model::ExtractedRelationship;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The shapes a structured-generation backend may hand back
#[derive(Debug, Clone)]
pub enum GenerationPayload {
    /// Already-typed entity list
    Entities(Vec<ExtractedEntity>),
    /// Already-typed relationship list
    Relationships(Vec<ExtractedRelationship>),
    /// Raw model text, possibly wrapped in Markdown code fences
    Text(String),
    /// JSON decoded by an unrelated decoder
    Value(Value),
}

/// Normalize generation output into an entity list
///
/// Typed input passes through unchanged. Accepts both a bare JSON array
/// and the `{"entities": [...]}` wrapper the prompts request.
pub fn parse_entities(payload: GenerationPayload) -> Result<Vec<ExtractedEntity>> {
    match payload {
        GenerationPayload::Entities(entities) => Ok(entities),
        GenerationPayload::Relationships(_) => Err(Error::parse(
            "expected entity output, got a relationship list",
            "",
        )),
        GenerationPayload::Text(text) => decode(&text_to_value(&text)?, "entities", &text),
        GenerationPayload::Value(value) => {
            let raw = value.to_string();
            decode(&roundtrip(value)?, "entities", &raw)
        }
    }
}

/// Normalize generation output into a relationship list
pub fn parse_relationships(payload: GenerationPayload) -> Result<Vec<ExtractedRelationship>> {
    match payload {
        GenerationPayload::Relationships(relationships) => Ok(relationships),
        GenerationPayload::Entities(_) => Err(Error::parse(
            "expected relationship output, got an entity list",
            "",
        )),
        GenerationPayload::Text(text) => decode(&text_to_value(&text)?, "relationships", &text),
        GenerationPayload::Value(value) => {
            let raw = value.to_string();
            decode(&roundtrip(value)?, "relationships", &raw)
        }
    }
}

/// Strip surrounding whitespace and an optional Markdown code fence
fn strip_fences(text: &str) -> &str {
    let mut trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string (e.g. "json") up to the end of its line
        trimmed = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        if let Some(body) = trimmed.trim_end().strip_suffix("```") {
            trimmed = body;
        }
        trimmed = trimmed.trim();
    }
    trimmed
}

fn text_to_value(text: &str) -> Result<Value> {
    let body = strip_fences(text);
    if body.is_empty() {
        return Err(Error::parse("empty generation output", text));
    }
    serde_json::from_str(body).map_err(|e| Error::parse_with_source("invalid JSON", text, e))
}

/// Serialize an arbitrary decoded value and re-parse it, so any foreign
/// decoder's representation goes through the same JSON path as text
fn roundtrip(value: Value) -> Result<Value> {
    if value.is_null() {
        return Err(Error::parse("nil generation output", ""));
    }
    let text = serde_json::to_string(&value)
        .map_err(|e| Error::parse_with_source("unserializable payload", &value.to_string(), e))?;
    serde_json::from_str(&text).map_err(|e| Error::parse_with_source("invalid JSON", &text, e))
}

/// Accept either a bare array or an object wrapping the list under `key`
fn decode<T: DeserializeOwned>(value: &Value, key: &str, raw: &str) -> Result<Vec<T>> {
    let list = match value {
        Value::Object(map) => match map.get(key) {
            Some(list) => list.clone(),
            None => {
                return Err(Error::parse(
                    format!("expected a JSON array or an object with a \"{key}\" field"),
                    raw,
                ))
            }
        },
        Value::Array(_) => value.clone(),
        _ => {
            return Err(Error::parse(
                format!("expected a JSON array or an object with a \"{key}\" field"),
                raw,
            ))
        }
    };

    serde_json::from_value(list)
        .map_err(|e| Error::parse_with_source(format!("{key} shape mismatch"), raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ENTITY_JSON: &str = r#"{"entities": [{"name": "Alice", "type": "Person"}]}"#;

    #[test]
    fn test_typed_passthrough() {
        let entities = vec![ExtractedEntity::new("Alice", "Person")];
        let parsed = parse_entities(GenerationPayload::Entities(entities.clone())).unwrap();
        assert_eq!(parsed, entities);
    }

    #[test]
    fn test_plain_json_string() {
        let parsed = parse_entities(GenerationPayload::Text(ENTITY_JSON.to_string())).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Alice");
    }

    #[test]
    fn test_fenced_json_string() {
        let fenced = format!("```json\n{ENTITY_JSON}\n```");
        let parsed = parse_entities(GenerationPayload::Text(fenced)).unwrap();
        assert_eq!(parsed[0].name, "Alice");

        let bare_fence = format!("```\n{ENTITY_JSON}\n```");
        let parsed = parse_entities(GenerationPayload::Text(bare_fence)).unwrap();
        assert_eq!(parsed[0].name, "Alice");
    }

    #[test]
    fn test_bare_array_accepted() {
        let text = r#"[{"name": "Alice", "type": "Person"}]"#;
        let parsed = parse_entities(GenerationPayload::Text(text.to_string())).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_generic_value_roundtrip() {
        let value = json!({
            "entities": [
                { "name": "Acme", "type": "Organization", "description": "A company" }
            ]
        });
        let parsed = parse_entities(GenerationPayload::Value(value)).unwrap();
        assert_eq!(parsed[0].entity_type, "Organization");
    }

    #[test]
    fn test_malformed_json_fails_with_parse_error() {
        let err =
            parse_entities(GenerationPayload::Text("not json {".to_string())).unwrap_err();
        assert!(err.is_parse());
        match err {
            Error::Parse { payload, .. } => assert!(payload.contains("not json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_nil_input_fails() {
        let err = parse_entities(GenerationPayload::Value(Value::Null)).unwrap_err();
        assert!(err.is_parse());

        let err = parse_entities(GenerationPayload::Text("   ".to_string())).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_shape_mismatch_fails() {
        // Valid JSON, wrong shape under the wrapper key
        let text = r#"{"entities": [{"name": "Alice"}]}"#;
        let err = parse_entities(GenerationPayload::Text(text.to_string())).unwrap_err();
        assert!(err.is_parse());

        // A scalar is neither array nor wrapper object
        let err = parse_entities(GenerationPayload::Text("42".to_string())).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_wrong_category_rejected() {
        let err = parse_entities(GenerationPayload::Relationships(Vec::new())).unwrap_err();
        assert!(err.is_parse());
        let err = parse_relationships(GenerationPayload::Entities(Vec::new())).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_relationship_parsing() {
        let text = r#"```json
{"relationships": [{"source_ref": "person_alice", "target_ref": "organization_acme", "type": "works_at", "description": "employment"}]}
```"#;
        let parsed = parse_relationships(GenerationPayload::Text(text.to_string())).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].rel_type, "works_at");
    }
}
