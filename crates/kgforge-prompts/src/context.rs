//! Template contexts and the preparation logic that fills them
//!
//! Everything the templates render is computed here: allowed-type
//! derivation, property filtering, existing-entity grouping with caps, and
//! the orphan priority list.

use kgforge_core::catalog::ObjectTypeSchema;
use kgforge_core::catalog::RelationshipTypeSchema;
use kgforge_core::config::ExtractionConfig;
use kgforge_core::model::Entity;
use kgforge_core::model::ExistingEntityRef;
use serde::Serialize;
use std::collections::HashMap;

/// Property names that are part of the entity shape itself and therefore
/// never listed as "additional properties"
const INTRINSIC_PROPERTIES: [&str; 3] = ["name", "type", "description"];

/// One property line in an entity-type section
#[derive(Debug, Clone, Serialize)]
pub struct PropertyLine {
    /// Property name
    pub name: String,
    /// Declared value type
    pub property_type: String,
    /// True when the schema lists the property as required
    pub required: bool,
    /// Property description
    pub description: String,
}

/// One entity-type section of the entity-extraction prompt
#[derive(Debug, Clone, Serialize)]
pub struct TypeSection {
    /// Type name
    pub name: String,
    /// Type description
    pub description: String,
    /// Extraction guidelines
    pub guidelines: String,
    /// Additional properties beyond name/type/description
    pub properties: Vec<PropertyLine>,
}

/// One existing-entity line
#[derive(Debug, Clone, Serialize)]
pub struct ExistingEntry {
    /// Entity name
    pub name: String,
    /// Permanent identifier
    pub id: String,
    /// Similarity as a whole percentage, present only when positive
    pub similarity_pct: Option<u32>,
    /// Description, truncated for prompt budget
    pub description: String,
}

/// Existing entities of one type
#[derive(Debug, Clone, Serialize)]
pub struct ExistingGroup {
    /// The type these entities share
    pub type_name: String,
    /// Entries shown, after caps
    pub entries: Vec<ExistingEntry>,
    /// How many entries of this type were cut by the caps
    pub more: usize,
}

/// The existing-entity block of the entity-extraction prompt
#[derive(Debug, Clone, Serialize)]
pub struct ExistingSection {
    /// Groups in order of first appearance in the caller's list
    pub groups: Vec<ExistingGroup>,
}

/// Context for the entity-extraction template
#[derive(Debug, Clone, Serialize)]
pub struct EntityPromptContext {
    /// Allowed entity types, one section each
    pub entity_types: Vec<TypeSection>,
    /// Existing-entity block, absent when no refs were supplied
    pub existing: Option<ExistingSection>,
    /// The document text, verbatim
    pub document_text: String,
}

impl EntityPromptContext {
    /// Prepare the entity-extraction context
    ///
    /// When `allowed_types` is empty it is derived as the full set of
    /// catalog type names. Types without a catalog entry still get a bare
    /// section heading.
    pub fn build(
        document_text: &str,
        object_schemas: &HashMap<String, ObjectTypeSchema>,
        allowed_types: &[String],
        existing_entities: &[ExistingEntityRef],
        config: &ExtractionConfig,
    ) -> Self {
        let allowed: Vec<String> = if allowed_types.is_empty() {
            let mut names: Vec<String> = object_schemas.keys().cloned().collect();
            names.sort();
            names
        } else {
            allowed_types.to_vec()
        };

        let entity_types = allowed
            .iter()
            .map(|name| match object_schemas.get(name) {
                Some(schema) => type_section(schema),
                None => TypeSection {
                    name: name.clone(),
                    description: String::new(),
                    guidelines: String::new(),
                    properties: Vec::new(),
                },
            })
            .collect();

        let existing = if existing_entities.is_empty() {
            None
        } else {
            Some(existing_section(existing_entities, config))
        };

        Self {
            entity_types,
            existing,
            document_text: document_text.to_string(),
        }
    }
}

fn type_section(schema: &ObjectTypeSchema) -> TypeSection {
    let mut names: Vec<&String> = schema
        .properties
        .keys()
        .filter(|name| !INTRINSIC_PROPERTIES.contains(&name.as_str()))
        .filter(|name| !name.starts_with('_'))
        .collect();
    names.sort();

    let properties = names
        .into_iter()
        .map(|name| {
            let def = &schema.properties[name];
            PropertyLine {
                name: name.clone(),
                property_type: def.property_type.clone(),
                required: schema.is_required(name),
                description: def.description.clone(),
            }
        })
        .collect();

    TypeSection {
        name: schema.name.clone(),
        description: schema.description.clone(),
        guidelines: schema.guidelines.clone(),
        properties,
    }
}

fn existing_section(refs: &[ExistingEntityRef], config: &ExtractionConfig) -> ExistingSection {
    // Group by type, preserving first-appearance order so the caller's
    // similarity ordering survives within and across groups.
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&ExistingEntityRef>> = HashMap::new();
    for entity in refs {
        let slot = grouped.entry(entity.entity_type.as_str()).or_default();
        if slot.is_empty() {
            order.push(entity.entity_type.as_str());
        }
        slot.push(entity);
    }

    let mut remaining_total = config.max_existing_total;
    let mut groups = Vec::new();
    for type_name in order {
        if remaining_total == 0 {
            break;
        }
        let members = &grouped[type_name];
        let shown = members
            .len()
            .min(config.max_existing_per_type)
            .min(remaining_total);
        remaining_total -= shown;

        let entries = members[..shown]
            .iter()
            .map(|entity| ExistingEntry {
                name: entity.name.clone(),
                id: entity.id.clone(),
                similarity_pct: similarity_percent(entity.similarity),
                description: truncate_chars(
                    &entity.description,
                    config.existing_description_limit,
                ),
            })
            .collect();

        groups.push(ExistingGroup {
            type_name: type_name.to_string(),
            entries,
            more: members.len() - shown,
        });
    }

    ExistingSection { groups }
}

fn similarity_percent(similarity: f32) -> Option<u32> {
    if similarity > 0.0 {
        Some((similarity * 100.0).round() as u32)
    } else {
        None
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// One relationship-type section of the relationship-extraction prompt
#[derive(Debug, Clone, Serialize)]
pub struct RelTypeSection {
    /// Type name
    pub name: String,
    /// Type description
    pub description: String,
    /// Source/target constraint line, e.g. `Person -> Organization`
    pub constraint: String,
    /// Extraction guidelines
    pub guidelines: String,
}

/// One candidate-entity line
#[derive(Debug, Clone, Serialize)]
pub struct EntityLine {
    /// Run-scoped identifier
    pub temp_id: String,
    /// Entity type name
    pub entity_type: String,
    /// Description, truncated for prompt budget
    pub description: String,
}

/// Context for the relationship-extraction template
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipPromptContext {
    /// Allowed relationship types, one section each
    pub relationship_types: Vec<RelTypeSection>,
    /// Candidate entities with their temp-ids
    pub entities: Vec<EntityLine>,
    /// Temp-ids to prioritize, from the previous quality check
    pub orphan_ids: Vec<String>,
    /// The document text, verbatim
    pub document_text: String,
}

impl RelationshipPromptContext {
    /// Prepare the relationship-extraction context
    pub fn build(
        document_text: &str,
        entities: &[Entity],
        relationship_schemas: &HashMap<String, RelationshipTypeSchema>,
        orphan_ids: &[String],
        config: &ExtractionConfig,
    ) -> Self {
        let mut names: Vec<&String> = relationship_schemas.keys().collect();
        names.sort();

        let relationship_types = names
            .into_iter()
            .map(|name| {
                let schema = &relationship_schemas[name];
                RelTypeSection {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    constraint: constraint_line(&schema.source_types, &schema.target_types),
                    guidelines: schema.guidelines.clone(),
                }
            })
            .collect();

        let entity_lines = entities
            .iter()
            .map(|entity| EntityLine {
                temp_id: entity.temp_id.clone(),
                entity_type: entity.entity_type().to_string(),
                description: truncate_chars(
                    entity.description(),
                    config.entity_description_limit,
                ),
            })
            .collect();

        Self {
            relationship_types,
            entities: entity_lines,
            orphan_ids: orphan_ids.to_vec(),
            document_text: document_text.to_string(),
        }
    }
}

fn constraint_line(source_types: &[String], target_types: &[String]) -> String {
    let side = |types: &[String]| {
        if types.is_empty() {
            "any".to_string()
        } else {
            types.join(", ")
        }
    };
    format!("{} -> {}", side(source_types), side(target_types))
}
