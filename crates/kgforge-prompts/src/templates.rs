//! Prompt templates for the extraction pipeline

/// Template for extracting typed entities from document text
pub const EXTRACT_ENTITIES_TEMPLATE: &str = r#"You are an AI assistant that extracts typed entities from documents.
Your task is to extract every significant entity mentioned in the DOCUMENT.

<ENTITY TYPES>
{{#if entity_types}}
{{#each entity_types}}
### {{name}}
{{#if description}}{{description}}
{{/if}}
{{~#if guidelines}}Guidelines: {{guidelines}}
{{/if}}
{{~#if properties}}Additional properties:
{{#each properties}}
- {{name}} ({{property_type}}){{#if required}} (required){{/if}}{{#if description}}: {{description}}{{/if}}
{{/each}}
{{/if}}
{{/each}}
{{else}}
Any entity type is allowed. Use a short singular noun for the type,
for example "Person" or "Organization".
{{/if}}
</ENTITY TYPES>

{{#if existing}}
<KNOWN ENTITIES>
Entities already known from prior runs are listed below. For each entity
you extract, decide how it relates to them:
- action "create": a new entity with no match below
- action "enrich": the document adds new information about a known entity;
  set existing_entity_id to that entity's id
- action "reference": the document merely mentions a known entity without
  adding anything; set existing_entity_id to that entity's id

{{#each existing.groups}}
{{type_name}}:
{{#each entries}}
- {{name}} (id: {{id}}{{#if similarity_pct}}, similarity: {{similarity_pct}}%{{/if}}){{#if description}}: {{description}}{{/if}}
{{/each}}
{{#if more}}  (and {{more}} more)
{{/if}}
{{/each}}
</KNOWN ENTITIES>
{{/if}}

<DOCUMENT>
{{document_text}}
</DOCUMENT>

Instructions:
1. Extract entities that are explicitly or implicitly mentioned in the DOCUMENT
2. Use only the types listed in ENTITY TYPES
3. Fill in the listed additional properties when the document states them
4. Do not invent entities that are not supported by the DOCUMENT

Return a JSON object with the following structure:
{
  "entities": [
    {
      "name": "entity name",
      "type": "entity type",
      "description": "one-sentence description",
      "properties": { "property name": "value" }{{#if existing}},
      "action": "create | enrich | reference",
      "existing_entity_id": "id of the matched known entity, omitted when action is create"{{/if}}
    }
  ]
}
"#;

/// Template for extracting relationships over previously extracted entities
pub const EXTRACT_RELATIONSHIPS_TEMPLATE: &str = r#"You are an AI assistant that extracts typed relationships between entities.
Your task is to connect the entities listed below using evidence from the DOCUMENT.

<RELATIONSHIP TYPES>
{{#if relationship_types}}
{{#each relationship_types}}
### {{name}}
{{#if description}}{{description}}
{{/if}}
{{constraint}}
{{#if guidelines}}Guidelines: {{guidelines}}
{{/if}}
{{/each}}
{{else}}
Any relationship type is allowed. Use a short lowercase verb phrase,
for example "works_at" or "located_in".
{{/if}}
</RELATIONSHIP TYPES>

<ENTITIES>
{{#each entities}}
- {{temp_id}} ({{entity_type}}){{#if description}}: {{description}}{{/if}}
{{/each}}
</ENTITIES>

{{#if orphan_ids}}
<PRIORITY>
The following entities are not yet connected to anything. Find connections
for exactly these ids first:
{{#each orphan_ids}}
- {{this}}
{{/each}}
</PRIORITY>
{{/if}}

<DOCUMENT>
{{document_text}}
</DOCUMENT>

Instructions:
1. Use only the temp-ids listed in ENTITIES for source_ref and target_ref
2. Respect the source/target type constraints of each relationship type
3. Every entity should appear in at least one relationship
4. Only extract relationships supported by the DOCUMENT

Return a JSON object with the following structure:
{
  "relationships": [
    {
      "source_ref": "temp-id of the source entity",
      "target_ref": "temp-id of the target entity",
      "type": "relationship type",
      "description": "one-sentence description"
    }
  ]
}
"#;
