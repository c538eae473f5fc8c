//! kgforge Prompts - Prompt engineering module for structured generation
//!
//! This crate renders the two prompts the extraction pipeline sends to the
//! structured-generation service:
//! - Entity extraction from document text
//! - Relationship extraction over previously extracted entities
//!
//! All conditional logic (type catalogs, existing-entity caps, orphan
//! priority lists) happens while preparing the template contexts; the
//! templates themselves only lay the sections out.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod schema;
pub mod templates;

use anyhow::Result;
use handlebars::Handlebars;

pub use context::EntityPromptContext;
pub use context::RelationshipPromptContext;
pub use schema::entity_schema;
pub use schema::relationship_schema;

/// Prompt engine for managing and rendering templates
pub struct PromptEngine {
    handlebars: Handlebars<'static>,
}

impl PromptEngine {
    /// Create a new prompt engine with all templates registered
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string("extract_entities", templates::EXTRACT_ENTITIES_TEMPLATE)?;
        handlebars.register_template_string(
            "extract_relationships",
            templates::EXTRACT_RELATIONSHIPS_TEMPLATE,
        )?;

        Ok(Self { handlebars })
    }

    /// Render the entity-extraction prompt
    pub fn entity_extraction(&self, context: &EntityPromptContext) -> Result<String> {
        Ok(self.handlebars.render("extract_entities", context)?)
    }

    /// Render the relationship-extraction prompt
    pub fn relationship_extraction(&self, context: &RelationshipPromptContext) -> Result<String> {
        Ok(self.handlebars.render("extract_relationships", context)?)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new().expect("Failed to create prompt engine")
    }
}
