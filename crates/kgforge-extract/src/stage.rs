//! Pipeline stages and the typed per-run state they share

use kgforge_core::error::Error;
use kgforge_core::error::Result;
use kgforge_core::model::Entity;
use kgforge_core::model::ExtractedEntity;
use kgforge_core::model::ExtractedRelationship;
use std::fmt;

/// The pipeline's stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Prompt the generation service for entities and parse the result
    ExtractEntities,
    /// Assign run-scoped temp-ids in extraction order
    AssignIdentities,
    /// Prompt the generation service for relationships and parse the result
    ExtractRelationships,
    /// Measure the orphan rate and decide whether to retry
    CheckQuality,
    /// Read the final collections back out of the run state
    Done,
}

impl Stage {
    /// Stable stage name for logs and traces
    pub fn name(self) -> &'static str {
        match self {
            Stage::ExtractEntities => "extract_entities",
            Stage::AssignIdentities => "assign_identities",
            Stage::ExtractRelationships => "extract_relationships",
            Stage::CheckQuality => "check_quality",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed shared state owned by one run
///
/// Each run owns its own context, so independent runs are safe to execute
/// in parallel. A missing field when a later stage reads it signals a
/// stage-ordering defect and surfaces as [`Error::State`].
#[derive(Debug, Default)]
pub struct PipelineContext {
    /// Entities as parsed, before identifier assignment
    pub raw_entities: Option<Vec<ExtractedEntity>>,
    /// Entities with temp-ids assigned
    pub entities: Option<Vec<Entity>>,
    /// The most recent relationship set
    pub relationships: Option<Vec<ExtractedRelationship>>,
    /// Orphan temp-ids from the most recent failed quality check
    pub orphan_ids: Vec<String>,
    /// Number of completed relationship-extraction iterations
    pub iteration: u32,
}

impl PipelineContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the assigned entities, or fail with a state error
    pub fn entities(&self) -> Result<&[Entity]> {
        self.entities
            .as_deref()
            .ok_or_else(|| Error::state("entities not yet published to the run state"))
    }

    /// Borrow the latest relationships, or fail with a state error
    pub fn relationships(&self) -> Result<&[ExtractedRelationship]> {
        self.relationships
            .as_deref()
            .ok_or_else(|| Error::state("relationships not yet published to the run state"))
    }

    /// Take ownership of the assigned entities for the final output
    pub fn take_entities(&mut self) -> Result<Vec<Entity>> {
        self.entities
            .take()
            .ok_or_else(|| Error::state("entities not yet published to the run state"))
    }

    /// Take ownership of the latest relationships for the final output
    pub fn take_relationships(&mut self) -> Result<Vec<ExtractedRelationship>> {
        self.relationships
            .take()
            .ok_or_else(|| Error::state("relationships not yet published to the run state"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ExtractEntities.name(), "extract_entities");
        assert_eq!(Stage::CheckQuality.to_string(), "check_quality");
    }

    #[test]
    fn test_missing_state_is_a_state_error() {
        let mut ctx = PipelineContext::new();
        assert!(matches!(ctx.entities(), Err(Error::State(_))));
        assert!(matches!(ctx.take_relationships(), Err(Error::State(_))));
    }

    #[test]
    fn test_take_moves_out() {
        let mut ctx = PipelineContext::new();
        ctx.relationships = Some(vec![ExtractedRelationship::new("a", "b", "knows")]);
        assert_eq!(ctx.take_relationships().unwrap().len(), 1);
        assert!(ctx.take_relationships().is_err());
    }
}
