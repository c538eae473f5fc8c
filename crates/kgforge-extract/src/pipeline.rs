//! The staged extraction pipeline
//!
//! A run is fully sequential: validate, extract entities, assign
//! identities, then a bounded relationship loop driven by the orphan-rate
//! quality gate. Errors of any kind are fatal; the only retried condition
//! is a failed quality check, and exhausting the retry budget is not an
//! error.

use crate::parser;
use crate::parser::GenerationPayload;
use crate::stage::PipelineContext;
use crate::stage::Stage;
use kgforge_core::catalog::ObjectTypeSchema;
use kgforge_core::catalog::RelationshipTypeSchema;
use kgforge_core::catalog::TypeCatalog;
use kgforge_core::config::ExtractionConfig;
use kgforge_core::error::Error;
use kgforge_core::error::Result;
use kgforge_core::model::Entity;
use kgforge_core::model::ExistingEntityRef;
use kgforge_core::model::ExtractedRelationship;
use kgforge_core::quality::QualityGate;
use kgforge_core::quality::QualityVerdict;
use kgforge_core::temp_id::TempIdAllocator;
use kgforge_core::trace::NoopTraceLogger;
use kgforge_core::trace::TraceLogger;
use kgforge_llm::GenerationClient;
use kgforge_prompts::entity_schema;
use kgforge_prompts::relationship_schema;
use kgforge_prompts::EntityPromptContext;
use kgforge_prompts::PromptEngine;
use kgforge_prompts::RelationshipPromptContext;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use uuid::Uuid;

/// Input for one extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionInput {
    /// The document text to extract from (required, non-empty)
    pub document_text: String,
    /// Entity type name to schema; empty means open-world extraction
    #[serde(default)]
    pub object_schemas: HashMap<String, ObjectTypeSchema>,
    /// Relationship type name to schema; empty means unconstrained
    #[serde(default)]
    pub relationship_schemas: HashMap<String, RelationshipTypeSchema>,
    /// Subset of entity types to extract; empty means all catalog types
    #[serde(default)]
    pub allowed_types: Vec<String>,
    /// Entities already known from prior runs, for identity resolution
    #[serde(default)]
    pub existing_entities: Vec<ExistingEntityRef>,
}

impl ExtractionInput {
    /// Create an input for the given document text
    pub fn new(document_text: impl Into<String>) -> Self {
        Self {
            document_text: document_text.into(),
            ..Default::default()
        }
    }

    /// Supply both halves of a type catalog
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.object_schemas = catalog.object_types;
        self.relationship_schemas = catalog.relationship_types;
        self
    }

    /// Restrict extraction to a subset of entity types
    pub fn with_allowed_types(mut self, allowed_types: Vec<String>) -> Self {
        self.allowed_types = allowed_types;
        self
    }

    /// Supply existing-entity context for identity resolution
    pub fn with_existing_entities(mut self, existing: Vec<ExistingEntityRef>) -> Self {
        self.existing_entities = existing;
        self
    }
}

/// Statistics for one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of entities extracted
    pub entities_extracted: usize,
    /// Number of relationships in the final set
    pub relationships_extracted: usize,
    /// Relationship-extraction iterations performed
    pub iterations: u32,
    /// Orphan rate of the final relationship set
    pub final_orphan_rate: f64,
    /// Orphan count in the final relationship set
    pub orphan_count: usize,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

/// The complete result of one run
///
/// There is no partial success: callers receive either this or a terminal
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Extracted entities with their temp-ids
    pub entities: Vec<Entity>,
    /// The final relationship set
    pub relationships: Vec<ExtractedRelationship>,
    /// Run statistics, including the final orphan rate
    pub stats: RunStats,
}

/// Cooperative cancellation handle for a run
///
/// The pipeline checks the handle before each external generation call and
/// aborts with [`Error::Cancelled`], discarding accumulated state.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a handle in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run holding this handle
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The staged extraction pipeline
///
/// Holds no process-wide mutable state; each call to [`run`] owns an
/// isolated [`PipelineContext`], so independent runs may execute in
/// parallel on separate documents.
///
/// [`run`]: ExtractionPipeline::run
pub struct ExtractionPipeline<C: GenerationClient> {
    client: Arc<C>,
    prompts: PromptEngine,
    config: ExtractionConfig,
    tracer: Arc<dyn TraceLogger>,
    cancel: Option<CancelHandle>,
}

impl<C: GenerationClient> ExtractionPipeline<C> {
    /// Create a pipeline over the given generation client
    pub fn new(client: C, config: ExtractionConfig) -> Result<Self> {
        let prompts = PromptEngine::new()?;
        Ok(Self {
            client: Arc::new(client),
            prompts,
            config,
            tracer: Arc::new(NoopTraceLogger),
            cancel: None,
        })
    }

    /// Attach a trace logger (side-effect only)
    pub fn with_tracer(mut self, tracer: Arc<dyn TraceLogger>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Attach a cooperative cancellation handle
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Execute one extraction run
    #[instrument(skip(self, input))]
    pub async fn run(&self, input: ExtractionInput) -> Result<ExtractionOutput> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, "starting extraction run");

        self.config.validate()?;
        if input.document_text.is_empty() {
            let err = Error::validation("document_text must not be empty");
            self.tracer.log_error("validate", &err);
            return Err(err);
        }

        let mut ctx = PipelineContext::new();

        self.extract_entities(&input, &mut ctx)
            .await
            .map_err(|e| self.fail(Stage::ExtractEntities, e))?;

        self.assign_identities(&mut ctx)
            .map_err(|e| self.fail(Stage::AssignIdentities, e))?;

        let verdict = self.relationship_loop(&input, &mut ctx).await?;

        self.tracer.log_stage_start(Stage::Done.name());
        let entities = ctx
            .take_entities()
            .map_err(|e| self.fail(Stage::Done, e))?;
        let relationships = ctx
            .take_relationships()
            .map_err(|e| self.fail(Stage::Done, e))?;

        let stats = RunStats {
            entities_extracted: entities.len(),
            relationships_extracted: relationships.len(),
            iterations: ctx.iteration,
            final_orphan_rate: verdict.orphan_rate,
            orphan_count: verdict.orphan_ids.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            %run_id,
            entities = stats.entities_extracted,
            relationships = stats.relationships_extracted,
            iterations = stats.iterations,
            orphan_rate = stats.final_orphan_rate,
            "extraction run complete"
        );

        Ok(ExtractionOutput {
            entities,
            relationships,
            stats,
        })
    }

    /// The bounded relationship retry loop
    ///
    /// Exits on quality pass or after `max_retries` iterations; in the
    /// latter case the last relationship set stands even below threshold.
    async fn relationship_loop(
        &self,
        input: &ExtractionInput,
        ctx: &mut PipelineContext,
    ) -> Result<QualityVerdict> {
        let mut verdict = None;

        for attempt in 1..=self.config.max_retries {
            self.extract_relationships(input, ctx)
                .await
                .map_err(|e| self.fail(Stage::ExtractRelationships, e))?;

            let checked = self
                .check_quality(ctx)
                .map_err(|e| self.fail(Stage::CheckQuality, e))?;
            let passed = checked.passed;
            verdict = Some(checked);

            if passed {
                debug!(attempt, "quality gate passed, ending retry loop");
                break;
            }
            if attempt < self.config.max_retries {
                info!(attempt, "quality gate failed, retrying with orphan priority");
            } else {
                info!(attempt, "retry budget exhausted, accepting last relationship set");
            }
        }

        // max_retries >= 1 is enforced by config validation, so the loop
        // body ran at least once
        verdict.ok_or_else(|| Error::state("relationship loop produced no quality verdict"))
    }

    async fn extract_entities(
        &self,
        input: &ExtractionInput,
        ctx: &mut PipelineContext,
    ) -> Result<()> {
        let stage = Stage::ExtractEntities;
        self.tracer.log_stage_start(stage.name());

        let prompt_ctx = EntityPromptContext::build(
            &input.document_text,
            &input.object_schemas,
            &input.allowed_types,
            &input.existing_entities,
            &self.config,
        );
        let prompt = self.prompts.entity_extraction(&prompt_ctx)?;
        self.tracer.log_prompt(stage.name(), &prompt);

        let schema = entity_schema(&input.object_schemas);

        self.check_cancelled()?;
        let raw = self.client.generate(&prompt, &schema).await?;
        let entities = parser::parse_entities(GenerationPayload::Text(raw))?;
        debug!(count = entities.len(), "entities parsed");

        ctx.raw_entities = Some(entities);
        Ok(())
    }

    fn assign_identities(&self, ctx: &mut PipelineContext) -> Result<()> {
        let stage = Stage::AssignIdentities;
        self.tracer.log_stage_start(stage.name());

        let raw = ctx
            .raw_entities
            .take()
            .ok_or_else(|| Error::state("no extracted entities available for identity assignment"))?;

        let mut allocator = TempIdAllocator::new();
        let entities: Vec<Entity> = raw
            .into_iter()
            .map(|entity| {
                let temp_id = allocator.assign(&entity.name, &entity.entity_type);
                Entity { temp_id, entity }
            })
            .collect();

        self.tracer.log_entities(&entities);
        ctx.entities = Some(entities);
        Ok(())
    }

    async fn extract_relationships(
        &self,
        input: &ExtractionInput,
        ctx: &mut PipelineContext,
    ) -> Result<()> {
        let stage = Stage::ExtractRelationships;
        self.tracer.log_stage_start(stage.name());

        let prompt_ctx = RelationshipPromptContext::build(
            &input.document_text,
            ctx.entities()?,
            &input.relationship_schemas,
            &ctx.orphan_ids,
            &self.config,
        );
        let prompt = self.prompts.relationship_extraction(&prompt_ctx)?;
        self.tracer.log_prompt(stage.name(), &prompt);

        let schema = relationship_schema(&input.relationship_schemas);

        self.check_cancelled()?;
        let raw = self.client.generate(&prompt, &schema).await?;
        let relationships = parser::parse_relationships(GenerationPayload::Text(raw))?;
        debug!(count = relationships.len(), "relationships parsed");

        self.tracer.log_relationships(&relationships);
        ctx.relationships = Some(relationships);
        Ok(())
    }

    fn check_quality(&self, ctx: &mut PipelineContext) -> Result<QualityVerdict> {
        let stage = Stage::CheckQuality;
        self.tracer.log_stage_start(stage.name());

        let gate = QualityGate::new(self.config.orphan_threshold);
        let verdict = gate.check(ctx.entities()?, ctx.relationships()?);

        ctx.iteration += 1;
        self.tracer.log_quality_check(
            ctx.iteration,
            verdict.orphan_rate,
            gate.threshold(),
            &verdict.orphan_ids,
        );

        if !verdict.passed {
            ctx.orphan_ids = verdict.orphan_ids.clone();
        }
        Ok(verdict)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(handle) if handle.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn fail(&self, stage: Stage, err: Error) -> Error {
        self.tracer.log_error(stage.name(), &err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_handle_flips_once() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_input_builder() {
        let catalog = TypeCatalog::open().with_object_type(ObjectTypeSchema::new("Person", ""));
        let input = ExtractionInput::new("some text")
            .with_catalog(catalog)
            .with_allowed_types(vec!["Person".to_string()]);

        assert_eq!(input.document_text, "some text");
        assert!(input.object_schemas.contains_key("Person"));
        assert_eq!(input.allowed_types, vec!["Person"]);
        assert!(input.existing_entities.is_empty());
    }
}
