//! Trace logging interface for pipeline observability
//!
//! Purely observational: implementations must never affect pipeline control
//! flow or results. A no-op implementation exists for when tracing is
//! disabled.

use crate::error::Error;
use crate::model::Entity;
use crate::model::ExtractedRelationship;
use tracing::debug;
use tracing::error;
use tracing::info;

/// Side-effect-only observer of pipeline progress
pub trait TraceLogger: Send + Sync {
    /// A pipeline stage is starting
    fn log_stage_start(&self, stage: &str);

    /// A prompt was built for a stage
    fn log_prompt(&self, stage: &str, text: &str);

    /// Entities were published to the run's state
    fn log_entities(&self, entities: &[Entity]);

    /// Relationships were published to the run's state
    fn log_relationships(&self, relationships: &[ExtractedRelationship]);

    /// A quality check completed
    fn log_quality_check(
        &self,
        iteration: u32,
        orphan_rate: f64,
        threshold: f64,
        orphan_ids: &[String],
    );

    /// A stage failed
    fn log_error(&self, stage: &str, error: &Error);
}

/// Trace logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTraceLogger;

impl TraceLogger for NoopTraceLogger {
    fn log_stage_start(&self, _stage: &str) {}
    fn log_prompt(&self, _stage: &str, _text: &str) {}
    fn log_entities(&self, _entities: &[Entity]) {}
    fn log_relationships(&self, _relationships: &[ExtractedRelationship]) {}
    fn log_quality_check(
        &self,
        _iteration: u32,
        _orphan_rate: f64,
        _threshold: f64,
        _orphan_ids: &[String],
    ) {
    }
    fn log_error(&self, _stage: &str, _error: &Error) {}
}

/// Trace logger that emits through the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTraceLogger;

impl TraceLogger for TracingTraceLogger {
    fn log_stage_start(&self, stage: &str) {
        info!(stage, "stage starting");
    }

    fn log_prompt(&self, stage: &str, text: &str) {
        debug!(stage, prompt_len = text.len(), "prompt built");
    }

    fn log_entities(&self, entities: &[Entity]) {
        info!(count = entities.len(), "entities published");
    }

    fn log_relationships(&self, relationships: &[ExtractedRelationship]) {
        info!(count = relationships.len(), "relationships published");
    }

    fn log_quality_check(
        &self,
        iteration: u32,
        orphan_rate: f64,
        threshold: f64,
        orphan_ids: &[String],
    ) {
        info!(
            iteration,
            orphan_rate,
            threshold,
            orphans = orphan_ids.len(),
            "quality check"
        );
    }

    fn log_error(&self, stage: &str, error: &Error) {
        error!(stage, %error, "stage failed");
    }
}
