//! kgforge Extract - the staged extraction pipeline
//!
//! This crate sequences the extraction of a typed knowledge graph from
//! document text: prompt construction, structured generation, tolerant
//! output parsing, temp-id assignment, and a quality-gated bounded retry
//! loop that re-attempts relationship extraction focused on orphan
//! entities.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod parser;
pub mod pipeline;
pub mod stage;

pub use parser::parse_entities;
pub use parser::parse_relationships;
pub use parser::GenerationPayload;
pub use pipeline::CancelHandle;
pub use pipeline::ExtractionInput;
pub use pipeline::ExtractionOutput;
pub use pipeline::ExtractionPipeline;
pub use pipeline::RunStats;
pub use stage::PipelineContext;
pub use stage::Stage;
