//! kgforge Core - Core types and traits for the kgforge extraction system
//!
//! This crate provides the fundamental building blocks for kgforge:
//! - The run-scoped data model (catalog schemas, entities, relationships)
//! - Error types and result definitions
//! - Pipeline configuration
//! - Temp-id assignment and the orphan-rate quality gate
//! - The trace logging interface

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod quality;
pub mod temp_id;
pub mod trace;

pub use error::Error;
pub use error::Result;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::ObjectTypeSchema;
    pub use crate::catalog::PropertyDefinition;
    pub use crate::catalog::RelationshipTypeSchema;
    pub use crate::catalog::TypeCatalog;
    pub use crate::config::ExtractionConfig;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::model::Entity;
    pub use crate::model::EntityAction;
    pub use crate::model::ExistingEntityRef;
    pub use crate::model::ExtractedEntity;
    pub use crate::model::ExtractedRelationship;
    pub use crate::quality::QualityGate;
    pub use crate::quality::QualityVerdict;
    pub use crate::temp_id::TempIdAllocator;
    pub use crate::trace::NoopTraceLogger;
    pub use crate::trace::TraceLogger;
}
