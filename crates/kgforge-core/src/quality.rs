//! Orphan-rate quality gate
//!
//! An orphan is an entity referenced by no relationship (as source or
//! target) within the same run. The gate's verdict drives the pipeline's
//! bounded relationship retry loop.

use crate::model::Entity;
use crate::model::ExtractedRelationship;
use std::collections::HashSet;

/// Fraction of entities unconnected by any relationship
///
/// Returns 0.0 for an empty entity set (vacuous pass).
pub fn orphan_rate(entities: &[Entity], relationships: &[ExtractedRelationship]) -> f64 {
    if entities.is_empty() {
        return 0.0;
    }
    let connected = connected_ids(relationships);
    let orphans = entities
        .iter()
        .filter(|e| !connected.contains(e.temp_id.as_str()))
        .count();
    orphans as f64 / entities.len() as f64
}

/// Temp-ids of unconnected entities, in entity order
pub fn orphan_temp_ids(
    entities: &[Entity],
    relationships: &[ExtractedRelationship],
) -> Vec<String> {
    let connected = connected_ids(relationships);
    entities
        .iter()
        .filter(|e| !connected.contains(e.temp_id.as_str()))
        .map(|e| e.temp_id.clone())
        .collect()
}

fn connected_ids(relationships: &[ExtractedRelationship]) -> HashSet<&str> {
    let mut connected = HashSet::with_capacity(relationships.len() * 2);
    for rel in relationships {
        connected.insert(rel.source_ref.as_str());
        connected.insert(rel.target_ref.as_str());
    }
    connected
}

/// Outcome of one quality check
#[derive(Debug, Clone)]
pub struct QualityVerdict {
    /// Orphan rate at the time of the check
    pub orphan_rate: f64,
    /// Unconnected temp-ids, in entity order
    pub orphan_ids: Vec<String>,
    /// True when the rate is at or below the threshold
    pub passed: bool,
}

/// Decides pass/fail against a configured orphan-rate threshold
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    threshold: f64,
}

impl QualityGate {
    /// Create a gate with the given threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// The configured threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Check how well the relationships connect the entities
    pub fn check(
        &self,
        entities: &[Entity],
        relationships: &[ExtractedRelationship],
    ) -> QualityVerdict {
        let rate = orphan_rate(entities, relationships);
        let orphan_ids = orphan_temp_ids(entities, relationships);
        QualityVerdict {
            orphan_rate: rate,
            orphan_ids,
            passed: rate <= self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractedEntity;

    fn entity(temp_id: &str) -> Entity {
        Entity {
            temp_id: temp_id.to_string(),
            entity: ExtractedEntity::new(temp_id, "Thing"),
        }
    }

    fn rel(source: &str, target: &str) -> ExtractedRelationship {
        ExtractedRelationship::new(source, target, "related_to")
    }

    #[test]
    fn test_empty_entities_is_vacuous_pass() {
        assert_eq!(orphan_rate(&[], &[rel("a", "b")]), 0.0);
        assert_eq!(orphan_rate(&[], &[]), 0.0);
    }

    #[test]
    fn test_fully_connected_rate_is_zero() {
        let entities = vec![entity("a"), entity("b"), entity("c")];
        let rels = vec![rel("a", "b"), rel("b", "c")];
        assert_eq!(orphan_rate(&entities, &rels), 0.0);
        assert!(orphan_temp_ids(&entities, &rels).is_empty());
    }

    #[test]
    fn test_no_relationships_rate_is_one() {
        let entities = vec![entity("a"), entity("b")];
        assert_eq!(orphan_rate(&entities, &[]), 1.0);
        assert_eq!(orphan_temp_ids(&entities, &[]), vec!["a", "b"]);
    }

    #[test]
    fn test_exact_fraction() {
        let entities = vec![entity("a"), entity("b"), entity("c"), entity("d")];
        let rels = vec![rel("a", "b")];
        assert_eq!(orphan_rate(&entities, &rels), 0.5);
        assert_eq!(orphan_temp_ids(&entities, &rels), vec!["c", "d"]);
    }

    #[test]
    fn test_orphan_ids_preserve_entity_order() {
        let entities = vec![entity("c"), entity("a"), entity("b")];
        let rels = vec![rel("a", "x")];
        assert_eq!(orphan_temp_ids(&entities, &rels), vec!["c", "b"]);
    }

    #[test]
    fn test_dangling_refs_do_not_connect_entities() {
        // A relationship naming unknown temp-ids connects nothing we track
        let entities = vec![entity("a")];
        let rels = vec![rel("ghost_1", "ghost_2")];
        assert_eq!(orphan_rate(&entities, &rels), 1.0);
    }

    #[test]
    fn test_gate_boundary_is_inclusive() {
        let entities = vec![entity("a"), entity("b"), entity("c"), entity("d")];
        let rels = vec![rel("a", "b"), rel("b", "c")];
        // 1 orphan of 4 -> 0.25
        let gate = QualityGate::new(0.25);
        let verdict = gate.check(&entities, &rels);
        assert!(verdict.passed);
        assert_eq!(verdict.orphan_ids, vec!["d"]);

        let strict = QualityGate::new(0.2);
        assert!(!strict.check(&entities, &rels).passed);
    }
}
