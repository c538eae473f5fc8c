//! Run-scoped identifier assignment
//!
//! Temp-ids let relationships reference entities before any permanent
//! storage identifier exists. Generation is a pure function of its inputs
//! and the growing set of ids already taken, so results are deterministic
//! for a fixed calling order; calls must be sequential.

use std::collections::HashSet;

/// Maximum length of each slugified part of a temp-id
const MAX_PART_LEN: usize = 20;

/// Lowercase the input and collapse every run of non-alphanumeric
/// characters to a single underscore, truncated to [`MAX_PART_LEN`].
fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_separator = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
            in_separator = false;
        } else if !in_separator {
            out.push('_');
            in_separator = true;
        }
    }
    out.chars().take(MAX_PART_LEN).collect()
}

/// Generate a unique temp-id for an entity name and type
///
/// The base form is `{type}_{name}` over slugified parts; on collision with
/// `existing`, numeric suffixes `_1`, `_2`, ... are tried until unique.
pub fn generate_temp_id(name: &str, entity_type: &str, existing: &HashSet<String>) -> String {
    let base = format!("{}_{}", slugify(entity_type), slugify(name));
    if !existing.contains(&base) {
        return base;
    }
    let mut suffix = 1u64;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Tracks the ids handed out during one run
#[derive(Debug, Default)]
pub struct TempIdAllocator {
    used: HashSet<String>,
}

impl TempIdAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh temp-id and record it as taken
    pub fn assign(&mut self, name: &str, entity_type: &str) -> String {
        let id = generate_temp_id(name, entity_type, &self.used);
        self.used.insert(id.clone());
        id
    }

    /// Number of ids assigned so far
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// True when no ids have been assigned
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug_form() {
        let existing = HashSet::new();
        assert_eq!(
            generate_temp_id("Alice", "Person", &existing),
            "person_alice"
        );
        assert_eq!(
            generate_temp_id("Acme Corp.", "Organization", &existing),
            "organization_acme_corp_"
        );
    }

    #[test]
    fn test_non_alphanumeric_runs_collapse() {
        let existing = HashSet::new();
        assert_eq!(
            generate_temp_id("A --- B", "Type", &existing),
            "type_a_b"
        );
    }

    #[test]
    fn test_parts_truncate_independently() {
        let existing = HashSet::new();
        let id = generate_temp_id(
            "an extremely long entity name well past the cap",
            "an extremely long type name well past the cap",
            &existing,
        );
        let (type_part, name_part) = id.split_at(MAX_PART_LEN);
        assert_eq!(type_part.chars().count(), MAX_PART_LEN);
        assert_eq!(name_part.chars().count(), MAX_PART_LEN + 1);
        assert!(id.chars().count() <= 2 * MAX_PART_LEN + 1);
    }

    #[test]
    fn test_collision_ladder() {
        let mut existing = HashSet::new();
        existing.insert("person_alice".to_string());
        assert_eq!(
            generate_temp_id("Alice", "Person", &existing),
            "person_alice_1"
        );
        existing.insert("person_alice_1".to_string());
        assert_eq!(
            generate_temp_id("Alice", "Person", &existing),
            "person_alice_2"
        );
    }

    #[test]
    fn test_bounded_length_under_collisions() {
        let mut allocator = TempIdAllocator::new();
        for _ in 0..12 {
            let id = allocator.assign(
                "an extremely long entity name well past the cap",
                "an extremely long type name well past the cap",
            );
            assert!(id.chars().count() <= 45, "id too long: {id}");
        }
        assert_eq!(allocator.len(), 12);
    }

    #[test]
    fn test_allocator_never_repeats() {
        let mut allocator = TempIdAllocator::new();
        let a = allocator.assign("Alice", "Person");
        let b = allocator.assign("Alice", "Person");
        let c = allocator.assign("Alice", "Person");
        assert_eq!(a, "person_alice");
        assert_eq!(b, "person_alice_1");
        assert_eq!(c, "person_alice_2");
    }
}
