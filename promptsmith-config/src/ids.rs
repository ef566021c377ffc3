//! Identifier generation for blocks, segments and tooltips
//!
//! Identifiers only live in memory; they are never written to exported
//! themes. Generation is injected so tests can predict ids.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of process-unique identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier. `kind` is a short prefix such as "block".
    fn next_id(&self, kind: &str) -> String;
}

/// Random v4 UUID identifiers (default for interactive sessions)
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, kind: &str) -> String {
        format!("{}-{}", kind, Uuid::new_v4())
    }
}

/// Monotonic counter identifiers: `block-1`, `segment-2`, ...
///
/// The counter is shared across kinds so every id is unique.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, kind: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", kind, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_unique_across_kinds() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id("block"), "block-1");
        assert_eq!(ids.next_id("segment"), "segment-2");
        assert_eq!(ids.next_id("block"), "block-3");
    }

    #[test]
    fn test_uuid_ids_have_prefix() {
        let ids = UuidIds;
        let a = ids.next_id("segment");
        let b = ids.next_id("segment");
        assert!(a.starts_with("segment-"));
        assert_ne!(a, b);
    }
}
