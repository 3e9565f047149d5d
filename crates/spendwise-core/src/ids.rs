//! Identifier generation
//!
//! Components that create records take an `IdGenerator` so tests can use
//! predictable ids instead of random ones.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh record identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random 9-character identifiers (UUID v4 prefix)
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(9);
        id
    }
}

/// Monotonic identifiers: `<prefix>1`, `<prefix>2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id-")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_short_and_distinct() {
        let ids = RandomIds;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a.len(), 9);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("rule-");
        assert_eq!(ids.next_id(), "rule-1");
        assert_eq!(ids.next_id(), "rule-2");
    }
}
