use std::collections::HashSet;

/// Deduplication of features across overlapping tile fetches
///
/// Overpass responses for adjacent bounding boxes repeat any way that
/// straddles the boundary. The registry remembers every feature id the
/// loader has processed so a footprint is materialized exactly once.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    seen: HashSet<i64>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the feature id has been processed before
    pub fn contains(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    /// Record a feature id; true if it was new
    pub fn mark(&mut self, id: i64) -> bool {
        self.seen.insert(id)
    }

    /// Number of recorded feature ids
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_contains() {
        let mut registry = FeatureRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(42));

        assert!(registry.mark(42));
        assert!(registry.contains(42));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut registry = FeatureRegistry::new();

        assert!(registry.mark(7));
        assert!(!registry.mark(7));
        assert_eq!(registry.len(), 1);
    }
}
