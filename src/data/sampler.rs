// ============================================================
// Layer 4 - Subset Sampler
// ============================================================
// Shuffles the loaded digits and optionally keeps only the
// first `limit` of them.
//
// Useful for quick runs: 60 000 digits per epoch is plenty for
// a real run but far too many when checking that the training
// loop works on a laptop CPU.
//
// The shuffle is seeded so two runs with the same --seed see
// exactly the same subset.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seeded shuffle, then truncate to `limit` (if given).
pub fn random_subset<T>(mut items: Vec<T>, limit: Option<usize>, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total = items.len();
    if let Some(limit) = limit {
        items.truncate(limit);
    }

    tracing::debug!("Subset: kept {} of {} items", items.len(), total);
    items
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_truncates() {
        let items: Vec<usize> = (0..100).collect();
        assert_eq!(random_subset(items, Some(10), 1).len(), 10);
    }

    #[test]
    fn test_no_limit_keeps_everything() {
        let items: Vec<usize> = (0..50).collect();
        let mut out = random_subset(items, None, 7);
        assert_eq!(out.len(), 50);
        out.sort();
        assert_eq!(out, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_subset() {
        let a = random_subset((0..100).collect::<Vec<usize>>(), Some(5), 42);
        let b = random_subset((0..100).collect::<Vec<usize>>(), Some(5), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_limit_larger_than_input() {
        let items: Vec<usize> = (0..3).collect();
        assert_eq!(random_subset(items, Some(10), 0).len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<usize> = Vec::new();
        assert!(random_subset(items, Some(4), 0).is_empty());
    }
}
