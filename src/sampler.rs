//! Stratified Coverage Sampler
//!
//! Draws a small, reproducible sample from one year partition of submitted
//! field forms:
//!   1. Base sample: `min(ceil(sqrt(n)), n)` rows, uniform without replacement
//!   2. Coverage pass: one extra row for every form category the base missed
//!   3. Padding: up to `extra_count` more rows from the unselected pool
//!
//! The sampler works on row positions only, so it is independent of how the
//! partition is stored. Callers pass the category of every row and an explicit
//! RNG; the same categories and the same seed always give the same sample.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Extra rows added to each partition to cover refusals / unreachable producers
pub const DEFAULT_EXTRA_COUNT: usize = 10;

/// Base sample size for a partition of `n` rows: `min(ceil(sqrt(n)), n)`
pub fn base_sample_size(n: usize) -> usize {
    if n == 0 {
        return 0;
    }

    // Integer ceil(sqrt(n)), corrected for float rounding on large n
    let mut root = (n as f64).sqrt().ceil() as usize;
    while root > 1 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    while root * root < n {
        root += 1;
    }

    root.min(n)
}

/// Row positions selected from one partition, kept per pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSample {
    /// Uniform base draw (size `base_sample_size(n)`)
    pub base: Vec<usize>,
    /// One row per category missing from the base draw
    pub coverage: Vec<usize>,
    /// Extra rows drawn from the remaining pool
    pub padding: Vec<usize>,
}

impl PartitionSample {
    /// All selected positions: base, then coverage, then padding
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.base
            .iter()
            .chain(self.coverage.iter())
            .chain(self.padding.iter())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.coverage.len() + self.padding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sampler with a fixed padding count
#[derive(Debug, Clone, Copy)]
pub struct CoverageSampler {
    extra_count: usize,
}

impl Default for CoverageSampler {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRA_COUNT)
    }
}

impl CoverageSampler {
    pub fn new(extra_count: usize) -> Self {
        Self { extra_count }
    }

    /// Sample one partition
    ///
    /// `categories[i]` is the form category of row `i`. Never fails: empty
    /// partitions give an empty sample and every count is clamped to what
    /// the partition can supply.
    pub fn sample<K, R>(&self, categories: &[K], rng: &mut R) -> PartitionSample
    where
        K: Eq + Hash,
        R: Rng + ?Sized,
    {
        let n = categories.len();
        let mut selected = vec![false; n];

        // STEP 1: Base draw
        let base = index::sample(rng, n, base_sample_size(n)).into_vec();
        for &i in &base {
            selected[i] = true;
        }

        // STEP 2: Coverage pass, categories visited in first-appearance order
        // so the RNG stream (and hence the sample) is stable across runs
        let mut order: Vec<&K> = Vec::new();
        let mut members: FxHashMap<&K, Vec<usize>> = FxHashMap::default();
        for (i, category) in categories.iter().enumerate() {
            members
                .entry(category)
                .or_insert_with(|| {
                    order.push(category);
                    Vec::new()
                })
                .push(i);
        }

        let mut coverage = Vec::new();
        for category in order {
            let rows = &members[category];
            if rows.iter().any(|&i| selected[i]) {
                continue;
            }
            if let Some(&pick) = rows.choose(rng) {
                selected[pick] = true;
                coverage.push(pick);
            }
        }

        // STEP 3: Padding from whatever is left
        let remaining: Vec<usize> = (0..n).filter(|&i| !selected[i]).collect();
        let take = self.extra_count.min(remaining.len());
        let padding: Vec<usize> = remaining.choose_multiple(rng, take).copied().collect();

        PartitionSample { base, coverage, padding }
    }

    /// Sample a slice of records, reading each record's category with `key`
    pub fn sample_items<'a, T, K, F, R>(&self, items: &'a [T], key: F, rng: &mut R) -> Vec<&'a T>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
        R: Rng + ?Sized,
    {
        let categories: Vec<K> = items.iter().map(key).collect();
        self.sample(&categories, rng)
            .indices()
            .map(|i| &items[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// 100 rows: one "legume", the rest split between "grass" and "grain"
    fn legume_partition() -> Vec<&'static str> {
        let mut categories = Vec::with_capacity(100);
        for i in 0..99 {
            categories.push(if i % 2 == 0 { "grass" } else { "grain" });
        }
        categories.insert(57, "legume");
        categories
    }

    fn assert_invariants(categories: &[&str], sample: &PartitionSample, extra_count: usize) {
        let n = categories.len();
        let indices: Vec<usize> = sample.indices().collect();

        // No duplicates, all in range
        let unique: HashSet<usize> = indices.iter().copied().collect();
        assert_eq!(unique.len(), indices.len(), "duplicate rows selected");
        assert!(indices.iter().all(|&i| i < n));

        // Base size
        assert_eq!(sample.base.len(), base_sample_size(n));

        // Coverage
        let all: HashSet<&str> = categories.iter().copied().collect();
        let covered: HashSet<&str> = indices.iter().map(|&i| categories[i]).collect();
        assert_eq!(covered, all);

        // Coverage adds exactly the categories the base draw missed
        let base_categories: HashSet<&str> = sample.base.iter().map(|&i| categories[i]).collect();
        assert_eq!(sample.coverage.len(), all.len() - base_categories.len());

        // Size formula
        let pool = n - sample.base.len() - sample.coverage.len();
        assert_eq!(sample.padding.len(), extra_count.min(pool));
        assert!(sample.len() <= n);
    }

    #[test]
    fn test_base_sample_size() {
        assert_eq!(base_sample_size(0), 0);
        assert_eq!(base_sample_size(1), 1);
        assert_eq!(base_sample_size(2), 2);
        assert_eq!(base_sample_size(3), 2);
        assert_eq!(base_sample_size(4), 2);
        assert_eq!(base_sample_size(5), 3);
        assert_eq!(base_sample_size(99), 10);
        assert_eq!(base_sample_size(100), 10);
        assert_eq!(base_sample_size(101), 11);

        for n in 0..2000usize {
            let expected = ((n as f64).sqrt().ceil() as usize).min(n);
            assert_eq!(base_sample_size(n), expected, "n = {}", n);
        }
    }

    #[test]
    fn test_empty_partition() {
        let categories: Vec<&str> = Vec::new();
        let sample = CoverageSampler::default().sample(&categories, &mut rng(42));
        assert!(sample.is_empty());
        assert_eq!(sample, PartitionSample::default());
    }

    #[test]
    fn test_two_row_partition_takes_everything() {
        let categories = vec!["grass", "legume"];
        let sample = CoverageSampler::new(10).sample(&categories, &mut rng(42));

        assert_eq!(sample.base.len(), 2);
        assert!(sample.coverage.is_empty());
        assert!(sample.padding.is_empty());

        let mut indices: Vec<usize> = sample.indices().collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_rare_category_is_always_covered() {
        let categories = legume_partition();
        let legume_row = 57;
        let sampler = CoverageSampler::new(10);
        let mut coverage_path_seen = false;

        for seed in 0..64 {
            let sample = sampler.sample(&categories, &mut rng(seed));
            assert_invariants(&categories, &sample, 10);
            assert!(sample.indices().any(|i| i == legume_row));
            assert_eq!(sample.len(), 10 + sample.coverage.len() + 10);

            let base_has_common = ["grass", "grain"]
                .iter()
                .all(|c| sample.base.iter().any(|&i| categories[i] == *c));
            if base_has_common {
                assert!(sample.len() <= 21);
            }

            if !sample.base.contains(&legume_row) {
                coverage_path_seen = true;
                assert!(sample.coverage.contains(&legume_row));
            }
        }

        // 10 of 100 rows per draw: the base misses the legume most of the time
        assert!(coverage_path_seen);
    }

    #[test]
    fn test_single_category_partition() {
        let categories = vec!["grass"; 30];
        let sample = CoverageSampler::new(10).sample(&categories, &mut rng(7));
        assert_invariants(&categories, &sample, 10);
        assert!(sample.coverage.is_empty());
        assert_eq!(sample.len(), 6 + 10);
    }

    #[test]
    fn test_every_row_its_own_category() {
        // More categories than the base draw can hold
        let names: Vec<String> = (0..20).map(|i| format!("form_{}", i)).collect();
        let categories: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let sample = CoverageSampler::new(10).sample(&categories, &mut rng(3));

        assert_invariants(&categories, &sample, 10);
        assert_eq!(sample.base.len(), 5);
        assert_eq!(sample.coverage.len(), 15);
        assert!(sample.padding.is_empty());
    }

    #[test]
    fn test_padding_clamps_to_pool() {
        let categories = vec!["grass", "grass", "grain", "grain", "grass", "grain", "grass"];
        for seed in 0..16 {
            let sample = CoverageSampler::new(10).sample(&categories, &mut rng(seed));
            assert_invariants(&categories, &sample, 10);
            assert_eq!(sample.len(), categories.len());
        }
    }

    #[test]
    fn test_zero_extra_count() {
        let categories = legume_partition();
        let sample = CoverageSampler::new(0).sample(&categories, &mut rng(11));
        assert_invariants(&categories, &sample, 0);
        assert!(sample.padding.is_empty());
    }

    #[test]
    fn test_invariants_across_sizes() {
        let labels = ["grass", "grain", "legume", "brassica"];
        for n in 0..120usize {
            // Skewed: later labels are rare
            let categories: Vec<&str> = (0..n)
                .map(|i| labels[(i * i + 3 * i) % 11 % labels.len()])
                .collect();
            let sample = CoverageSampler::default().sample(&categories, &mut rng(n as u64));
            assert_invariants(&categories, &sample, DEFAULT_EXTRA_COUNT);
        }
    }

    #[test]
    fn test_same_seed_same_sample() {
        let categories = legume_partition();
        let sampler = CoverageSampler::default();

        let first = sampler.sample(&categories, &mut rng(42));
        let second = sampler.sample(&categories, &mut rng(42));
        assert_eq!(first, second);

        // Different seeds should not all collapse to one sample
        let distinct: HashSet<Vec<usize>> = (0..8u64)
            .map(|seed| sampler.sample(&categories, &mut rng(seed)).indices().collect())
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_sample_items_returns_records() {
        #[derive(Debug, PartialEq)]
        struct Form {
            id: u32,
            kind: &'static str,
        }

        let forms: Vec<Form> = (0..25)
            .map(|id| Form { id, kind: if id == 24 { "legume" } else { "grain" } })
            .collect();

        let picked = CoverageSampler::new(3).sample_items(&forms, |f| f.kind, &mut rng(5));

        assert!(picked.iter().any(|f| f.kind == "legume"));
        let ids: HashSet<u32> = picked.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), picked.len());
        // 5 base + (0 or 1 coverage) + 3 padding
        assert!(picked.len() == 8 || picked.len() == 9);
    }
}
