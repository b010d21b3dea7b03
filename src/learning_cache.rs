//! LearningCache - bounded pool of synapse growth candidates.
//!
//! The cache is scratch state owned by the layer. `time_step` clears it and
//! refills it with every cell that was learning in the step just finished;
//! segments growing new synapses during the following step copy targets out of
//! it at random. Entries are never removed by sampling.

use crate::synapse::SynapseTarget;
use crate::utils::rand_index;
use rand::Rng;

/// Fixed-capacity list of candidate targets.
///
/// # Examples
///
/// ```
/// use htm_cla::{LearningCache, SynapseTarget};
/// use rand::SeedableRng;
///
/// let mut cache = LearningCache::new(2);
/// cache.push(SynapseTarget::new(0, 1));
/// cache.push(SynapseTarget::new(3, 0));
/// cache.push(SynapseTarget::new(5, 2)); // dropped, cache is full
/// assert_eq!(cache.len(), 2);
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// assert!(cache.sample(&mut rng).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct LearningCache {
    entries: Vec<SynapseTarget>,
    capacity: usize,
}

impl LearningCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop every entry.
    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Append a candidate, returning `false` once the cache is full.
    #[inline]
    pub fn push(&mut self, target: SynapseTarget) -> bool {
        if self.entries.len() < self.capacity {
            self.entries.push(target);
            true
        } else {
            false
        }
    }

    /// Uniformly random entry, `None` when empty.
    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<SynapseTarget> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries[rand_index(self.entries.len(), rng)])
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &SynapseTarget> {
        self.entries.iter()
    }

    /// Approximate memory footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.entries.capacity() * std::mem::size_of::<SynapseTarget>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_sample() {
        let cache = LearningCache::new(4);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(cache.is_empty());
        assert_eq!(cache.sample(&mut rng), None);
    }

    #[test]
    fn test_push_bounded() {
        let mut cache = LearningCache::new(3);
        for c in 0..5 {
            cache.push(SynapseTarget::new(c, 0));
        }
        assert!(cache.is_full());
        assert_eq!(cache.len(), 3);
        assert!(!cache.push(SynapseTarget::new(9, 0)));
        let cols: Vec<usize> = cache.iter().map(|t| t.column).collect();
        assert_eq!(cols, vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_does_not_remove() {
        let mut cache = LearningCache::new(8);
        cache.push(SynapseTarget::new(4, 1));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(cache.sample(&mut rng), Some(SynapseTarget::new(4, 1)));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut cache = LearningCache::new(2);
        cache.push(SynapseTarget::new(1, 1));
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }
}
