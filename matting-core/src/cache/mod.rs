//! Bounded Laplacian cache.
//!
//! Rebuilding the matting Laplacian is the single most expensive stage
//! of the pipeline; [`LaplacianCache`] lets repeated solves over the
//! same image (e.g. interactive trimap refinement) skip it when the
//! inputs that actually determine `L` — image dimensions, the solver
//! parameters, and which pixels the refinement mask covers — haven't
//! changed.
//!
//! `spec.md` §9's Open Question flags that keying on shape alone is
//! wrong: two refinement masks of the same shape but different content
//! produce different matrices. The key here folds in a hash of the
//! mask's own bits rather than just its length.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use nalgebra_sparse::CscMatrix;

/// Maximum number of distinct Laplacians retained at once. Eviction is
/// oldest-insertion-first once the cache is full.
pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    height: usize,
    width: usize,
    eps_bits: u64,
    win_rad: usize,
    mask_hash: u64,
}

impl CacheKey {
    fn new(height: usize, width: usize, eps: f64, win_rad: usize, mask: Option<&[bool]>) -> Self {
        let mask_hash = match mask {
            None => 0,
            Some(bits) => {
                let mut hasher = DefaultHasher::new();
                bits.hash(&mut hasher);
                // Distinguish "no mask" (hash 0 above) from an
                // all-false mask that would otherwise also hash to a
                // fixed value; fold in a discriminant bit.
                1u8.hash(&mut hasher);
                hasher.finish()
            }
        };
        Self {
            height,
            width,
            eps_bits: eps.to_bits(),
            win_rad,
            mask_hash,
        }
    }
}

struct Entry {
    key: CacheKey,
    matrix: CscMatrix<f64>,
}

/// A small bounded cache of assembled Laplacians, safe to share across
/// threads behind a single lock (construction is already the expensive
/// part; readers never block each other beyond the clone of the cached
/// matrix).
pub struct LaplacianCache {
    entries: Mutex<VecDeque<Entry>>,
}

impl LaplacianCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(MAX_ENTRIES)),
        }
    }

    /// Look up a cached Laplacian matching these parameters.
    pub fn get(
        &self,
        height: usize,
        width: usize,
        eps: f64,
        win_rad: usize,
        mask: Option<&[bool]>,
    ) -> Option<CscMatrix<f64>> {
        let key = CacheKey::new(height, width, eps, win_rad, mask);
        let entries = self.entries.lock().expect("laplacian cache lock poisoned");
        entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.matrix.clone())
    }

    /// Install a freshly built Laplacian, evicting the oldest entry if
    /// the cache is already at capacity.
    pub fn insert(
        &self,
        height: usize,
        width: usize,
        eps: f64,
        win_rad: usize,
        mask: Option<&[bool]>,
        matrix: CscMatrix<f64>,
    ) {
        let key = CacheKey::new(height, width, eps, win_rad, mask);
        let mut entries = self.entries.lock().expect("laplacian cache lock poisoned");
        if entries.iter().any(|e| e.key == key) {
            return;
        }
        if entries.len() >= MAX_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(Entry { key, matrix });
    }

    /// Number of entries currently resident.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("laplacian cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LaplacianCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn tiny_matrix(v: f64) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, v);
        coo.push(1, 1, v);
        CscMatrix::from(&coo)
    }

    #[test]
    fn miss_then_hit_after_insert() {
        let cache = LaplacianCache::new();
        assert!(cache.get(4, 4, 1e-7, 1, None).is_none());
        cache.insert(4, 4, 1e-7, 1, None, tiny_matrix(1.0));
        assert!(cache.get(4, 4, 1e-7, 1, None).is_some());
    }

    #[test]
    fn different_mask_content_is_a_different_key_despite_same_shape() {
        let cache = LaplacianCache::new();
        let mask_a = vec![true, false, false, false];
        let mask_b = vec![false, false, false, true];
        cache.insert(2, 2, 1e-7, 1, Some(&mask_a), tiny_matrix(1.0));
        assert!(cache.get(2, 2, 1e-7, 1, Some(&mask_a)).is_some());
        assert!(cache.get(2, 2, 1e-7, 1, Some(&mask_b)).is_none());
    }

    #[test]
    fn evicts_oldest_entry_once_full() {
        let cache = LaplacianCache::new();
        for i in 0..MAX_ENTRIES {
            cache.insert(i + 1, 1, 1e-7, 1, None, tiny_matrix(1.0));
        }
        assert_eq!(cache.len(), MAX_ENTRIES);
        cache.insert(MAX_ENTRIES + 1, 1, 1e-7, 1, None, tiny_matrix(1.0));
        assert_eq!(cache.len(), MAX_ENTRIES);
        assert!(cache.get(1, 1, 1e-7, 1, None).is_none(), "oldest entry should be evicted");
        assert!(cache.get(MAX_ENTRIES + 1, 1, 1e-7, 1, None).is_some());
    }
}
