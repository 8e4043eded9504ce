//! Reference-point selection.
//!
//! Reference points are the points whose neighborhoods are searched. Using
//! all of them is exact; a random subset bounds the cost of long series.
//! Subsets are drawn with a ChaCha generator seeded from an explicit seed,
//! so two runs with the same seed and input visit the same references in the
//! same (ascending) order.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0x0D25EED;

/// Which points act as reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSelection {
    /// Every embedded point.
    #[default]
    All,

    /// A seeded random subset of this many points.
    Random(usize),
}

impl ReferenceSelection {
    /// Reference indices into a point set of length `n`, ascending.
    pub fn select(self, n: usize, seed: u64) -> Vec<usize> {
        match self {
            Self::Random(count) if count < n => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut picked = index::sample(&mut rng, n, count).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_oversized_subsets_take_everything() {
        assert_eq!(ReferenceSelection::All.select(4, 1), vec![0, 1, 2, 3]);
        assert_eq!(ReferenceSelection::Random(10).select(3, 1), vec![0, 1, 2]);
    }

    #[test]
    fn random_subset_is_reproducible_and_sorted() {
        let a = ReferenceSelection::Random(50).select(1000, DEFAULT_SEED);
        let b = ReferenceSelection::Random(50).select(1000, DEFAULT_SEED);
        let c = ReferenceSelection::Random(50).select(1000, DEFAULT_SEED + 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 50);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }
}
