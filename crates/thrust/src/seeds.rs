//! Seed-axis generation. Each function is pure and returns the candidate set in a fixed order,
//! so the earliest-seed tie-break is reproducible.

use shapes_core::vector::{Vector3, add, normalize, sub};

/// Candidate starting directions for refinement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSet {
    pub axes: Vec<Vector3>,
    /// Candidates dropped because their direction was undefined.
    pub degenerate: usize,
}

impl SeedSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            axes: Vec::with_capacity(capacity),
            degenerate: 0,
        }
    }

    fn push(&mut self, candidate: &Vector3) {
        match normalize(candidate) {
            Ok(axis) => self.axes.push(axis),
            Err(_) => self.degenerate += 1,
        }
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// One seed per particle: its normalised momentum.
pub fn single_seeds(momenta: &[Vector3]) -> SeedSet {
    let mut seeds = SeedSet::with_capacity(momenta.len());
    for p in momenta {
        seeds.push(p);
    }
    seeds
}

/// Normalised sum and difference of every particle pair `i < j`, sum first.
pub fn pairwise_seeds(momenta: &[Vector3]) -> SeedSet {
    let n = momenta.len();
    let mut seeds = SeedSet::with_capacity(n * n.saturating_sub(1));
    for (i, a) in momenta.iter().enumerate() {
        for b in &momenta[i + 1..] {
            seeds.push(&add(a, b));
            seeds.push(&sub(a, b));
        }
    }
    seeds
}

/// Single seeds followed by pairwise seeds.
pub fn exhaustive_seeds(momenta: &[Vector3]) -> SeedSet {
    let mut seeds = single_seeds(momenta);
    let pairs = pairwise_seeds(momenta);
    seeds.axes.extend(pairs.axes);
    seeds.degenerate += pairs.degenerate;
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_seeds_skip_zero_momenta() {
        let seeds = single_seeds(&[[0.0, 0.0, 2.0], [0.0, 0.0, 0.0], [3.0, 0.0, 0.0]]);
        assert_eq!(seeds.axes, vec![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]);
        assert_eq!(seeds.degenerate, 1);
    }

    #[test]
    fn pairwise_seeds_cover_sums_and_differences() {
        let momenta = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let seeds = pairwise_seeds(&momenta);
        assert_eq!(seeds.len(), 6);
        let h = 1.0 / 2.0_f64.sqrt();
        assert!((seeds.axes[0][0] - h).abs() < 1e-15 && (seeds.axes[0][1] - h).abs() < 1e-15);
        assert!((seeds.axes[1][1] + h).abs() < 1e-15);
    }

    #[test]
    fn back_to_back_pair_sum_is_degenerate() {
        let seeds = pairwise_seeds(&[[0.0, 0.0, 10.0], [0.0, 0.0, -10.0]]);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds.degenerate, 1);
        assert_eq!(seeds.axes[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn exhaustive_seeds_start_with_single_seeds() {
        let momenta = [[1.0, 2.0, 0.5], [-0.3, 0.4, 1.0], [0.2, -1.0, -0.7], [2.0, 0.1, 0.0]];
        let single = single_seeds(&momenta);
        let all = exhaustive_seeds(&momenta);
        assert_eq!(all.len(), 4 + 4 * 3);
        assert_eq!(&all.axes[..4], single.axes.as_slice());
    }
}
