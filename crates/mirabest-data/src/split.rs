use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{DataError, DataResult};

/// The two fractions driving the semi-supervised split.
///
/// `fraction` is the share of the raw train pool that participates at all;
/// `split` is the share of the participating pool that is labeled. Both lie
/// in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFractions {
    fraction: f64,
    split: f64,
}

impl SplitFractions {
    pub fn new(fraction: f64, split: f64) -> DataResult<Self> {
        check_unit_interval("fraction", fraction)?;
        check_unit_interval("split", split)?;
        Ok(SplitFractions { fraction, split })
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn split(&self) -> f64 {
        self.split
    }

    /// `floor(fraction * n)`, or `n` when nothing is discarded.
    pub fn retained_len(&self, n: usize) -> usize {
        if self.fraction == 1.0 {
            n
        } else {
            truncated(n, self.fraction)
        }
    }

    /// `floor(split * retained)`.
    pub fn labeled_len(&self, retained: usize) -> usize {
        truncated(retained, self.split)
    }
}

fn check_unit_interval(name: &str, value: f64) -> DataResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DataError::Config(format!(
            "{} must lie in (0, 1], got {}",
            name, value
        )))
    }
}

fn truncated(n: usize, fraction: f64) -> usize {
    ((n as f64) * fraction) as usize
}

/// Shuffle `indices` and split them into a leading part of `first_len` and
/// the remainder. `first_len` is clamped to the number of indices.
pub fn random_split<R: Rng + ?Sized>(
    mut indices: Vec<usize>,
    first_len: usize,
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    indices.shuffle(rng);
    let rest = indices.split_off(first_len.min(indices.len()));
    (indices, rest)
}

/// `floor(fraction * n)` indices drawn uniformly from `0..n` with replacement.
pub fn sample_with_replacement<R: Rng + ?Sized>(
    n: usize,
    fraction: f64,
    rng: &mut R,
) -> DataResult<Vec<usize>> {
    check_unit_interval("fraction", fraction)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    Ok((0..truncated(n, fraction))
        .map(|_| rng.gen_range(0..n))
        .collect())
}

/// Labeled / unlabeled / discarded index sets over one train pool.
///
/// The three sets are disjoint and together cover `0..pool_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    labeled: Vec<usize>,
    unlabeled: Vec<usize>,
    discarded: Vec<usize>,
    pool_len: usize,
}

impl Partition {
    /// Partition `0..pool_len`: first keep a random `retained_len` subset
    /// (only when `fraction < 1`), then split the kept indices into labeled
    /// and unlabeled at random. Both steps sample without replacement.
    pub fn new<R: Rng + ?Sized>(pool_len: usize, fractions: SplitFractions, rng: &mut R) -> Self {
        let mut retained: Vec<usize> = (0..pool_len).collect();
        let mut discarded = Vec::new();

        if fractions.fraction() < 1.0 {
            let keep = fractions.retained_len(pool_len);
            let (kept, dropped) = random_split(retained, keep, rng);
            retained = kept;
            discarded = dropped;
        }

        let n_labeled = fractions.labeled_len(retained.len());
        let (labeled, unlabeled) = random_split(retained, n_labeled, rng);

        Partition {
            labeled,
            unlabeled,
            discarded,
            pool_len,
        }
    }

    pub fn labeled(&self) -> &[usize] {
        &self.labeled
    }

    pub fn unlabeled(&self) -> &[usize] {
        &self.unlabeled
    }

    pub fn discarded(&self) -> &[usize] {
        &self.discarded
    }

    pub fn pool_len(&self) -> usize {
        self.pool_len
    }

    pub fn retained_len(&self) -> usize {
        self.labeled.len() + self.unlabeled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn fractions(fraction: f64, split: f64) -> SplitFractions {
        SplitFractions::new(fraction, split).unwrap()
    }

    #[test]
    fn test_scenario_sizes() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = Partition::new(100, fractions(0.8, 0.5), &mut rng);
        assert_eq!(p.retained_len(), 80);
        assert_eq!(p.labeled().len(), 40);
        assert_eq!(p.unlabeled().len(), 40);
        assert_eq!(p.discarded().len(), 20);
    }

    #[test]
    fn test_partition_is_disjoint_cover() {
        let mut rng = StdRng::seed_from_u64(1);
        for &(n, fraction, split) in &[
            (0usize, 0.5, 0.5),
            (1, 1.0, 0.5),
            (37, 0.3, 0.9),
            (250, 1.0, 0.1),
            (1000, 0.75, 1.0),
            (999, 0.01, 0.25),
        ] {
            let f = fractions(fraction, split);
            let p = Partition::new(n, f, &mut rng);
            assert_eq!(p.retained_len(), f.retained_len(n));
            assert_eq!(p.retained_len(), if fraction == 1.0 { n } else { (n as f64 * fraction) as usize });

            let l: HashSet<_> = p.labeled().iter().copied().collect();
            let u: HashSet<_> = p.unlabeled().iter().copied().collect();
            let d: HashSet<_> = p.discarded().iter().copied().collect();
            assert_eq!(l.len(), p.labeled().len());
            assert_eq!(u.len(), p.unlabeled().len());
            assert!(l.is_disjoint(&u));
            assert!(l.is_disjoint(&d) && u.is_disjoint(&d));
            assert_eq!(l.len() + u.len() + d.len(), n);
            assert!(l.iter().chain(&u).chain(&d).all(|&i| i < n));
        }
    }

    #[test]
    fn test_same_seed_same_partition() {
        let f = fractions(0.6, 0.3);
        let a = Partition::new(500, f, &mut StdRng::seed_from_u64(9));
        let b = Partition::new(500, f, &mut StdRng::seed_from_u64(9));
        let c = Partition::new(500, f, &mut StdRng::seed_from_u64(10));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_full_split_leaves_no_unlabeled() {
        let p = Partition::new(10, fractions(1.0, 1.0), &mut StdRng::seed_from_u64(0));
        assert_eq!(p.labeled().len(), 10);
        assert!(p.unlabeled().is_empty());
        assert!(p.discarded().is_empty());
    }

    #[test]
    fn test_fractions_validated() {
        assert!(matches!(SplitFractions::new(1.2, 0.5), Err(DataError::Config(_))));
        assert!(matches!(SplitFractions::new(0.0, 0.5), Err(DataError::Config(_))));
        assert!(matches!(SplitFractions::new(0.5, -0.1), Err(DataError::Config(_))));
        assert!(matches!(SplitFractions::new(0.5, f64::NAN), Err(DataError::Config(_))));
        assert!(SplitFractions::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_random_split_clamps() {
        let mut rng = StdRng::seed_from_u64(3);
        let (a, b) = random_split((0..5).collect(), 9, &mut rng);
        assert_eq!(a.len(), 5);
        assert!(b.is_empty());
    }

    #[test]
    fn test_sample_with_replacement() {
        let mut rng = StdRng::seed_from_u64(4);
        let idx = sample_with_replacement(10, 1.0, &mut rng).unwrap();
        assert_eq!(idx.len(), 10);
        assert!(idx.iter().all(|&i| i < 10));
        assert_eq!(sample_with_replacement(10, 0.35, &mut rng).unwrap().len(), 3);
        assert!(sample_with_replacement(0, 0.5, &mut rng).unwrap().is_empty());
        assert!(sample_with_replacement(10, 2.0, &mut rng).is_err());
    }
}
