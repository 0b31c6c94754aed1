use mirabest_core::Tensor;

use crate::dataloader::DataLoader;
use crate::dataset::{require_non_empty, Dataset};
use crate::error::DataResult;

/// Samples gathered by [`accumulate`], held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulated {
    /// `[N, C, H, W]`, or an empty rank-1 tensor when nothing was gathered.
    pub images: Tensor<f32>,
    pub labels: Vec<usize>,
    pub cycles: usize,
}

impl Accumulated {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Full passes over `n` samples needed to gather at least `size`.
pub fn cycles_needed(size: usize, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        size.div_ceil(n)
    }
}

/// Gather at least `size` samples by cycling over `dataset`.
///
/// Each cycle is one shuffled full pass with the dataset's transforms applied,
/// so the result holds `cycles_needed(size, len) * len` samples. Nothing is
/// trimmed.
pub fn accumulate<D: Dataset>(dataset: D, size: usize, seed: u64) -> DataResult<Accumulated> {
    require_non_empty(&dataset, "accumulator pool")?;
    let n = dataset.len();
    let cycles = cycles_needed(size, n);
    log::info!(
        "accumulating {} samples: {} cycle(s) over {} samples",
        size,
        cycles,
        n
    );

    if cycles == 0 {
        return Ok(Accumulated {
            images: Tensor::zeros(vec![0]),
            labels: Vec::new(),
            cycles,
        });
    }

    let mut loader = DataLoader::full(dataset, true, seed)?;
    let mut images = Vec::with_capacity(cycles);
    let mut labels = Vec::with_capacity(cycles * n);
    for cycle in 0..cycles {
        if cycle > 0 {
            loader.reset();
        }
        for batch in loader.by_ref() {
            let batch = batch?;
            labels.extend(batch.labels);
            images.push(batch.images);
        }
        log::debug!("cycle {}/{} done, {} samples so far", cycle + 1, cycles, labels.len());
    }

    let refs: Vec<&Tensor<f32>> = images.iter().collect();
    Ok(Accumulated {
        images: Tensor::concatenate(&refs)?,
        labels,
        cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::constant_pool;
    use crate::dataset::{ConcatDataset, Subset};
    use crate::error::DataError;
    use std::sync::Arc;

    #[test]
    fn test_cycles_needed() {
        assert_eq!(cycles_needed(15000, 12000), 2);
        assert_eq!(cycles_needed(12000, 12000), 1);
        assert_eq!(cycles_needed(1, 12000), 1);
        assert_eq!(cycles_needed(0, 12000), 0);
        assert_eq!(cycles_needed(5, 0), 0);
    }

    #[test]
    fn test_train_plus_test_scenario() {
        let train = Subset::full(Arc::new(constant_pool(10000)));
        let test = Subset::full(Arc::new(constant_pool(2000)));
        let combined = ConcatDataset::new(vec![train, test]);

        let acc = accumulate(combined, 15000, 0).unwrap();
        assert_eq!(acc.cycles, 2);
        assert_eq!(acc.len(), 24000);
        assert_eq!(acc.images.shape_vec(), vec![24000, 1, 2, 2]);
    }

    #[test]
    fn test_exact_multiple_and_label_counts() {
        let acc = accumulate(constant_pool(10), 30, 4).unwrap();
        assert_eq!(acc.cycles, 3);
        assert_eq!(acc.len(), 30);
        // Every cycle is a full pass, so each label appears once per cycle.
        assert_eq!(acc.labels.iter().filter(|&&l| l == 1).count(), 15);
    }

    #[test]
    fn test_zero_size_and_empty_pool() {
        let acc = accumulate(constant_pool(4), 0, 0).unwrap();
        assert!(acc.is_empty());
        assert_eq!(acc.cycles, 0);
        assert_eq!(acc.images.numel(), 0);

        assert!(matches!(
            accumulate(constant_pool(0), 10, 0),
            Err(DataError::EmptyPartition { .. })
        ));
    }
}
