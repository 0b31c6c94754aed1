use std::collections::BTreeMap;

use mirabest_core::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::{require_non_empty, Dataset};
use crate::error::{DataError, DataResult};

/// A group of samples: images stacked to `[B, C, H, W]` and their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Tensor<f32>,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// DataLoader for batching and shuffling datasets.
///
/// One pass yields `ceil(len / batch_size)` batches; the last one is short
/// when the length is not a multiple of the batch size. The loader owns its
/// generator, which drives both shuffling and the dataset's random
/// transforms, so a given seed always reproduces the same pass.
pub struct DataLoader<D: Dataset> {
    dataset: D,
    batch_size: usize,
    shuffle: bool,
    indices: Vec<usize>,
    current: usize,
    rng: StdRng,
}

impl<D: Dataset> DataLoader<D> {
    pub fn new(dataset: D, batch_size: usize, shuffle: bool, seed: u64) -> DataResult<Self> {
        if batch_size == 0 {
            return Err(DataError::Config("batch_size must be positive".into()));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..dataset.len()).collect();
        if shuffle {
            indices.shuffle(&mut rng);
        }
        log::debug!(
            "dataloader over {} samples, batch_size={}, shuffle={}",
            indices.len(),
            batch_size,
            shuffle
        );
        Ok(DataLoader {
            dataset,
            batch_size,
            shuffle,
            indices,
            current: 0,
            rng,
        })
    }

    /// Loader that yields the whole dataset as a single batch.
    pub fn full(dataset: D, shuffle: bool, seed: u64) -> DataResult<Self> {
        require_non_empty(&dataset, "dataset")?;
        let n = dataset.len();
        Self::new(dataset, n, shuffle, seed)
    }

    /// Rewind for another pass, reshuffling if enabled.
    pub fn reset(&mut self) {
        self.current = 0;
        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches in one pass.
    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    /// Number of samples in one pass.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    fn fetch_batch(&mut self, start: usize, end: usize) -> DataResult<Batch> {
        let mut images = Vec::with_capacity(end - start);
        let mut labels = Vec::with_capacity(end - start);
        for &idx in &self.indices[start..end] {
            let (x, y) = self.dataset.get(idx, &mut self.rng)?;
            images.push(x);
            labels.push(y);
        }
        let refs: Vec<&Tensor<f32>> = images.iter().collect();
        Ok(Batch {
            images: Tensor::stack(&refs)?,
            labels,
        })
    }
}

impl<D: Dataset> Iterator for DataLoader<D> {
    type Item = DataResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.indices.len() {
            return None;
        }
        let start = self.current;
        let end = (start + self.batch_size).min(self.indices.len());
        self.current = end;
        Some(self.fetch_batch(start, end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.indices.len() - self.current).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

/// Several named loaders consumed in lockstep.
///
/// Each step yields one batch per loader, keyed by name; iteration stops as
/// soon as any member is exhausted.
pub struct CombinedLoader<D: Dataset> {
    loaders: BTreeMap<String, DataLoader<D>>,
}

impl<D: Dataset> CombinedLoader<D> {
    pub fn new() -> Self {
        CombinedLoader {
            loaders: BTreeMap::new(),
        }
    }

    pub fn add(mut self, name: impl Into<String>, loader: DataLoader<D>) -> Self {
        self.loaders.insert(name.into(), loader);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&DataLoader<D>> {
        self.loaders.get(name)
    }

    /// Steps per pass: the shortest member's batch count.
    pub fn num_batches(&self) -> usize {
        self.loaders
            .values()
            .map(DataLoader::num_batches)
            .min()
            .unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.loaders.values_mut().for_each(DataLoader::reset);
    }
}

impl<D: Dataset> Default for CombinedLoader<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dataset> Iterator for CombinedLoader<D> {
    type Item = DataResult<BTreeMap<String, Batch>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.loaders.is_empty() {
            return None;
        }
        let mut step = BTreeMap::new();
        for (name, loader) in self.loaders.iter_mut() {
            match loader.next()? {
                Ok(batch) => {
                    step.insert(name.clone(), batch);
                }
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(step))
    }
}
