use std::fmt;
use std::sync::Arc;

use mirabest_core::Tensor;
use mirabest_transforms::{Compose, RawImage};
use rand::RngCore;

use crate::error::{DataError, DataResult};

/// Trait for labeled image datasets.
///
/// `get` materializes one sample through whatever transform the dataset
/// carries; random transforms draw from `rng`.
pub trait Dataset {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn get(&self, idx: usize, rng: &mut dyn RngCore) -> DataResult<(Tensor<f32>, usize)>;
}

impl<D: Dataset + ?Sized> Dataset for Arc<D> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, idx: usize, rng: &mut dyn RngCore) -> DataResult<(Tensor<f32>, usize)> {
        (**self).get(idx, rng)
    }
}

/// Fail with `EmptyPartition` when `dataset` has no samples.
pub fn require_non_empty<D: Dataset + ?Sized>(dataset: &D, name: &str) -> DataResult<()> {
    if dataset.is_empty() {
        return Err(DataError::EmptyPartition {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A raw pool: byte images with integer class labels and the transform that
/// turns them into tensors.
pub struct ImagePool {
    name: String,
    images: Vec<RawImage>,
    targets: Vec<usize>,
    transform: Arc<Compose>,
}

impl ImagePool {
    pub fn new(
        name: impl Into<String>,
        images: Vec<RawImage>,
        targets: Vec<usize>,
        transform: Compose,
    ) -> DataResult<Self> {
        if images.len() != targets.len() {
            return Err(DataError::LengthMismatch {
                images: images.len(),
                targets: targets.len(),
            });
        }
        Ok(ImagePool {
            name: name.into(),
            images,
            targets,
            transform: Arc::new(transform),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn images(&self) -> &[RawImage] {
        &self.images
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn transform(&self) -> &Compose {
        &self.transform
    }

    /// Untransformed image and label at `idx`.
    pub fn raw(&self, idx: usize) -> Option<(&RawImage, usize)> {
        Some((self.images.get(idx)?, *self.targets.get(idx)?))
    }

    /// Number of samples per label, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let n_classes = self.targets.iter().max().map_or(0, |&m| m + 1);
        let mut counts = vec![0usize; n_classes];
        for &t in &self.targets {
            counts[t] += 1;
        }
        counts
    }
}

impl Dataset for ImagePool {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn get(&self, idx: usize, rng: &mut dyn RngCore) -> DataResult<(Tensor<f32>, usize)> {
        let (image, label) = self.raw(idx).ok_or(DataError::IndexOutOfBounds {
            index: idx,
            len: self.len(),
        })?;
        let tensor = self.transform.apply(image, rng)?;
        Ok((tensor, label))
    }
}

impl fmt::Debug for ImagePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePool")
            .field("name", &self.name)
            .field("len", &self.images.len())
            .finish()
    }
}

/// Immutable indexed view: a shared backing dataset plus the list of
/// positions that belong to the view. The backing dataset is never modified.
pub struct Subset<D> {
    dataset: Arc<D>,
    indices: Arc<[usize]>,
}

impl<D: Dataset> Subset<D> {
    /// View over `indices` of `dataset`. Indices may repeat.
    pub fn new(dataset: Arc<D>, indices: Vec<usize>) -> DataResult<Self> {
        let len = dataset.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(DataError::IndexOutOfBounds { index, len });
        }
        Ok(Subset {
            dataset,
            indices: indices.into(),
        })
    }

    /// View over every sample of `dataset`, in order.
    pub fn full(dataset: Arc<D>) -> Self {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Subset {
            dataset,
            indices: indices.into(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn dataset(&self) -> &Arc<D> {
        &self.dataset
    }
}

impl<D> Clone for Subset<D> {
    fn clone(&self) -> Self {
        Subset {
            dataset: Arc::clone(&self.dataset),
            indices: Arc::clone(&self.indices),
        }
    }
}

impl<D: Dataset> Dataset for Subset<D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, idx: usize, rng: &mut dyn RngCore) -> DataResult<(Tensor<f32>, usize)> {
        let inner = *self.indices.get(idx).ok_or(DataError::IndexOutOfBounds {
            index: idx,
            len: self.indices.len(),
        })?;
        self.dataset.get(inner, rng)
    }
}

/// Concatenation of several datasets, indexed end to end.
pub struct ConcatDataset<D> {
    parts: Vec<D>,
    ends: Vec<usize>,
}

impl<D: Dataset> ConcatDataset<D> {
    pub fn new(parts: Vec<D>) -> Self {
        let ends = parts
            .iter()
            .scan(0usize, |acc, p| {
                *acc += p.len();
                Some(*acc)
            })
            .collect();
        ConcatDataset { parts, ends }
    }

    pub fn parts(&self) -> &[D] {
        &self.parts
    }
}

impl<D: Dataset> Dataset for ConcatDataset<D> {
    fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    fn get(&self, idx: usize, rng: &mut dyn RngCore) -> DataResult<(Tensor<f32>, usize)> {
        let part = self.ends.partition_point(|&end| end <= idx);
        if part >= self.parts.len() {
            return Err(DataError::IndexOutOfBounds {
                index: idx,
                len: self.len(),
            });
        }
        let start = if part == 0 { 0 } else { self.ends[part - 1] };
        self.parts[part].get(idx - start, rng)
    }
}
