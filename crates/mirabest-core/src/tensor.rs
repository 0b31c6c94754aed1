use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use serde::{Deserialize, Serialize};
use std::fmt;

/// N-dimensional tensor holding image data and batches of images.
///
/// Stores data in a flat contiguous `Vec<T>` with row-major (C-order) layout,
/// so an image `[C, H, W]` is channel-major and a batch is `[B, C, H, W]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, T::ZERO)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: Vec<usize>) -> Self {
        Self::full(shape, T::ONE)
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: T) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![value; s.numel()],
            shape: s,
        }
    }

    /// Build a tensor by evaluating `f` at every multi-index of `shape`.
    pub fn from_fn<F: FnMut(&[usize]) -> T>(shape: Vec<usize>, mut f: F) -> Self {
        let s = Shape::new(shape);
        let numel = s.numel();
        let strides = s.strides();
        let mut index = vec![0usize; s.ndim()];
        let mut data = Vec::with_capacity(numel);
        for flat in 0..numel {
            let mut remaining = flat;
            for (slot, &stride) in index.iter_mut().zip(strides.iter()) {
                *slot = remaining / stride;
                remaining %= stride;
            }
            data.push(f(&index));
        }
        Tensor { data, shape: s }
    }
}

// ─── Accessors ──────────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    fn offset(&self, indices: &[usize]) -> TensorResult<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::InvalidRank {
                expected: vec![self.ndim()],
                got: indices.len(),
            });
        }
        let strides = self.shape.strides();
        let mut offset = 0;
        for (axis, &idx) in indices.iter().enumerate() {
            let size = self.shape.dim(axis)?;
            if idx >= size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    axis,
                    size,
                });
            }
            offset += idx * strides[axis];
        }
        Ok(offset)
    }

    /// Multi-dimensional indexing.
    pub fn get(&self, indices: &[usize]) -> TensorResult<T> {
        Ok(self.data[self.offset(indices)?])
    }

    /// Set a single element.
    pub fn set(&mut self, indices: &[usize], value: T) -> TensorResult<()> {
        let offset = self.offset(indices)?;
        self.data[offset] = value;
        Ok(())
    }
}

// ─── Shape Manipulation ─────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Insert a dimension of size 1 at `axis`.
    pub fn unsqueeze(&self, axis: usize) -> TensorResult<Tensor<T>> {
        if axis > self.ndim() {
            return Err(TensorError::InvalidAxis {
                axis,
                ndim: self.ndim(),
            });
        }
        let mut dims = self.shape_vec();
        dims.insert(axis, 1);
        Tensor::new(self.data.clone(), dims)
    }

    /// Concatenate tensors along the leading axis.
    pub fn concatenate(tensors: &[&Tensor<T>]) -> TensorResult<Tensor<T>> {
        let first = tensors.first().ok_or(TensorError::EmptyTensor)?;
        if first.ndim() == 0 {
            return Err(TensorError::InvalidAxis { axis: 0, ndim: 0 });
        }
        let inner = &first.shape.dims()[1..];

        let mut rows = 0usize;
        let mut data = Vec::with_capacity(tensors.iter().map(|t| t.numel()).sum());
        for t in tensors {
            if t.ndim() != first.ndim() || &t.shape.dims()[1..] != inner {
                return Err(TensorError::ShapeMismatch {
                    expected: first.shape_vec(),
                    got: t.shape_vec(),
                });
            }
            rows += t.shape.dims()[0];
            data.extend_from_slice(&t.data);
        }

        let mut dims = first.shape_vec();
        dims[0] = rows;
        Tensor::new(data, dims)
    }

    /// Stack equally shaped tensors along a new leading axis.
    pub fn stack(tensors: &[&Tensor<T>]) -> TensorResult<Tensor<T>> {
        let first = tensors.first().ok_or(TensorError::EmptyTensor)?;
        let mut data = Vec::with_capacity(first.numel() * tensors.len());
        for t in tensors {
            if t.shape != first.shape {
                return Err(TensorError::ShapeMismatch {
                    expected: first.shape_vec(),
                    got: t.shape_vec(),
                });
            }
            data.extend_from_slice(&t.data);
        }
        let mut dims = Vec::with_capacity(first.ndim() + 1);
        dims.push(tensors.len());
        dims.extend_from_slice(first.shape.dims());
        Tensor::new(data, dims)
    }
}

// ─── Element-wise Operations ────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    pub fn apply<F: Fn(T) -> T>(&self, f: F) -> Tensor<T> {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    fn broadcast_binary_op<F: Fn(T, T) -> T>(
        &self,
        other: &Tensor<T>,
        op: F,
    ) -> TensorResult<Tensor<T>> {
        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| op(a, b))
                .collect();
            return Ok(Tensor {
                data,
                shape: self.shape.clone(),
            });
        }

        let out_shape = Shape::broadcast_shape(&self.shape, &other.shape)?;
        let out_strides = out_shape.strides();
        let ndim = out_shape.ndim();

        // Per-axis strides into each operand; broadcast axes contribute 0.
        let operand_strides = |s: &Shape| -> Vec<usize> {
            let pad = ndim - s.ndim();
            let strides = s.strides();
            (0..ndim)
                .map(|d| {
                    if d < pad || s.dims()[d - pad] == 1 {
                        0
                    } else {
                        strides[d - pad]
                    }
                })
                .collect()
        };
        let a_strides = operand_strides(&self.shape);
        let b_strides = operand_strides(&other.shape);

        let mut data = Vec::with_capacity(out_shape.numel());
        for flat_idx in 0..out_shape.numel() {
            let mut remaining = flat_idx;
            let mut a_offset = 0usize;
            let mut b_offset = 0usize;
            for d in 0..ndim {
                let idx = remaining / out_strides[d];
                remaining %= out_strides[d];
                a_offset += idx * a_strides[d];
                b_offset += idx * b_strides[d];
            }
            data.push(op(self.data[a_offset], other.data[b_offset]));
        }

        Ok(Tensor {
            data,
            shape: out_shape,
        })
    }

    pub fn add(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.broadcast_binary_op(other, |a, b| a + b)
    }

    pub fn mul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.broadcast_binary_op(other, |a, b| a * b)
    }

    // ─── Reductions ─────────────────────────────────────────────────────────

    pub fn sum_all(&self) -> T {
        self.data.iter().copied().sum()
    }

    pub fn max_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::max)
            .ok_or(TensorError::EmptyTensor)
    }

    pub fn min_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::min)
            .ok_or(TensorError::EmptyTensor)
    }
}

impl<T: Float> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

impl<T: Float> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor([")?;
        for (i, v) in self.data.iter().take(8).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", v)?;
        }
        if self.numel() > 8 {
            write!(f, ", ...")?;
        }
        write!(f, "], shape={})", self.shape)
    }
}
