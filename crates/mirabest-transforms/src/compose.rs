use mirabest_core::{Tensor, TensorResult};
use rand::RngCore;

use crate::circle_crop::CircleCrop;
use crate::image::RawImage;
use crate::rotation::RandomRotation;
use crate::to_tensor::to_tensor;

/// A transform applied to the raw byte image, before tensor conversion.
///
/// Random transforms draw from the generator passed in; deterministic ones
/// ignore it.
pub trait ImageTransform: Send + Sync {
    fn apply(&self, image: RawImage, rng: &mut dyn RngCore) -> TensorResult<RawImage>;
}

/// A transform applied to the converted `[C, H, W]` tensor.
pub trait TensorTransform: Send + Sync {
    fn apply(&self, image: Tensor<f32>) -> TensorResult<Tensor<f32>>;
}

/// A per-image pipeline: image transforms, then tensor conversion, then
/// tensor transforms, each stage in insertion order.
pub struct Compose {
    image_steps: Vec<Box<dyn ImageTransform>>,
    tensor_steps: Vec<Box<dyn TensorTransform>>,
}

impl Compose {
    /// Conversion only.
    pub fn new() -> Self {
        Compose {
            image_steps: Vec::new(),
            tensor_steps: Vec::new(),
        }
    }

    /// Training pipeline: random rotation in `[-180°, 180°)`, conversion,
    /// circular crop.
    pub fn train() -> Self {
        Compose::new()
            .add_image_transform(Box::new(RandomRotation::new(180.0)))
            .add_tensor_transform(Box::new(CircleCrop))
    }

    /// Evaluation pipeline: conversion and circular crop, no augmentation.
    pub fn eval() -> Self {
        Compose::new().add_tensor_transform(Box::new(CircleCrop))
    }

    pub fn add_image_transform(mut self, step: Box<dyn ImageTransform>) -> Self {
        self.image_steps.push(step);
        self
    }

    pub fn add_tensor_transform(mut self, step: Box<dyn TensorTransform>) -> Self {
        self.tensor_steps.push(step);
        self
    }

    /// Whether any step draws from the generator.
    pub fn is_random(&self) -> bool {
        !self.image_steps.is_empty()
    }

    pub fn apply(&self, image: &RawImage, rng: &mut dyn RngCore) -> TensorResult<Tensor<f32>> {
        let mut tensor = if self.image_steps.is_empty() {
            to_tensor(image)
        } else {
            let mut current = image.clone();
            for step in &self.image_steps {
                current = step.apply(current, rng)?;
            }
            to_tensor(&current)
        };

        for step in &self.tensor_steps {
            tensor = step.apply(tensor)?;
        }
        Ok(tensor)
    }
}

impl Default for Compose {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bright(side: usize) -> RawImage {
        RawImage::grayscale(vec![255; side * side], side, side).unwrap()
    }

    #[test]
    fn test_eval_pipeline_is_deterministic() {
        let pipeline = Compose::eval();
        let img = RawImage::grayscale((0..100).map(|i| (i * 2) as u8).collect(), 10, 10).unwrap();
        let a = pipeline.apply(&img, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = pipeline.apply(&img, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.shape_vec(), vec![1, 10, 10]);
        assert_eq!(a.get(&[0, 0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_train_pipeline_masks_after_rotation() {
        let pipeline = Compose::train();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let out = pipeline.apply(&bright(20), &mut rng).unwrap();
            // A uniform image stays uniform inside the circle under any rotation.
            assert_eq!(out, CircleCrop.crop(&Tensor::<f32>::ones(vec![1, 20, 20])).unwrap());
        }
    }

    #[test]
    fn test_train_pipeline_seeded() {
        let pipeline = Compose::train();
        let img = RawImage::grayscale((0..=255).collect(), 16, 16).unwrap();
        let a = pipeline.apply(&img, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = pipeline.apply(&img, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plain_conversion() {
        let pipeline = Compose::new();
        assert!(!pipeline.is_random());
        assert!(Compose::train().is_random());
        let out = pipeline.apply(&bright(4), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.sum_all(), 16.0);
    }

    #[test]
    fn test_non_square_image_fails_in_crop() {
        let img = RawImage::grayscale(vec![1; 150 * 100], 150, 100).unwrap();
        assert!(Compose::eval()
            .apply(&img, &mut StdRng::seed_from_u64(0))
            .is_err());
    }
}
