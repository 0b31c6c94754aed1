use mirabest_core::{Float, Tensor, TensorResult};

use crate::compose::TensorTransform;

/// Zero every pixel outside the largest circle that fits inside a square image.
///
/// Pixel coordinates are normalized to `[-1, 1]` on both axes and the radius
/// grid is divided by its maximum (the corner radius). Pixels with normalized
/// radius strictly below `0.5` are kept; the boundary `0.5` itself is masked.
///
/// Accepts `[H, W]` or `[C, H, W]`. The same mask is applied to every channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleCrop;

/// Normalized radius threshold; pixels at or beyond it are zeroed.
pub const CROP_RADIUS: f64 = 0.5;

impl CircleCrop {
    pub fn new() -> Self {
        CircleCrop
    }

    pub fn crop<T: Float>(&self, image: &Tensor<T>) -> TensorResult<Tensor<T>> {
        let side = image.shape().square_side()?;
        let mask = circle_mask::<T>(side);
        let mask = if image.ndim() == 3 {
            mask.unsqueeze(0)?
        } else {
            mask
        };
        image.mul(&mask)
    }
}

impl TensorTransform for CircleCrop {
    fn apply(&self, image: Tensor<f32>) -> TensorResult<Tensor<f32>> {
        self.crop(&image)
    }
}

/// Per-pixel radius of a `side × side` grid, normalized so the corners are 1.
pub fn normalized_radius<T: Float>(side: usize) -> Tensor<T> {
    let center = T::from_usize(side.saturating_sub(1)) / T::TWO;
    let coord = |i: usize| {
        if center == T::ZERO {
            T::ZERO
        } else {
            (T::from_usize(i) - center) / center
        }
    };

    let radius = Tensor::from_fn(vec![side, side], |idx| {
        let x = coord(idx[1]);
        let y = coord(idx[0]);
        (x * x + y * y).sqrt()
    });

    match radius.max_all() {
        Ok(max) if max > T::ZERO => radius.apply(|r| r / max),
        _ => radius,
    }
}

/// `[side, side]` mask of ones inside the crop circle and zeros outside.
pub fn circle_mask<T: Float>(side: usize) -> Tensor<T> {
    let threshold = T::from_f64(CROP_RADIUS);
    normalized_radius::<T>(side).apply(|r| if r < threshold { T::ONE } else { T::ZERO })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirabest_core::TensorError;

    #[test]
    fn test_center_kept_corners_zeroed() {
        let img: Tensor<f32> = Tensor::ones(vec![1, 150, 150]);
        let out = CircleCrop.crop(&img).unwrap();
        assert_eq!(out.shape_vec(), vec![1, 150, 150]);
        assert_eq!(out.get(&[0, 75, 75]).unwrap(), 1.0);
        assert_eq!(out.get(&[0, 74, 74]).unwrap(), 1.0);
        assert_eq!(out.get(&[0, 0, 0]).unwrap(), 0.0);
        assert_eq!(out.get(&[0, 149, 0]).unwrap(), 0.0);
        // Edge midpoints sit at normalized radius ~0.707.
        assert_eq!(out.get(&[0, 75, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_mask_follows_radius_rule() {
        for side in [2usize, 9, 10, 150] {
            let radius = normalized_radius::<f64>(side);
            let img: Tensor<f64> = Tensor::full(vec![side, side], 0.75);
            let out = CircleCrop.crop(&img).unwrap();
            for (r, v) in radius.data().iter().zip(out.data()) {
                if *r < CROP_RADIUS {
                    assert_eq!(*v, 0.75);
                } else {
                    assert_eq!(*v, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_exact_boundary_is_masked() {
        // side 5: center 2, pixel (3, 3) has coordinates (0.5, 0.5) and
        // normalized radius sqrt(0.5) / sqrt(2) == 0.5 exactly.
        let radius = normalized_radius::<f32>(5);
        assert_eq!(radius.get(&[3, 3]).unwrap(), 0.5);
        assert_eq!(radius.get(&[1, 1]).unwrap(), 0.5);

        let img: Tensor<f32> = Tensor::ones(vec![1, 5, 5]);
        let out = CircleCrop.crop(&img).unwrap();
        assert_eq!(out.get(&[0, 3, 3]).unwrap(), 0.0);
        assert_eq!(out.get(&[0, 1, 3]).unwrap(), 0.0);
        assert_eq!(out.get(&[0, 2, 2]).unwrap(), 1.0);
        assert_eq!(out.get(&[0, 2, 3]).unwrap(), 1.0);
    }

    #[test]
    fn test_idempotent() {
        let data: Vec<f32> = (0..3 * 12 * 12).map(|i| (i % 17) as f32 / 17.0).collect();
        let img = Tensor::new(data, vec![3, 12, 12]).unwrap();
        let once = CircleCrop.crop(&img).unwrap();
        let twice = CircleCrop.crop(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_mask_broadcast_across_channels() {
        let img: Tensor<f32> = Tensor::ones(vec![3, 8, 8]);
        let out = CircleCrop.crop(&img).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                let first = out.get(&[0, row, col]).unwrap();
                assert_eq!(out.get(&[1, row, col]).unwrap(), first);
                assert_eq!(out.get(&[2, row, col]).unwrap(), first);
            }
        }
    }

    #[test]
    fn test_non_square_rejected() {
        let img: Tensor<f32> = Tensor::ones(vec![1, 150, 100]);
        assert_eq!(
            CircleCrop.crop(&img),
            Err(TensorError::NotSquare {
                height: 150,
                width: 100
            })
        );
        let batch: Tensor<f32> = Tensor::ones(vec![2, 1, 4, 4]);
        assert!(matches!(
            CircleCrop.crop(&batch),
            Err(TensorError::InvalidRank { got: 4, .. })
        ));
    }

    #[test]
    fn test_single_pixel_kept() {
        let img: Tensor<f64> = Tensor::full(vec![1, 1, 1], 0.3);
        assert_eq!(CircleCrop.crop(&img).unwrap().data(), &[0.3]);
    }
}
