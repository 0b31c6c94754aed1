use rand::{Rng, RngCore};

use crate::compose::ImageTransform;
use crate::image::RawImage;
use mirabest_core::TensorResult;

/// Rotate by an angle drawn uniformly from `[-degrees, degrees)`.
///
/// Rotation is counter-clockwise for positive angles, about the pixel-grid
/// center, with nearest-neighbour resampling. Pixels that map from outside
/// the source image are filled with 0.
#[derive(Debug, Clone)]
pub struct RandomRotation {
    degrees: f64,
}

impl RandomRotation {
    pub fn new(degrees: f64) -> Self {
        RandomRotation {
            degrees: degrees.abs(),
        }
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// Draw one rotation angle in degrees.
    pub fn sample_angle(&self, rng: &mut dyn RngCore) -> f64 {
        if self.degrees == 0.0 {
            return 0.0;
        }
        rng.gen_range(-self.degrees..self.degrees)
    }
}

impl ImageTransform for RandomRotation {
    fn apply(&self, image: RawImage, rng: &mut dyn RngCore) -> TensorResult<RawImage> {
        let angle = self.sample_angle(rng);
        Ok(rotate(&image, angle))
    }
}

/// Rotate `image` counter-clockwise by `degrees`.
pub fn rotate(image: &RawImage, degrees: f64) -> RawImage {
    let (h, w, ch) = (image.height(), image.width(), image.channels());
    if degrees == 0.0 || h == 0 || w == 0 {
        return image.clone();
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;

    let mut out = vec![0u8; h * w * ch];
    for row in 0..h {
        for col in 0..w {
            // Output coordinates relative to the center, y pointing up.
            let u = col as f64 - cx;
            let v = cy - row as f64;
            let src_col = (cos * u + sin * v + cx).round();
            let src_row = (cy - (-sin * u + cos * v)).round();
            if src_col < 0.0 || src_row < 0.0 || src_col >= w as f64 || src_row >= h as f64 {
                continue;
            }
            let dst = (row * w + col) * ch;
            out[dst..dst + ch].copy_from_slice(image.pixel_slice(src_row as usize, src_col as usize));
        }
    }

    RawImage {
        pixels: out,
        height: h,
        width: w,
        channels: ch,
    }
}
