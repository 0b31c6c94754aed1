use mirabest_core::{Float, Tensor};

use crate::image::RawImage;

/// Convert an interleaved `H × W × C` byte image into a `[C, H, W]` tensor
/// with values scaled onto `[0, 1]`.
pub fn to_tensor<T: Float>(image: &RawImage) -> Tensor<T> {
    let (h, w, ch) = (image.height(), image.width(), image.channels());
    Tensor::from_fn(vec![ch, h, w], |idx| {
        T::from_pixel(image.pixel(idx[1], idx[2], idx[0]))
    })
}
