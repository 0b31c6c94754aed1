pub mod image;
pub mod rotation;
pub mod to_tensor;
pub mod circle_crop;
pub mod compose;

pub use image::*;
pub use rotation::*;
pub use to_tensor::*;
pub use circle_crop::*;
pub use compose::*;
