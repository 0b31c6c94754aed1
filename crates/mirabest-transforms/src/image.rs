use mirabest_core::{TensorError, TensorResult};

/// An 8-bit image as stored on disk: `height × width × channels`, row-major,
/// channels interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub(crate) pixels: Vec<u8>,
    pub(crate) height: usize,
    pub(crate) width: usize,
    pub(crate) channels: usize,
}

impl RawImage {
    pub fn new(pixels: Vec<u8>, height: usize, width: usize, channels: usize) -> TensorResult<Self> {
        let expected = height * width * channels;
        if pixels.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected: vec![height, width, channels],
                got: vec![pixels.len()],
            });
        }
        Ok(RawImage {
            pixels,
            height,
            width,
            channels,
        })
    }

    /// Single-channel image.
    pub fn grayscale(pixels: Vec<u8>, height: usize, width: usize) -> TensorResult<Self> {
        Self::new(pixels, height, width, 1)
    }

    /// All-black image of the given geometry.
    pub fn blank(height: usize, width: usize, channels: usize) -> Self {
        RawImage {
            pixels: vec![0; height * width * channels],
            height,
            width,
            channels,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Value at `(row, col, channel)`. Panics when out of range.
    pub fn pixel(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.pixels[(row * self.width + col) * self.channels + channel]
    }

    /// The `channels` values of one pixel.
    pub fn pixel_slice(&self, row: usize, col: usize) -> &[u8] {
        let start = (row * self.width + col) * self.channels;
        &self.pixels[start..start + self.channels]
    }
}
