use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Scalar types an image tensor can hold. Implemented for `f32` and `f64`.
pub trait Float:
    Copy
    + Default
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Sum
    + Serialize
    + for<'de> Deserialize<'de>
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;

    fn from_f64(v: f64) -> Self;
    fn from_usize(v: usize) -> Self;

    /// Map a raw 8-bit pixel onto `[0, 1]`.
    fn from_pixel(v: u8) -> Self {
        Self::from_f64(v as f64 / 255.0)
    }

    fn sqrt(self) -> Self;
    fn max(self, other: Self) -> Self;
    fn min(self, other: Self) -> Self;
}

macro_rules! impl_float {
    ($t:ident) => {
        impl Float for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const TWO: Self = 2.0;

            #[inline] fn from_f64(v: f64) -> Self { v as $t }
            #[inline] fn from_usize(v: usize) -> Self { v as $t }
            #[inline] fn sqrt(self) -> Self { $t::sqrt(self) }
            #[inline] fn max(self, other: Self) -> Self { $t::max(self, other) }
            #[inline] fn min(self, other: Self) -> Self { $t::min(self, other) }
        }
    };
}

impl_float!(f32);
impl_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixel_range() {
        assert_eq!(<f32 as Float>::from_pixel(0), 0.0);
        assert_eq!(<f32 as Float>::from_pixel(255), 1.0);
        assert!((<f64 as Float>::from_pixel(51) - 0.2).abs() < 1e-12);
    }
}
