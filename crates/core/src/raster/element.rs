//! Cell value trait for generic grids

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Elevation stored in a cell that received no contributing soundings.
pub const NULL_ELEVATION: f32 = 1_000_000.0;

/// Uncertainty stored in a cell when it was not requested or not available.
pub const NULL_UNCERTAINTY: f32 = 1_000_000.0;

/// Trait for types that can be stored in a grid cell.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value a freshly allocated grid of this type is filled with
    fn null_value() -> Self;

    /// Check if this value represents "no data" under the given sentinel
    fn is_null(&self, null: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn null_value() -> Self {
                0
            }

            fn is_null(&self, null: Option<Self>) -> bool {
                null.is_some_and(|n| *self == n)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty, $null:expr) => {
        impl RasterElement for $t {
            fn null_value() -> Self {
                $null
            }

            fn is_null(&self, null: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                null.is_some_and(|n| *self == n)
            }
        }
    };
}

impl_raster_element_int!(u8);
impl_raster_element_float!(f32, NULL_ELEVATION);
impl_raster_element_float!(f64, NULL_ELEVATION as f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_null() {
        assert!(NULL_ELEVATION.is_null(Some(NULL_ELEVATION)));
        assert!(f32::NAN.is_null(None));
        assert!(!(-12.5f32).is_null(Some(NULL_ELEVATION)));
    }

    #[test]
    fn test_int_null_requires_sentinel() {
        assert!(!0u8.is_null(None));
        assert!(0u8.is_null(Some(0)));
    }
}
