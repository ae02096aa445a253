//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can be stored in a raster cell.
///
/// Reflectance, backscatter and features are `f64` with NaN as the mask;
/// class maps are exported as `u8` with 0 as the mask.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty, $nodata:expr) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                $nodata
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.is_some_and(|nd| *self == nd)
            }

            fn is_float() -> bool {
                false
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }

            fn is_float() -> bool {
                true
            }
        }
    };
}

// Unsigned class maps reserve 0 for masked pixels.
impl_raster_element_int!(u8, 0);
impl_raster_element_int!(u16, 0);
impl_raster_element_int!(i16, i16::MIN);
impl_raster_element_int!(i32, i32::MIN);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nan_is_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(!1.0f64.is_nodata(None));
        assert!((-9999.0f32).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_u8_nodata_is_zero() {
        assert_eq!(u8::default_nodata(), 0);
        assert!(0u8.is_nodata(Some(0)));
        assert!(!3u8.is_nodata(Some(0)));
        assert!(!0u8.is_nodata(None));
    }
}
