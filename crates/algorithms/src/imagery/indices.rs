//! Spectral indices over canonical Landsat reflectance bands
//!
//! Band roles: B1 blue, B3 red, B4 NIR, B5 SWIR1, B7 SWIR2.

use super::band_math::band_math_n;
use covermap_core::raster::Raster;
use covermap_core::{BandStack, Result};

/// Names of the index bands, in feature-stack order
pub const INDEX_BANDS: [&str; 5] = ["EVI", "LSWI", "NDTI", "NDVI", "SATVI"];

/// Normalized difference `(a - b) / (a + b)`.
///
/// Pixels where the sum vanishes or either band is nodata are NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_math_n([band_a, band_b], |[a, b]| {
        let sum = a + b;
        if sum.abs() < 1e-10 { f64::NAN } else { (a - b) / sum }
    })
}

/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// Land Surface Water Index, `(NIR - SWIR1) / (NIR + SWIR1)`
pub fn lswi(nir: &Raster<f64>, swir1: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, swir1)
}

/// Normalized Difference Tillage Index, `(SWIR1 - SWIR2) / (SWIR1 + SWIR2)`
pub fn ndti(swir1: &Raster<f64>, swir2: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(swir1, swir2)
}

/// Parameters for EVI
#[derive(Debug, Clone)]
pub struct EviParams {
    /// Gain factor (default: 2.5)
    pub g: f64,
    /// Aerosol coefficient for red band (default: 6.0)
    pub c1: f64,
    /// Aerosol coefficient for blue band (default: 7.5)
    pub c2: f64,
    /// Canopy background adjustment (default: 1.0)
    pub l: f64,
}

impl Default for EviParams {
    fn default() -> Self {
        Self {
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
            l: 1.0,
        }
    }
}

/// Enhanced Vegetation Index
///
/// `EVI = G * (NIR - Red) / (NIR + C1 * Red - C2 * Blue + L)`
pub fn evi(
    nir: &Raster<f64>,
    red: &Raster<f64>,
    blue: &Raster<f64>,
    params: EviParams,
) -> Result<Raster<f64>> {
    band_math_n([nir, red, blue], |[n, r, b]| {
        let denom = n + params.c1 * r - params.c2 * b + params.l;
        if denom.abs() < 1e-10 {
            f64::NAN
        } else {
            params.g * (n - r) / denom
        }
    })
}

/// Parameters for SATVI
#[derive(Debug, Clone)]
pub struct SatviParams {
    /// Soil brightness correction (default: 0.1)
    pub l: f64,
}

impl Default for SatviParams {
    fn default() -> Self {
        Self { l: 0.1 }
    }
}

/// Soil-Adjusted Total Vegetation Index
///
/// `SATVI = ((SWIR1 - Red) / (SWIR1 + Red + L)) * (1 + L - SWIR2 / 2)`
pub fn satvi(
    swir1: &Raster<f64>,
    red: &Raster<f64>,
    swir2: &Raster<f64>,
    params: SatviParams,
) -> Result<Raster<f64>> {
    band_math_n([swir1, red, swir2], |[s1, r, s2]| {
        let denom = s1 + r + params.l;
        if denom.abs() < 1e-10 {
            f64::NAN
        } else {
            ((s1 - r) / denom) * (1.0 + params.l - s2 / 2.0)
        }
    })
}

/// All five index bands of a canonical optical composite, named per [`INDEX_BANDS`].
pub fn spectral_indices(optical: &BandStack) -> Result<BandStack> {
    let blue = optical.band("B1")?;
    let red = optical.band("B3")?;
    let nir = optical.band("B4")?;
    let swir1 = optical.band("B5")?;
    let swir2 = optical.band("B7")?;

    BandStack::from_bands([
        ("EVI", evi(nir, red, blue, EviParams::default())?),
        ("LSWI", lswi(nir, swir1)?),
        ("NDTI", ndti(swir1, swir2)?),
        ("NDVI", ndvi(nir, red)?),
        ("SATVI", satvi(swir1, red, swir2, SatviParams::default())?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use covermap_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(4, 4, value);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        r
    }

    fn composite(b1: f64, b3: f64, b4: f64, b5: f64, b7: f64) -> BandStack {
        BandStack::from_bands([
            ("B1", make_band(b1)),
            ("B2", make_band(0.05)),
            ("B3", make_band(b3)),
            ("B4", make_band(b4)),
            ("B5", make_band(b5)),
            ("B7", make_band(b7)),
        ])
        .unwrap()
    }

    #[test]
    fn test_ndvi_vegetation() {
        let out = ndvi(&make_band(0.5), &make_band(0.1)).unwrap();
        assert_relative_eq!(out.get(2, 2).unwrap(), 0.4 / 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_normalized_difference_zero_sum_is_nan() {
        let out = normalized_difference(&make_band(0.0), &make_band(0.0)).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_evi_formula() {
        let out = evi(&make_band(0.4), &make_band(0.1), &make_band(0.05), EviParams::default()).unwrap();
        let expected = 2.5 * 0.3 / (0.4 + 0.6 - 0.375 + 1.0);
        assert_relative_eq!(out.get(0, 0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_satvi_formula() {
        let out = satvi(&make_band(0.3), &make_band(0.1), &make_band(0.2), SatviParams::default()).unwrap();
        let expected = (0.2 / 0.5) * (1.1 - 0.1);
        assert_relative_eq!(out.get(0, 0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_spectral_indices_band_order() {
        let c = composite(0.03, 0.04, 0.3, 0.15, 0.08);
        let idx = spectral_indices(&c).unwrap();
        assert_eq!(idx.names(), INDEX_BANDS);
        assert_relative_eq!(idx.band("LSWI").unwrap().get(0, 0).unwrap(), 0.15 / 0.45, epsilon = 1e-12);
        assert_relative_eq!(idx.band("NDTI").unwrap().get(0, 0).unwrap(), 0.07 / 0.23, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        let mut nir = make_band(0.3);
        nir.set(1, 1, f64::NAN).unwrap();
        let out = lswi(&nir, &make_band(0.1)).unwrap();
        assert!(out.get(1, 1).unwrap().is_nan());
        assert!(!out.get(0, 0).unwrap().is_nan());
    }
}
