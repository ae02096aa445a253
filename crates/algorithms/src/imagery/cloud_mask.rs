//! Per-scene validity masks for top-of-atmosphere reflectance
//!
//! All masks take a scene with canonical band names (`B1`..`B7`) and return
//! `true` where the pixel is kept. They are combined with logical AND.

use super::band_math::band_test;
use covermap_core::{BandStack, Result};
use ndarray::Array2;

/// Blue reflectance at or above which a pixel is treated as cloud or haze
pub const BRIGHTNESS_THRESHOLD: f64 = 0.2;

/// Keep pixels where all six reflective bands are strictly positive.
pub fn positivity_mask(scene: &BandStack) -> Result<Array2<bool>> {
    band_test(
        [
            scene.band("B1")?,
            scene.band("B2")?,
            scene.band("B3")?,
            scene.band("B4")?,
            scene.band("B5")?,
            scene.band("B7")?,
        ],
        |v| v.iter().all(|&x| x > 0.0),
    )
}

/// Keep pixels whose blue reflectance is below [`BRIGHTNESS_THRESHOLD`].
pub fn brightness_mask(scene: &BandStack) -> Result<Array2<bool>> {
    band_test([scene.band("B1")?], |[blue]| blue < BRIGHTNESS_THRESHOLD)
}

/// Spectral test separating cloud from vegetation and soil.
///
/// With `ndvi = (B4 - B3) / (B4 + B3)` and `ratio = B3 / B7` a pixel is kept
/// when `(ndvi < 0.6 && ratio < 1.0) || (ndvi >= 0.6 && ratio < 2.5) || ndvi < 0.125`.
pub fn spectral_cloud_mask(scene: &BandStack) -> Result<Array2<bool>> {
    band_test(
        [scene.band("B3")?, scene.band("B4")?, scene.band("B7")?],
        |[red, nir, swir2]| spectral_clear(red, nir, swir2),
    )
}

#[inline]
pub(crate) fn spectral_clear(red: f64, nir: f64, swir2: f64) -> bool {
    let ndvi = (nir - red) / (nir + red);
    let ratio = red / swir2;
    (ndvi < 0.6 && ratio < 1.0) || (ndvi >= 0.6 && ratio < 2.5) || ndvi < 0.125
}

/// AND of the positivity, brightness and spectral masks
pub fn clear_sky_mask(scene: &BandStack) -> Result<Array2<bool>> {
    let mut mask = positivity_mask(scene)?;
    mask.zip_mut_with(&brightness_mask(scene)?, |m, b| *m &= *b);
    mask.zip_mut_with(&spectral_cloud_mask(scene)?, |m, s| *m &= *s);
    Ok(mask)
}
