//! Per-pixel median compositing of scene stacks

use super::band_math::build_output;
use super::cloud_mask::clear_sky_mask;
use super::sensor::{CANONICAL_BANDS, OpticalSensor};
use crate::maybe_rayon::*;
use covermap_core::{BandStack, Error, Raster, Result};
use ndarray::{Array2, ArrayView2};
use tracing::{debug, info};

/// Median of a slice, averaging the two middle values for even lengths.
///
/// Returns NaN for an empty slice. The slice is reordered.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Per-pixel median across scenes of every band of the first scene.
///
/// A pixel of scene `i` contributes only where `masks[i]` is `true` (all
/// pixels when `masks` is `None`) and the value is not NaN. Pixels with no
/// contributing observation are NaN.
pub fn median_composite(scenes: &[BandStack], masks: Option<&[Array2<bool>]>) -> Result<BandStack> {
    let first = scenes
        .first()
        .ok_or_else(|| Error::Algorithm("cannot composite an empty collection".into()))?;
    let (rows, cols) = first.shape();

    if let Some(masks) = masks
        && masks.len() != scenes.len()
    {
        return Err(Error::InvalidParameter {
            name: "masks",
            value: masks.len().to_string(),
            reason: format!("expected one mask per scene ({})", scenes.len()),
        });
    }

    let mut out = BandStack::new();
    for (b, name) in first.names().iter().enumerate() {
        let bands: Vec<&Raster<f64>> = scenes
            .iter()
            .map(|s| {
                let band = s.band(name)?;
                if band.shape() != (rows, cols) {
                    let (ar, ac) = band.shape();
                    return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
                }
                Ok(band)
            })
            .collect::<Result<_>>()?;
        let mask_views: Option<Vec<ArrayView2<'_, bool>>> =
            masks.map(|m| m.iter().map(|a| a.view()).collect());

        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                let mut stack = Vec::with_capacity(bands.len());
                for (col, out) in row_data.iter_mut().enumerate() {
                    stack.clear();
                    for (i, band) in bands.iter().enumerate() {
                        if let Some(views) = &mask_views
                            && !views[i][[row, col]]
                        {
                            continue;
                        }
                        let v = unsafe { band.get_unchecked(row, col) };
                        if !v.is_nan() {
                            stack.push(v);
                        }
                    }
                    *out = median(&mut stack);
                }
                row_data
            })
            .collect();

        let composite = build_output(&first.bands()[b], rows, cols, data)?;
        out.add_band(name.as_str(), composite)?;
    }
    Ok(out)
}

/// Cloud-masked median reflectance composite.
///
/// Each scene is renamed from the sensor's band names to [`CANONICAL_BANDS`],
/// masked with [`clear_sky_mask`], then reduced per pixel by the median.
pub fn optical_composite(scenes: &[BandStack], sensor: &OpticalSensor) -> Result<BandStack> {
    sensor.validate()?;
    if scenes.is_empty() {
        return Err(Error::Algorithm(format!("no {} scenes to composite", sensor.name)));
    }

    let canonical: Vec<BandStack> = scenes
        .iter()
        .map(|s| s.select_as(sensor.source_bands.as_slice(), &CANONICAL_BANDS))
        .collect::<Result<_>>()?;

    let masks: Vec<Array2<bool>> = canonical
        .iter()
        .map(clear_sky_mask)
        .collect::<Result<_>>()?;
    for (i, m) in masks.iter().enumerate() {
        debug!("scene {}: {} clear pixels", i, m.iter().filter(|v| **v).count());
    }

    let composite = median_composite(&canonical, Some(&masks))?;
    info!("{} composite from {} scenes", sensor.name, scenes.len());
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l8_scene(blue: f64, red: f64, nir: f64) -> BandStack {
        let values = [("B2", blue), ("B3", 0.06), ("B4", red), ("B5", nir), ("B6", 0.15), ("B7", 0.08)];
        BandStack::from_bands(values.map(|(n, v)| (n, Raster::filled(2, 2, v)))).unwrap()
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&mut []).is_nan());
    }

    #[test]
    fn test_median_composite_respects_masks() {
        let a = BandStack::from_bands([("x", Raster::filled(1, 2, 1.0))]).unwrap();
        let b = BandStack::from_bands([("x", Raster::filled(1, 2, 5.0))]).unwrap();
        let masks = [
            Array2::from_shape_vec((1, 2), vec![true, false]).unwrap(),
            Array2::from_shape_vec((1, 2), vec![true, false]).unwrap(),
        ];
        let out = median_composite(&[a, b], Some(&masks)).unwrap();
        assert_relative_eq!(out.band("x").unwrap().get(0, 0).unwrap(), 3.0);
        assert!(out.band("x").unwrap().get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_landsat8_renamed_and_cloud_dropped() {
        let clear1 = l8_scene(0.03, 0.04, 0.28);
        let clear2 = l8_scene(0.05, 0.04, 0.30);
        let cloudy = l8_scene(0.35, 0.30, 0.32);

        let out = optical_composite(&[clear1, cloudy, clear2], &OpticalSensor::landsat8()).unwrap();
        assert_eq!(out.names(), CANONICAL_BANDS);
        // B1 is the median of the two clear blue values
        assert_relative_eq!(out.band("B1").unwrap().get(1, 1).unwrap(), 0.04);
        assert_relative_eq!(out.band("B5").unwrap().get(0, 0).unwrap(), 0.15);
    }

    #[test]
    fn test_all_cloudy_gives_nan() {
        let cloudy = l8_scene(0.35, 0.30, 0.32);
        let out = optical_composite(&[cloudy], &OpticalSensor::landsat8()).unwrap();
        assert!(out.band("B4").unwrap().get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_empty_collection_is_error() {
        assert!(optical_composite(&[], &OpticalSensor::landsat5_7()).is_err());
    }
}
