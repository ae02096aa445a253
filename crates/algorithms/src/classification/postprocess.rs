//! Post-classification filtering and masking

use crate::imagery::{band_math, build_output, check_dimensions};
use crate::maybe_rayon::*;
use crate::statistics::{FocalParams, focal_statistics};
use covermap_core::{Raster, Result};
use tracing::debug;

/// Add `offset` to every labelled pixel
pub fn shift_labels(classes: &Raster<f64>, offset: f64) -> Result<Raster<f64>> {
    band_math(classes, |v| v + offset)
}

/// 3x3 mode filter; ties go to the smaller label
pub fn majority_filter(classes: &Raster<f64>) -> Result<Raster<f64>> {
    focal_statistics(classes, FocalParams::mode3x3())
}

/// Keep pixels where `mask` equals exactly 1, mask the rest.
///
/// The land/water dataset codes land as 1; water, no-data and NaN are masked.
pub fn apply_land_mask(classes: &Raster<f64>, mask: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(classes, mask)?;
    let (rows, cols) = classes.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if unsafe { mask.get_unchecked(row, col) } == 1.0 {
                    *out = unsafe { classes.get_unchecked(row, col) };
                }
            }
            row_data
        })
        .collect();

    build_output(classes, rows, cols, data)
}

/// Byte class map with 0 for masked pixels
pub fn to_u8(classes: &Raster<f64>) -> Raster<u8> {
    let mut out = classes.map(|v| {
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, 255.0) as u8
        }
    });
    out.set_nodata(Some(0));
    out
}

/// Shift, mode-filter and land-mask a raw class map.
///
/// Labels `0..=4` become `1..=5`; masked pixels and water are 0 in the
/// returned byte raster.
pub fn postprocess(classes: &Raster<f64>, land_mask: &Raster<f64>) -> Result<Raster<u8>> {
    let shifted = shift_labels(classes, 1.0)?;
    let filtered = majority_filter(&shifted)?;
    let masked = apply_land_mask(&filtered, land_mask)?;
    debug!(
        "Post-processing kept {} of {} pixels",
        masked.valid_count(),
        masked.len()
    );
    Ok(to_u8(&masked))
}
