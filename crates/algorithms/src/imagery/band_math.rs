//! Per-pixel raster algebra over co-registered bands
//!
//! Every kernel in this crate that combines bands pixel by pixel goes
//! through these helpers so masking is uniform: NaN in any input gives
//! NaN in the output.

use crate::maybe_rayon::*;
use covermap_core::raster::Raster;
use covermap_core::{Error, Result};
use ndarray::Array2;

/// Apply a unary function to every cell in a raster.
///
/// Nodata cells (NaN) are preserved.
///
/// ```ignore
/// let scaled = band_math(&hh, |v| (v * 1000.0).trunc())?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    band_math_n([raster], |[v]| f(v))
}

/// Combine `N` bands cell by cell.
///
/// All bands must share one shape. A cell where any input is nodata is NaN;
/// otherwise the result of `f`, which may itself return NaN to mask.
pub fn band_math_n<const N: usize, F>(bands: [&Raster<f64>; N], f: F) -> Result<Raster<f64>>
where
    F: Fn([f64; N]) -> f64 + Sync + Send,
{
    let template = first(&bands)?;
    let (rows, cols) = template.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if let Some(values) = read_cell(&bands, row, col) {
                    *out = f(values);
                }
            }
            row_data
        })
        .collect();

    build_output(template, rows, cols, data)
}

/// Evaluate a predicate cell by cell. Cells with nodata inputs are `false`.
pub fn band_test<const N: usize, F>(bands: [&Raster<f64>; N], f: F) -> Result<Array2<bool>>
where
    F: Fn([f64; N]) -> bool + Sync + Send,
{
    let template = first(&bands)?;
    let (rows, cols) = template.shape();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                *out = read_cell(&bands, row, col).is_some_and(&f);
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

fn first<'a, const N: usize>(bands: &[&'a Raster<f64>; N]) -> Result<&'a Raster<f64>> {
    let template = *bands
        .first()
        .ok_or_else(|| Error::Algorithm("band math needs at least one band".into()))?;
    for b in &bands[1..] {
        check_dimensions(template, b)?;
    }
    Ok(template)
}

#[inline]
fn read_cell<const N: usize>(bands: &[&Raster<f64>; N], row: usize, col: usize) -> Option<[f64; N]> {
    let mut values = [0.0; N];
    for (v, band) in values.iter_mut().zip(bands) {
        // Shapes were checked by `first`
        *v = unsafe { band.get_unchecked(row, col) };
        if is_nodata_f64(*v, band.nodata()) {
            return None;
        }
    }
    Some(values)
}

pub(crate) fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

pub(crate) fn check_dimensions<T, U>(a: &Raster<T>, b: &Raster<U>) -> Result<()>
where
    T: covermap_core::RasterElement,
    U: covermap_core::RasterElement,
{
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

/// Wrap row-major output data in a raster georeferenced like `template`
pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use covermap_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(3, 3, value);
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_band_math_preserves_nan() {
        let mut band = make_band(2.0);
        band.set(1, 1, f64::NAN).unwrap();
        let out = band_math(&band, |v| v * 10.0).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 20.0);
        assert!(out.get(1, 1).unwrap().is_nan());
        assert_eq!(out.transform().origin_y, 3.0);
    }

    #[test]
    fn test_band_math_n_combines() {
        let (a, b, c) = (make_band(1.0), make_band(2.0), make_band(4.0));
        let out = band_math_n([&a, &b, &c], |[x, y, z]| x + y * z).unwrap();
        assert_eq!(out.get(2, 2).unwrap(), 9.0);
    }

    #[test]
    fn test_band_math_n_rejects_mismatch() {
        let a = make_band(1.0);
        let b = Raster::filled(2, 3, 1.0);
        assert!(matches!(
            band_math_n([&a, &b], |[x, y]| x + y),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_band_test_nodata_is_false() {
        let mut a = make_band(0.5);
        a.set(0, 1, f64::NAN).unwrap();
        let mask = band_test([&a], |[v]| v > 0.0).unwrap();
        assert!(mask[[0, 0]]);
        assert!(!mask[[0, 1]]);
    }
}
