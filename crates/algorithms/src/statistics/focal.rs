//! Focal (moving window) statistics
//!
//! Computes a statistic over the valid cells of a window centred on each
//! cell. Used for the majority filter on class maps and for radar speckle
//! smoothing.

use crate::imagery::build_output;
use crate::imagery::median;
use crate::maybe_rayon::*;
use covermap_core::raster::{Neighborhood, Raster};
use covermap_core::{Error, Result};

/// Available focal statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocalStatistic {
    /// Arithmetic mean
    Mean,
    /// Median value
    Median,
    /// Most frequent value; ties resolve to the smallest value
    Mode,
}

/// Parameters for focal statistics
#[derive(Debug, Clone)]
pub struct FocalParams {
    /// Window radius (actual window size = 2*radius + 1)
    pub radius: usize,
    /// Statistic to compute
    pub statistic: FocalStatistic,
    /// Whether to use circular window (default: false = square)
    pub circular: bool,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            radius: 1,
            statistic: FocalStatistic::Mean,
            circular: false,
        }
    }
}

impl FocalParams {
    /// 3x3 square majority filter
    pub fn mode3x3() -> Self {
        Self {
            radius: 1,
            statistic: FocalStatistic::Mode,
            circular: false,
        }
    }

    fn neighborhood(&self) -> Neighborhood {
        if self.circular {
            Neighborhood::Circle(self.radius)
        } else {
            Neighborhood::Square(self.radius)
        }
    }
}

/// Compute focal statistics on a raster.
///
/// NaN cells in the window are skipped; a window with no valid cell yields
/// NaN. Windows are clipped at the raster edge.
pub fn focal_statistics(raster: &Raster<f64>, params: FocalParams) -> Result<Raster<f64>> {
    if params.radius == 0 {
        return Err(Error::Algorithm("Focal radius must be > 0".into()));
    }

    let (rows, cols) = raster.shape();
    let window = params.neighborhood();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values: Vec<f64> = Vec::with_capacity(window.size() * window.size());

            for (col, out) in row_data.iter_mut().enumerate() {
                values.clear();
                for (nr, nc) in window.cells(row, col, rows, cols) {
                    let v = unsafe { raster.get_unchecked(nr, nc) };
                    if !v.is_nan() {
                        values.push(v);
                    }
                }

                if values.is_empty() {
                    continue;
                }

                *out = compute_statistic(&mut values, params.statistic);
            }

            row_data
        })
        .collect();

    build_output(raster, rows, cols, output_data)
}

fn compute_statistic(values: &mut [f64], stat: FocalStatistic) -> f64 {
    match stat {
        FocalStatistic::Mean => values.iter().sum::<f64>() / values.len() as f64,
        FocalStatistic::Median => median(values),
        FocalStatistic::Mode => mode(values),
    }
}

/// Most frequent value, smallest on ties. NaN for an empty slice.
pub fn mode(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));

    let mut best = f64::NAN;
    let mut best_count = 0;
    let mut i = 0;
    while i < values.len() {
        let v = values[i];
        let run = values[i..].iter().take_while(|x| **x == v).count();
        // Strict comparison keeps the smaller value on ties
        if run > best_count {
            best = v;
            best_count = run;
        }
        i += run;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use covermap_core::GeoTransform;

    fn raster_from(size: usize, values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, size, size).unwrap();
        r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
        r
    }

    fn uniform_raster(size: usize, value: f64) -> Raster<f64> {
        raster_from(size, vec![value; size * size])
    }

    #[test]
    fn test_focal_mean_uniform() {
        let r = uniform_raster(10, 5.0);
        let result = focal_statistics(&r, FocalParams::default()).unwrap();
        let v = result.get(5, 5).unwrap();
        assert!((v - 5.0).abs() < 1e-10, "Mean of uniform should be 5.0, got {}", v);
    }

    #[test]
    fn test_focal_median() {
        let r = raster_from(10, (0..100).map(|v| v as f64).collect());
        let result = focal_statistics(&r, FocalParams {
            radius: 1,
            statistic: FocalStatistic::Median,
            circular: false,
        })
        .unwrap();
        // Median of 3x3 window around (5,5)=55 is 55
        assert!((result.get(5, 5).unwrap() - 55.0).abs() < 1e-10);
    }

    #[test]
    fn test_mode_replaces_isolated_pixel() {
        let r = raster_from(3, vec![1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0]);
        let result = focal_statistics(&r, FocalParams::mode3x3()).unwrap();
        assert_eq!(result.get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_mode_tie_takes_smallest() {
        assert_eq!(mode(&mut [3.0, 2.0, 3.0, 2.0, 5.0]), 2.0);
        assert_eq!(mode(&mut [4.0]), 4.0);
        assert!(mode(&mut []).is_nan());
    }

    #[test]
    fn test_mode_idempotent_on_uniform() {
        let r = uniform_raster(6, 3.0);
        let once = focal_statistics(&r, FocalParams::mode3x3()).unwrap();
        let twice = focal_statistics(&once, FocalParams::mode3x3()).unwrap();
        assert_eq!(once.data(), r.data());
        assert_eq!(twice.data(), once.data());
    }

    #[test]
    fn test_mode_skips_nan_and_all_nan_stays_nan() {
        let mut values = vec![f64::NAN; 9];
        values[0] = 4.0;
        let r = raster_from(3, values);
        let result = focal_statistics(&r, FocalParams::mode3x3()).unwrap();
        assert_eq!(result.get(1, 1).unwrap(), 4.0);
        assert!(result.get(2, 2).unwrap().is_nan());
    }

    #[test]
    fn test_focal_circular() {
        let r = uniform_raster(10, 1.0);
        let result = focal_statistics(&r, FocalParams {
            radius: 2,
            statistic: FocalStatistic::Mean,
            circular: true,
        })
        .unwrap();
        assert!((result.get(5, 5).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_focal_radius_zero_error() {
        let r = uniform_raster(5, 1.0);
        let result = focal_statistics(&r, FocalParams {
            radius: 0,
            statistic: FocalStatistic::Mean,
            circular: false,
        });
        assert!(result.is_err());
    }
}
