//! Yearly mosaic calibration to gamma-nought dB

use crate::imagery::{band_math, band_math_n, median_composite};
use crate::statistics::{FocalParams, FocalStatistic, focal_statistics};
use covermap_core::{BandStack, Error, Raster, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Calibration offset of the PALSAR mosaics, in dB
pub const CALIBRATION_OFFSET_DB: f64 = -83.0;

/// Output band names of a radar composite
pub const RADAR_BANDS: [&str; 3] = ["HH", "HV", "RAT"];

/// Available speckle filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeckleFilterType {
    /// Mean filter (simple averaging)
    Mean,
    /// Median filter (rank filter)
    Median,
}

/// Speckle filtering parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeckleFilterParams {
    pub filter: SpeckleFilterType,
    /// Filter window size (must be odd)
    pub window_size: usize,
}

impl Default for SpeckleFilterParams {
    fn default() -> Self {
        Self {
            filter: SpeckleFilterType::Mean,
            window_size: 3,
        }
    }
}

/// Radar compositing options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadarParams {
    /// Smooth the dB bands before the ratio is taken; off by default
    #[serde(default)]
    pub speckle_filter: Option<SpeckleFilterParams>,
}

/// Convert digital numbers to gamma-nought backscatter in dB.
///
/// `gamma0 = 10 * log10(DN^2) - 83`. Non-positive DN is nodata.
pub fn gamma0_db(dn: &Raster<f64>) -> Result<Raster<f64>> {
    band_math(dn, |v| {
        if v > 0.0 {
            10.0 * (v * v).log10() + CALIBRATION_OFFSET_DB
        } else {
            f64::NAN
        }
    })
}

/// Ratio of two dB bands, `HH_dB / HV_dB`. A zero denominator is nodata.
pub fn db_ratio(hh_db: &Raster<f64>, hv_db: &Raster<f64>) -> Result<Raster<f64>> {
    band_math_n([hh_db, hv_db], |[hh, hv]| if hv == 0.0 { f64::NAN } else { hh / hv })
}

/// Apply a mean or median speckle filter
pub fn speckle_filter(image: &Raster<f64>, params: &SpeckleFilterParams) -> Result<Raster<f64>> {
    if params.window_size < 3 || params.window_size % 2 == 0 {
        return Err(Error::InvalidParameter {
            name: "window_size",
            value: params.window_size.to_string(),
            reason: "speckle window must be odd and at least 3".into(),
        });
    }
    debug!("Applying {:?} speckle filter ({}x{})", params.filter, params.window_size, params.window_size);

    let statistic = match params.filter {
        SpeckleFilterType::Mean => FocalStatistic::Mean,
        SpeckleFilterType::Median => FocalStatistic::Median,
    };
    focal_statistics(
        image,
        FocalParams {
            radius: params.window_size / 2,
            statistic,
            circular: false,
        },
    )
}

/// Per-pixel median DN across yearly mosaics with `HH` and `HV` bands.
///
/// Non-positive DN are excluded before the median.
pub fn median_dn(scenes: &[BandStack]) -> Result<BandStack> {
    let positive: Vec<BandStack> = scenes
        .iter()
        .map(|s| {
            let hh = band_math(s.band("HH")?, |v| if v > 0.0 { v } else { f64::NAN })?;
            let hv = band_math(s.band("HV")?, |v| if v > 0.0 { v } else { f64::NAN })?;
            BandStack::from_bands([("HH", hh), ("HV", hv)])
        })
        .collect::<Result<_>>()?;
    median_composite(&positive, None)
}

/// Calibrated radar composite with bands `HH`, `HV` (dB) and `RAT`.
pub fn radar_composite(hh_dn: &Raster<f64>, hv_dn: &Raster<f64>, params: &RadarParams) -> Result<BandStack> {
    let mut hh = gamma0_db(hh_dn)?;
    let mut hv = gamma0_db(hv_dn)?;

    if let Some(filter) = &params.speckle_filter {
        hh = speckle_filter(&hh, filter)?;
        hv = speckle_filter(&hv, filter)?;
    }

    let rat = db_ratio(&hh, &hv)?;
    info!("Radar composite {}x{}", hh.cols(), hh.rows());
    BandStack::from_bands([("HH", hh), ("HV", hv), ("RAT", rat)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn band(values: Vec<f64>) -> Raster<f64> {
        let n = values.len();
        Raster::from_vec(values, 1, n).unwrap()
    }

    #[test]
    fn test_gamma0_formula() {
        let out = gamma0_db(&band(vec![10_000.0, 1.0, 0.0, -3.0])).unwrap();
        // 10 * log10(1e8) - 83 = -3
        assert_relative_eq!(out.get(0, 0).unwrap(), -3.0, epsilon = 1e-10);
        assert_relative_eq!(out.get(0, 1).unwrap(), -83.0, epsilon = 1e-10);
        assert!(out.get(0, 2).unwrap().is_nan());
        assert!(out.get(0, 3).unwrap().is_nan());
    }

    #[test]
    fn test_ratio_of_decibels() {
        let out = db_ratio(&band(vec![-8.0, -5.0]), &band(vec![-16.0, 0.0])).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5);
        assert!(out.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_radar_composite_bands() {
        let stack = radar_composite(
            &band(vec![4000.0, 0.0]),
            &band(vec![2000.0, 1500.0]),
            &RadarParams::default(),
        )
        .unwrap();
        assert_eq!(stack.names(), RADAR_BANDS);
        let hh = 20.0 * 4000f64.log10() - 83.0;
        let hv = 20.0 * 2000f64.log10() - 83.0;
        assert_relative_eq!(stack.band("RAT").unwrap().get(0, 0).unwrap(), hh / hv, epsilon = 1e-10);
        assert!(stack.band("RAT").unwrap().get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_median_dn_excludes_zero() {
        let a = BandStack::from_bands([("HH", band(vec![100.0])), ("HV", band(vec![0.0]))]).unwrap();
        let b = BandStack::from_bands([("HH", band(vec![300.0])), ("HV", band(vec![50.0]))]).unwrap();
        let m = median_dn(&[a, b]).unwrap();
        assert_relative_eq!(m.band("HH").unwrap().get(0, 0).unwrap(), 200.0);
        assert_relative_eq!(m.band("HV").unwrap().get(0, 0).unwrap(), 50.0);
    }

    #[test]
    fn test_speckle_window_validated() {
        let img = band(vec![1.0, 2.0, 3.0]);
        let even = SpeckleFilterParams { filter: SpeckleFilterType::Median, window_size: 4 };
        assert!(speckle_filter(&img, &even).is_err());
        let ok = speckle_filter(&img, &SpeckleFilterParams::default()).unwrap();
        assert_relative_eq!(ok.get(0, 1).unwrap(), 2.0);
    }
}
