//! Gray-Level Co-occurrence Matrix (GLCM) texture features
//!
//! Gray levels are the integer cell values themselves, so the matrix is
//! kept sparse: a 3x3 window produces at most a dozen distinct pairs per
//! direction. Measures are computed per direction and averaged over the
//! directions that have at least one pair.

use crate::imagery::build_output;
use crate::maybe_rayon::*;
use covermap_core::raster::Raster;
use covermap_core::{BandStack, Error, Result};
use serde::{Deserialize, Serialize};

/// Available GLCM texture measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlcmMeasure {
    /// Angular Second Moment, `sum p^2`
    Asm,
    /// Contrast, `sum (i-j)^2 p`
    Contrast,
    /// Correlation of gray levels; 0 when either deviation vanishes
    Corr,
    /// Variance, `sum (i - mu)^2 p`
    Var,
    /// Inverse Difference Moment, `sum p / (1 + (i-j)^2)`
    Idm,
    /// Sum average, `sum (i+j) p`
    Savg,
    /// Entropy, `-sum p ln p`
    Ent,
    /// Dissimilarity, `sum |i-j| p`
    Diss,
}

/// Measures in output order
pub const GLCM_MEASURES: [GlcmMeasure; 8] = [
    GlcmMeasure::Asm,
    GlcmMeasure::Contrast,
    GlcmMeasure::Corr,
    GlcmMeasure::Var,
    GlcmMeasure::Idm,
    GlcmMeasure::Savg,
    GlcmMeasure::Ent,
    GlcmMeasure::Diss,
];

impl GlcmMeasure {
    /// Band-name suffix
    pub fn name(self) -> &'static str {
        match self {
            GlcmMeasure::Asm => "asm",
            GlcmMeasure::Contrast => "contrast",
            GlcmMeasure::Corr => "corr",
            GlcmMeasure::Var => "var",
            GlcmMeasure::Idm => "idm",
            GlcmMeasure::Savg => "savg",
            GlcmMeasure::Ent => "ent",
            GlcmMeasure::Diss => "diss",
        }
    }
}

/// Parameters for GLCM computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlcmParams {
    /// Window radius (default 1, a 3x3 window)
    pub radius: usize,
    /// Distance for co-occurrence (default: 1)
    pub distance: usize,
    /// Multiplier applied before truncating values to integer gray levels
    pub scale: f64,
}

impl Default for GlcmParams {
    fn default() -> Self {
        Self {
            radius: 1,
            distance: 1,
            scale: 1000.0,
        }
    }
}

/// Truncate `value * scale` toward zero into integer gray levels.
///
/// NaN becomes the `i32` nodata value.
pub fn gray_levels(raster: &Raster<f64>, scale: f64) -> Raster<i32> {
    let mut out = raster.map(|v| if v.is_nan() { i32::MIN } else { (v * scale).trunc() as i32 });
    out.set_nodata(Some(i32::MIN));
    out
}

/// Sparse normalised co-occurrence counts for one direction
#[derive(Debug, Default)]
struct SparseGlcm {
    entries: Vec<(i32, i32, f64)>,
    total: f64,
}

impl SparseGlcm {
    fn clear(&mut self) {
        self.entries.clear();
        self.total = 0.0;
    }

    fn add(&mut self, i: i32, j: i32) {
        match self.entries.iter_mut().find(|(a, b, _)| *a == i && *b == j) {
            Some(entry) => entry.2 += 1.0,
            None => self.entries.push((i, j, 1.0)),
        }
        self.total += 1.0;
    }

    /// Add the pair in both orders
    fn add_symmetric(&mut self, i: i32, j: i32) {
        self.add(i, j);
        self.add(j, i);
    }

    /// All eight measures, in [`GLCM_MEASURES`] order
    fn measures(&self) -> [f64; 8] {
        let norm = |c: f64| c / self.total;

        let mut mu = 0.0;
        for &(i, _, c) in &self.entries {
            mu += i as f64 * norm(c);
        }

        let mut m = [0.0; 8];
        let mut cov = 0.0;
        for &(i, j, c) in &self.entries {
            let p = norm(c);
            let (fi, fj) = (i as f64, j as f64);
            let d = fi - fj;
            m[0] += p * p;
            m[1] += d * d * p;
            cov += (fi - mu) * (fj - mu) * p;
            m[3] += (fi - mu) * (fi - mu) * p;
            m[4] += p / (1.0 + d * d);
            m[5] += (fi + fj) * p;
            m[6] -= p * p.ln();
            m[7] += d.abs() * p;
        }
        // Symmetric matrix: both marginals share mean and variance
        m[2] = if m[3] < 1e-15 { 0.0 } else { cov / m[3] };
        m
    }
}

/// Compute all GLCM measures for one band.
///
/// The returned stack holds one band per entry of [`GLCM_MEASURES`], named
/// `<prefix>_<measure>`. Both cells of a pair must lie inside the window
/// and hold data; windows without any pair are NaN.
pub fn glcm_texture(raster: &Raster<f64>, prefix: &str, params: &GlcmParams) -> Result<BandStack> {
    if params.radius == 0 {
        return Err(Error::Algorithm("GLCM radius must be > 0".into()));
    }
    if params.distance == 0 || params.distance > 2 * params.radius {
        return Err(Error::Algorithm("GLCM distance must fit inside the window".into()));
    }

    let levels = gray_levels(raster, params.scale);
    let (rows, cols) = raster.shape();
    let d = params.distance as isize;
    let r = params.radius as isize;

    // Direction offsets: 0°, 45°, 90°, 135°
    let directions: [(isize, isize); 4] = [(0, d), (-d, d), (-d, 0), (-d, -d)];

    let per_pixel: Vec<[f64; 8]> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![[f64::NAN; 8]; cols];
            let mut glcm = SparseGlcm::default();

            for (col, out) in row_data.iter_mut().enumerate() {
                let (row_i, col_i) = (row as isize, col as isize);
                let mut sums = [0.0; 8];
                let mut n_dirs = 0usize;

                for &(ddr, ddc) in &directions {
                    glcm.clear();
                    for dr in -r..=r {
                        for dc in -r..=r {
                            let (r1, c1) = (row_i + dr, col_i + dc);
                            let (r2, c2) = (r1 + ddr, c1 + ddc);
                            // Partner must stay inside the window
                            if (dr + ddr).abs() > r || (dc + ddc).abs() > r {
                                continue;
                            }
                            if r1 < 0 || c1 < 0 || r2 < 0 || c2 < 0 {
                                continue;
                            }
                            let (r1, c1, r2, c2) = (r1 as usize, c1 as usize, r2 as usize, c2 as usize);
                            if r1 >= rows || r2 >= rows || c1 >= cols || c2 >= cols {
                                continue;
                            }
                            let v1 = unsafe { levels.get_unchecked(r1, c1) };
                            let v2 = unsafe { levels.get_unchecked(r2, c2) };
                            if v1 == i32::MIN || v2 == i32::MIN {
                                continue;
                            }
                            glcm.add_symmetric(v1, v2);
                        }
                    }

                    if glcm.total > 0.0 {
                        for (s, m) in sums.iter_mut().zip(glcm.measures()) {
                            *s += m;
                        }
                        n_dirs += 1;
                    }
                }

                if n_dirs > 0 {
                    *out = sums.map(|s| s / n_dirs as f64);
                }
            }

            row_data
        })
        .collect();

    let mut stack = BandStack::new();
    for (k, measure) in GLCM_MEASURES.iter().enumerate() {
        let data = per_pixel.iter().map(|m| m[k]).collect();
        stack.add_band(format!("{}_{}", prefix, measure.name()), build_output(raster, rows, cols, data)?)?;
    }
    Ok(stack)
}

/// Texture bands of the `HH` and `HV` backscatter bands: 8 HH measures
/// followed by 8 HV measures.
pub fn texture_bands(radar: &BandStack, params: &GlcmParams) -> Result<BandStack> {
    let hh = glcm_texture(radar.band("HH")?, "HH", params)?;
    let hv = glcm_texture(radar.band("HV")?, "HV", params)?;
    hh.concat(hv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use covermap_core::GeoTransform;

    fn raster(rows: usize, cols: usize, values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_gray_levels_truncate_toward_zero() {
        let levels = gray_levels(&raster(1, 3, vec![-12.3456, 0.0019, f64::NAN]), 1000.0);
        assert_eq!(levels.get(0, 0).unwrap(), -12345);
        assert_eq!(levels.get(0, 1).unwrap(), 1);
        assert_eq!(levels.get(0, 2).unwrap(), i32::MIN);
    }

    #[test]
    fn test_uniform_window() {
        let out = glcm_texture(&raster(5, 5, vec![-15.0; 25]), "HH", &GlcmParams::default()).unwrap();
        let at = |name: &str| out.band(name).unwrap().get(2, 2).unwrap();
        assert_relative_eq!(at("HH_asm"), 1.0);
        assert_relative_eq!(at("HH_contrast"), 0.0);
        assert_relative_eq!(at("HH_corr"), 0.0);
        assert_relative_eq!(at("HH_var"), 0.0);
        assert_relative_eq!(at("HH_idm"), 1.0);
        assert_relative_eq!(at("HH_savg"), -30000.0);
        assert_relative_eq!(at("HH_ent"), 0.0);
        assert_relative_eq!(at("HH_diss"), 0.0);
    }

    #[test]
    fn test_horizontal_stripes() {
        // Rows alternate 0 and 0.001 so levels alternate 0 and 1
        let values: Vec<f64> = (0..25).map(|k| if (k / 5) % 2 == 0 { 0.0 } else { 0.001 }).collect();
        let out = glcm_texture(&raster(5, 5, values), "HV", &GlcmParams::default()).unwrap();
        let contrast = out.band("HV_contrast").unwrap().get(2, 2).unwrap();
        let diss = out.band("HV_diss").unwrap().get(2, 2).unwrap();
        // 0°: no change; 45°, 90°, 135°: every pair differs by one level
        assert_relative_eq!(contrast, 0.75, epsilon = 1e-12);
        assert_relative_eq!(diss, 0.75, epsilon = 1e-12);
        assert_eq!(out.names()[0], "HV_asm");
    }

    #[test]
    fn test_nan_cells_and_isolated_pixels() {
        let mut values = vec![f64::NAN; 9];
        values[4] = -10.0;
        let out = glcm_texture(&raster(3, 3, values), "HH", &GlcmParams::default()).unwrap();
        assert!(out.band("HH_asm").unwrap().get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_texture_bands_order() {
        let radar = BandStack::from_bands([
            ("HH", raster(3, 3, vec![-8.0; 9])),
            ("HV", raster(3, 3, vec![-14.0; 9])),
        ])
        .unwrap();
        let tex = texture_bands(&radar, &GlcmParams::default()).unwrap();
        assert_eq!(tex.len(), 16);
        assert_eq!(tex.names()[7], "HH_diss");
        assert_eq!(tex.names()[8], "HV_asm");
    }

    #[test]
    fn test_invalid_params() {
        let r = raster(3, 3, vec![1.0; 9]);
        let bad = GlcmParams { radius: 0, ..GlcmParams::default() };
        assert!(glcm_texture(&r, "HH", &bad).is_err());
    }
}
