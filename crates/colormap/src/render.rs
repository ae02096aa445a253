//! Raster-to-RGBA rendering for quicklooks.

use crate::legend::legend_entry;
use covermap_core::raster::{BandStack, Raster, RasterElement};
use covermap_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// RGBA of masked pixels
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Three-band stretch used for composite quicklooks.
///
/// Each channel maps `[min, max]` linearly onto `[0, 1]`, clamps, applies
/// `t^(1/gamma)` and scales to 0..=255.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub bands: [String; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
    #[serde(default = "default_gamma")]
    pub gamma: [f64; 3],
}

fn default_gamma() -> [f64; 3] {
    [1.0; 3]
}

impl VisParams {
    /// False-colour SWIR1/NIR/red view of an optical composite
    pub fn landsat() -> Self {
        Self {
            bands: ["B5".into(), "B4".into(), "B3".into()],
            min: [0.05; 3],
            max: [0.3, 0.4, 0.4],
            gamma: [1.6; 3],
        }
    }

    /// HH/HV/ratio view of a radar composite
    pub fn palsar() -> Self {
        Self {
            bands: ["HH".into(), "HV".into(), "RAT".into()],
            min: [-30.0, -30.0, -5.0],
            max: [0.0, 0.0, 5.0],
            gamma: [1.0; 3],
        }
    }

    fn channel(&self, i: usize, v: f64) -> u8 {
        let range = self.max[i] - self.min[i];
        let t = if range.abs() > f64::EPSILON {
            ((v - self.min[i]) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t = if self.gamma[i] > 0.0 { t.powf(1.0 / self.gamma[i]) } else { t };
        (t * 255.0).round() as u8
    }
}

/// Render a class map with the land-cover legend.
///
/// Returns `rows * cols * 4` bytes, row-major. No-data pixels and values
/// outside the legend are transparent.
pub fn classes_to_rgba<T: RasterElement>(raster: &Raster<T>) -> Vec<u8> {
    let nodata = raster.nodata();
    let mut rgba = Vec::with_capacity(raster.len() * 4);

    for val in raster.data().iter() {
        let entry = if val.is_nodata(nodata) {
            None
        } else {
            val.to_f64()
                .filter(|v| v.is_finite() && *v >= 1.0 && *v <= 255.0)
                .and_then(|v| legend_entry(v.round() as u8))
        };
        match entry {
            Some(e) => rgba.extend_from_slice(&[e.color.r, e.color.g, e.color.b, 255]),
            None => rgba.extend_from_slice(&TRANSPARENT),
        }
    }

    rgba
}

/// Render three bands of a stack as an RGB stretch.
///
/// Pixels where any of the three bands is NaN are transparent.
pub fn stretch_rgb(stack: &BandStack, vis: &VisParams) -> Result<Vec<u8>> {
    if vis.gamma.iter().any(|g| !(*g > 0.0)) {
        return Err(Error::InvalidParameter {
            name: "gamma",
            value: format!("{:?}", vis.gamma),
            reason: "must be positive".into(),
        });
    }
    let bands = [
        stack.band(&vis.bands[0])?,
        stack.band(&vis.bands[1])?,
        stack.band(&vis.bands[2])?,
    ];
    let (rows, cols) = stack.shape();
    let mut rgba = Vec::with_capacity(rows * cols * 4);

    for ((r, g), b) in bands[0].data().iter().zip(bands[1].data()).zip(bands[2].data()) {
        if r.is_nan() || g.is_nan() || b.is_nan() {
            rgba.extend_from_slice(&TRANSPARENT);
            continue;
        }
        rgba.extend_from_slice(&[vis.channel(0, *r), vis.channel(1, *g), vis.channel(2, *b), 255]);
    }

    Ok(rgba)
}
