//! Optical sensor families and their band naming

use covermap_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Canonical reflective band names shared by every optical composite
pub const CANONICAL_BANDS: [&str; 6] = ["B1", "B2", "B3", "B4", "B5", "B7"];

/// A family of optical sensors feeding one composite.
///
/// `source_bands` are the sensor's own names for blue, green, red, NIR,
/// SWIR1 and SWIR2, in [`CANONICAL_BANDS`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpticalSensor {
    pub name: String,
    /// Catalog collection paths, merged before compositing
    pub collections: Vec<String>,
    pub source_bands: Vec<String>,
}

impl OpticalSensor {
    /// Landsat 5 TM and Landsat 7 ETM+ top-of-atmosphere reflectance
    pub fn landsat5_7() -> Self {
        Self {
            name: "Landsat 5/7".into(),
            collections: vec!["LANDSAT/LT5_L1T_TOA".into(), "LANDSAT/LE7_L1T_TOA".into()],
            source_bands: CANONICAL_BANDS.iter().map(|b| b.to_string()).collect(),
        }
    }

    /// Landsat 8 OLI top-of-atmosphere reflectance
    pub fn landsat8() -> Self {
        Self {
            name: "Landsat 8".into(),
            collections: vec!["LANDSAT/LC8_L1T_TOA".into()],
            source_bands: ["B2", "B3", "B4", "B5", "B6", "B7"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_bands.len() != CANONICAL_BANDS.len() {
            return Err(Error::InvalidParameter {
                name: "source_bands",
                value: self.source_bands.join(","),
                reason: format!("expected {} bands", CANONICAL_BANDS.len()),
            });
        }
        if self.collections.is_empty() {
            return Err(Error::InvalidParameter {
                name: "collections",
                value: self.name.clone(),
                reason: "sensor needs at least one collection".into(),
            });
        }
        Ok(())
    }
}
