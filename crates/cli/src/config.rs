//! Pipeline configuration
//!
//! One JSON document describes the study site, the catalog and output
//! locations, every epoch to composite, and the classifier settings.
//! Missing fields take the defaults of the Northern Negros run.

use anyhow::{Context, Result, bail};
use covermap_algorithms::classification::ClassificationParams;
use covermap_algorithms::imagery::OpticalSensor;
use covermap_algorithms::sar::RadarParams;
use covermap_algorithms::texture::GlcmParams;
use covermap_core::io::{DEFAULT_MAX_PIXELS, DEFAULT_SCALE};
use covermap_core::{DateRange, Extent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Optical compositing for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalEpoch {
    /// Year the composite is published under
    pub year: i32,
    pub sensor: OpticalSensor,
    pub dates: DateRange,
}

/// Radar compositing for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarEpoch {
    pub year: i32,
    /// Catalog path of the yearly mosaic collection
    pub collection: String,
    pub dates: DateRange,
    #[serde(default)]
    pub params: RadarParams,
}

/// Land/water image used to mask the final maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandMask {
    pub image: String,
    pub band: String,
}

impl Default for LandMask {
    fn default() -> Self {
        Self {
            image: "UMD/hansen/global_forest_change_2015".into(),
            band: "datamask".into(),
        }
    }
}

/// Everything a pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub site: String,
    pub extent: Extent,
    pub catalog_root: PathBuf,
    pub asset_root: PathBuf,
    pub export_folder: PathBuf,
    /// GeoJSON point file with the labelled regions of interest
    pub roi_points: PathBuf,
    /// Export resolution in metres
    pub scale: f64,
    pub max_pixels: u64,
    pub optical: Vec<OpticalEpoch>,
    pub radar: Vec<RadarEpoch>,
    pub land_mask: LandMask,
    pub texture: GlcmParams,
    pub classification: ClassificationParams,
    /// Write RGBA quicklooks next to composites and maps
    pub quicklooks: bool,
}

fn date_range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).expect("built-in date ranges are valid")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site: "NNegros".into(),
            extent: Extent::northern_negros(),
            catalog_root: "catalog".into(),
            asset_root: "assets".into(),
            export_folder: "export".into(),
            roi_points: "roi/nnegros-landcover-roi-final.geojson".into(),
            scale: DEFAULT_SCALE,
            max_pixels: DEFAULT_MAX_PIXELS,
            optical: vec![
                OpticalEpoch {
                    year: 2010,
                    sensor: OpticalSensor::landsat5_7(),
                    dates: date_range("2009-01-01", "2011-12-31"),
                },
                OpticalEpoch {
                    year: 2015,
                    sensor: OpticalSensor::landsat8(),
                    dates: date_range("2015-01-01", "2016-12-31"),
                },
            ],
            radar: vec![
                RadarEpoch {
                    year: 2010,
                    collection: "JAXA/ALOS/PALSAR/YEARLY/SAR/2010".into(),
                    dates: date_range("2010-01-01", "2011-01-01"),
                    params: RadarParams::default(),
                },
                RadarEpoch {
                    year: 2015,
                    collection: "JAXA/ALOS/PALSAR/YEARLY/SAR/2015".into(),
                    dates: date_range("2015-01-01", "2016-01-01"),
                    params: RadarParams::default(),
                },
            ],
            land_mask: LandMask::default(),
            texture: GlcmParams::default(),
            classification: ClassificationParams::default(),
            quicklooks: true,
        }
    }
}

impl PipelineConfig {
    /// Read a config file, or the defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.site.is_empty() {
            bail!("site must not be empty");
        }
        if !self.extent.is_valid() {
            bail!("extent is empty or not finite: {:?}", self.extent);
        }
        if !(self.scale > 0.0) {
            bail!("scale must be positive, got {}", self.scale);
        }
        for epoch in &self.optical {
            epoch.sensor.validate()?;
        }
        self.classification.forest.validate()?;
        Ok(())
    }

    pub fn optical_epoch(&self, year: i32) -> Result<&OpticalEpoch> {
        self.optical
            .iter()
            .find(|e| e.year == year)
            .with_context(|| format!("No optical epoch configured for {}", year))
    }

    pub fn radar_epoch(&self, year: i32) -> Result<&RadarEpoch> {
        self.radar
            .iter()
            .find(|e| e.year == year)
            .with_context(|| format!("No radar epoch configured for {}", year))
    }

    /// Years with both an optical and a radar epoch, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .optical
            .iter()
            .map(|e| e.year)
            .filter(|y| self.radar.iter().any(|r| r.year == *y))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_study() {
        let c = PipelineConfig::default();
        assert_eq!(c.site, "NNegros");
        assert_eq!(c.years(), vec![2010, 2015]);
        assert_eq!(c.classification.seed, 2015);
        assert_eq!(c.optical_epoch(2015).unwrap().sensor.source_bands[0], "B2");
        assert_eq!(
            c.optical_epoch(2010).unwrap().sensor.collections,
            vec!["LANDSAT/LT5_L1T_TOA", "LANDSAT/LE7_L1T_TOA"]
        );
        assert!(c.radar_epoch(2012).is_err());
        c.validate().unwrap();
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = PipelineConfig::default();
        fs::write(&path, original.to_json().unwrap()).unwrap();
        let loaded = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.optical, original.optical);
        assert_eq!(loaded.radar, original.radar);
        assert_eq!(loaded.site, original.site);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"site": "Panay", "catalog_root": "/data/catalog"}"#).unwrap();
        let c = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(c.site, "Panay");
        assert_eq!(c.catalog_root, PathBuf::from("/data/catalog"));
        assert_eq!(c.optical.len(), 2);
        assert_eq!(c.classification.class_property, "ClassID2");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"scale": -30.0}"#).unwrap();
        assert!(PipelineConfig::load(Some(&path)).is_err());
        assert!(PipelineConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
