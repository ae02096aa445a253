//! Named multi-band assets on disk
//!
//! Each asset is a directory holding `manifest.json` and one Float32
//! GeoTIFF per band.

use crate::error::{Error, Result};
use crate::io::{GeoTiffOptions, read_geotiff, write_geotiff};
use crate::raster::{BandStack, Raster};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const MANIFEST: &str = "manifest.json";

/// Asset name of a persisted composite, e.g. `Landsat_Composite_NNegros_2015`
pub fn composite_asset_name(kind: &str, site: &str, year: i32) -> String {
    format!("{}_Composite_{}_{}", kind, site, year)
}

/// Band list and grid of a stored asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub name: String,
    pub bands: Vec<String>,
    pub rows: usize,
    pub cols: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

/// Directory of named assets
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Persist a stack, replacing any asset of the same name
    pub fn write(&self, name: &str, stack: &BandStack) -> Result<PathBuf> {
        if stack.is_empty() {
            return Err(Error::InvalidParameter {
                name: "stack",
                value: name.to_string(),
                reason: "cannot store an asset without bands".into(),
            });
        }
        let dir = self.path_of(name);
        fs::create_dir_all(&dir)?;

        let options = GeoTiffOptions::default();
        for (band_name, band) in stack.iter() {
            write_geotiff(band, dir.join(format!("{}.tif", band_name)), &options)?;
        }

        let (rows, cols) = stack.shape();
        let manifest = AssetManifest {
            name: name.to_string(),
            bands: stack.names().to_vec(),
            rows,
            cols,
            crs: stack.crs().map(|c| c.identifier()),
        };
        fs::write(dir.join(MANIFEST), serde_json::to_string_pretty(&manifest)?)?;
        info!("Stored asset {} ({} bands, {}x{})", name, stack.len(), cols, rows);
        Ok(dir)
    }

    pub fn manifest(&self, name: &str) -> Result<AssetManifest> {
        let path = self.path_of(name).join(MANIFEST);
        if !path.is_file() {
            return Err(Error::AssetNotFound { path });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Load every band of an asset, in manifest order
    pub fn read(&self, name: &str) -> Result<BandStack> {
        let manifest = self.manifest(name)?;
        let dir = self.path_of(name);
        let mut stack = BandStack::new();
        for band_name in &manifest.bands {
            let mut band: Raster<f64> = read_geotiff(dir.join(format!("{}.tif", band_name)))?;
            band.set_nodata(Some(f64::NAN));
            stack.add_band(band_name.as_str(), band)?;
        }
        Ok(stack)
    }
}
