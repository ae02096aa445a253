//! Directory-backed image catalog
//!
//! ```text
//! <root>/<collection path>/<scene id>/scene.json
//! <root>/<collection path>/<scene id>/<BAND>.tif
//! ```
//!
//! A collection directory holding `scene.json` itself is a single image.

use crate::error::{Error, Result};
use crate::io::read_geotiff;
use crate::raster::{BandStack, Raster};
use crate::temporal::DateRange;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the per-scene manifest
pub const SCENE_MANIFEST: &str = "scene.json";

#[derive(Debug, Deserialize)]
struct SceneManifest {
    id: String,
    date: NaiveDate,
    bands: BTreeMap<String, String>,
}

/// One acquisition: a date and a set of band files
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub date: NaiveDate,
    dir: PathBuf,
    bands: BTreeMap<String, String>,
}

impl Scene {
    /// Load a scene from its directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(SCENE_MANIFEST);
        if !manifest_path.is_file() {
            return Err(Error::AssetNotFound { path: manifest_path });
        }
        let text = fs::read_to_string(&manifest_path)?;
        let manifest: SceneManifest = serde_json::from_str(&text).map_err(|e| Error::Catalog {
            path: manifest_path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            id: manifest.id,
            date: manifest.date,
            dir: dir.to_path_buf(),
            bands: manifest.bands,
        })
    }

    /// Band names available in this scene
    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Read one band as `f64`, with the file's nodata pixels turned into NaN
    pub fn read_band(&self, name: &str) -> Result<Raster<f64>> {
        let file = self.bands.get(name).ok_or_else(|| Error::BandNotFound {
            band: name.to_string(),
            available: self.bands.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;
        let mut band: Raster<f64> = read_geotiff(self.dir.join(file))?;
        if let Some(nodata) = band.nodata().filter(|v| !v.is_nan()) {
            band.data_mut()
                .mapv_inplace(|v| if v == nodata { f64::NAN } else { v });
        }
        band.set_nodata(Some(f64::NAN));
        Ok(band)
    }

    /// Read the named bands into a stack, in the order given
    pub fn load<S: AsRef<str>>(&self, names: &[S]) -> Result<BandStack> {
        debug!("Loading {} bands of scene {}", names.len(), self.id);
        let mut stack = BandStack::new();
        for name in names {
            stack.add_band(name.as_ref(), self.read_band(name.as_ref())?)?;
        }
        Ok(stack)
    }
}

/// Date-ordered set of scenes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCollection {
    pub id: String,
    scenes: Vec<Scene>,
}

impl ImageCollection {
    pub fn new(id: impl Into<String>, mut scenes: Vec<Scene>) -> Self {
        scenes.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Self { id: id.into(), scenes }
    }

    /// Scenes acquired inside `range` (end exclusive)
    pub fn filter_date(self, range: &DateRange) -> Self {
        let scenes = self.scenes.into_iter().filter(|s| range.contains(s.date)).collect();
        Self { id: self.id, scenes }
    }

    /// Union of two collections, kept in date order
    pub fn merge(self, other: ImageCollection) -> Self {
        let id = format!("{}+{}", self.id, other.id);
        let mut scenes = self.scenes;
        scenes.extend(other.scenes);
        Self::new(id, scenes)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// First scene, for collections that hold a single image
    pub fn first(&self) -> Option<&Scene> {
        self.scenes.first()
    }
}

/// Catalog rooted at a directory
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a collection by its path, e.g. `LANDSAT/LC8_L1T_TOA`
    pub fn collection(&self, id: &str) -> Result<ImageCollection> {
        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Err(Error::AssetNotFound { path: dir });
        }
        if dir.join(SCENE_MANIFEST).is_file() {
            return Ok(ImageCollection::new(id, vec![Scene::open(&dir)?]));
        }

        let mut scenes = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.join(SCENE_MANIFEST).is_file() {
                scenes.push(Scene::open(&path)?);
            }
        }
        debug!("Collection {}: {} scenes", id, scenes.len());
        Ok(ImageCollection::new(id, scenes))
    }

    /// Open a single image (a collection directory with one scene)
    pub fn image(&self, id: &str) -> Result<Scene> {
        let collection = self.collection(id)?;
        collection.first().cloned().ok_or_else(|| Error::Catalog {
            path: self.root.join(id),
            reason: "collection holds no scenes".into(),
        })
    }
}
