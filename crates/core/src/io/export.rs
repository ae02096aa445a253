//! Bulk export of finished maps

use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::io::{GeoTiffOptions, write_geotiff};
use crate::raster::{Raster, RasterElement};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Output resolution in metres
pub const DEFAULT_SCALE: f64 = 30.0;

/// Largest export accepted without raising the limit
pub const DEFAULT_MAX_PIXELS: u64 = 300_000_000;

/// Where and how to export one raster
#[derive(Debug, Clone)]
pub struct ExportParams {
    /// File stem, e.g. `Classification_NNegros_2015`
    pub description: String,
    pub folder: PathBuf,
    pub region: Extent,
    /// Metres per pixel
    pub scale: f64,
    pub max_pixels: u64,
    pub options: GeoTiffOptions,
}

impl ExportParams {
    /// Byte export at 30 m with the default pixel limit
    pub fn new(description: impl Into<String>, folder: impl Into<PathBuf>, region: Extent) -> Self {
        Self {
            description: description.into(),
            folder: folder.into(),
            region,
            scale: DEFAULT_SCALE,
            max_pixels: DEFAULT_MAX_PIXELS,
            options: GeoTiffOptions::uint8(),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn path(&self) -> PathBuf {
        self.folder.join(format!("{}.tif", self.description))
    }
}

/// Clip `raster` to the export region and write it as GeoTIFF.
///
/// The pixel budget is checked on the region at `scale` before anything is
/// written. Rasters without a CRS are treated as geographic.
pub fn export_raster<T: RasterElement>(raster: &Raster<T>, params: &ExportParams) -> Result<PathBuf> {
    if !(params.scale > 0.0) {
        return Err(Error::InvalidParameter {
            name: "scale",
            value: params.scale.to_string(),
            reason: "must be positive".into(),
        });
    }
    let geographic = raster.crs().is_none_or(|c| c.is_geographic());
    let pixels = params.region.pixel_count(params.scale, geographic);
    if pixels > params.max_pixels {
        return Err(Error::PixelLimitExceeded {
            description: params.description.clone(),
            pixels,
            max_pixels: params.max_pixels,
        });
    }

    let clipped = raster.clip(&params.region)?;
    fs::create_dir_all(&params.folder)?;
    let path = params.path();
    write_geotiff(&clipped, &path, &params.options)?;
    info!(
        "Exported {} ({}x{}) to {}",
        params.description,
        clipped.rows(),
        clipped.cols(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS;
    use crate::io::read_geotiff;
    use crate::raster::GeoTransform;
    use tempfile::tempdir;

    fn class_map() -> Raster<u8> {
        let mut r = Raster::from_vec((0..100).map(|v| (v % 6) as u8).collect(), 10, 10).unwrap();
        r.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32651)));
        r
    }

    #[test]
    fn test_export_clips_to_region() {
        let dir = tempdir().unwrap();
        let region = Extent::from_corners(60.0, 90.0, 210.0, 240.0);
        let params = ExportParams::new("Classification_NNegros_2010", dir.path().join("out"), region);
        let path = export_raster(&class_map(), &params).unwrap();
        assert!(path.ends_with("out/Classification_NNegros_2010.tif"));

        let back: Raster<u8> = read_geotiff(&path).unwrap();
        assert_eq!(back.shape(), (5, 5));
        // First exported cell is source (2, 2)
        assert_eq!(back.get(0, 0).unwrap(), 22 % 6);
    }

    #[test]
    fn test_pixel_limit() {
        let dir = tempdir().unwrap();
        let region = Extent::from_corners(0.0, 0.0, 300.0, 300.0);
        let params = ExportParams::new("big", dir.path(), region).with_max_pixels(99);
        assert!(matches!(
            export_raster(&class_map(), &params),
            Err(Error::PixelLimitExceeded { pixels: 100, max_pixels: 99, .. })
        ));
        assert!(!params.path().exists());
    }

    #[test]
    fn test_study_box_fits_default_limit() {
        let region = Extent::northern_negros();
        let n = region.pixel_count(DEFAULT_SCALE, true);
        assert!(n <= DEFAULT_MAX_PIXELS);
    }
}
