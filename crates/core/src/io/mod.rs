//! Reading and writing pipeline inputs and outputs

mod asset;
mod catalog;
mod export;
mod geotiff;
mod points;

pub use asset::{AssetManifest, AssetStore, composite_asset_name};
pub use catalog::{Catalog, ImageCollection, Scene, SCENE_MANIFEST};
pub use export::{DEFAULT_MAX_PIXELS, DEFAULT_SCALE, ExportParams, export_raster};
pub use geotiff::{GeoTiffOptions, SampleFormat, read_geotiff, write_geotiff, write_rgba_geotiff};
pub use points::{parse_points, read_points};
