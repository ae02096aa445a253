//! # covermap core
//!
//! Core types and I/O for the covermap land-cover pipeline.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `BandStack`: Ordered set of named, co-registered `f64` bands (a multi-band image)
//! - `Extent` and `DateRange`: the study area and acquisition windows shared by every stage
//! - Point features for regions of interest
//! - I/O: GeoTIFF, the directory catalog, the asset store and GeoJSON points

pub mod crs;
pub mod error;
pub mod extent;
pub mod io;
pub mod raster;
pub mod temporal;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use extent::Extent;
pub use raster::{BandStack, GeoTransform, Raster, RasterElement};
pub use temporal::DateRange;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::extent::Extent;
    pub use crate::raster::{BandStack, GeoTransform, Raster, RasterElement};
    pub use crate::temporal::DateRange;
}
