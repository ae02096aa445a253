//! # covermap colormap
//!
//! Land-cover legend and RGBA quicklook rendering for covermap.
//!
//! Class maps are coloured with the fixed [`LAND_COVER_LEGEND`]; optical and
//! radar composites are drawn as three-band stretches with [`VisParams`].
//!
//! ## Usage
//!
//! ```ignore
//! use covermap_colormap::{VisParams, classes_to_rgba, stretch_rgb};
//!
//! let map_rgba = classes_to_rgba(&classified);
//! let composite_rgba = stretch_rgb(&landsat, &VisParams::landsat())?;
//! ```

mod legend;
mod render;

pub use legend::{LAND_COVER_LEGEND, LegendEntry, Rgb, legend_entry, legend_table};
pub use render::{VisParams, classes_to_rgba, stretch_rgb};
