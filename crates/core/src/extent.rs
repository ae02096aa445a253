//! Study-area extent
//!
//! A fixed axis-aligned rectangle shared read-only by every pipeline stage.

use crate::raster::GeoTransform;
use serde::{Deserialize, Serialize};

/// Metres per degree of latitude (mean, WGS84)
const METRES_PER_DEG_LAT: f64 = 110_574.0;
/// Metres per degree of longitude at the equator (WGS84)
const METRES_PER_DEG_LON: f64 = 111_320.0;

/// Axis-aligned bounding rectangle in CRS coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Pixel window `(row_off, col_off, rows, cols)` of an extent within a grid
pub type PixelWindow = (usize, usize, usize, usize);

impl Extent {
    /// Build an extent from two opposite corners given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            west: x0.min(x1),
            south: y0.min(y1),
            east: x0.max(x1),
            north: y0.max(y1),
        }
    }

    /// Northern Negros study box.
    pub fn northern_negros() -> Self {
        Self::from_corners(122.78, 11.0, 123.58, 10.3)
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) / 2.0, (self.south + self.north) / 2.0)
    }

    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0 && self.west.is_finite() && self.north.is_finite()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.west && x <= self.east && y >= self.south && y <= self.north
    }

    /// Intersection with another extent, `None` if they do not overlap.
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        let e = Extent {
            west: self.west.max(other.west),
            south: self.south.max(other.south),
            east: self.east.min(other.east),
            north: self.north.min(other.north),
        };
        e.is_valid().then_some(e)
    }

    /// Number of output pixels covering this extent at `scale` metres.
    ///
    /// Geographic extents use an equirectangular approximation at the
    /// centre latitude.
    pub fn pixel_count(&self, scale: f64, geographic: bool) -> u64 {
        let (width_m, height_m) = if geographic {
            let lat = self.center().1.to_radians();
            (
                self.width() * METRES_PER_DEG_LON * lat.cos(),
                self.height() * METRES_PER_DEG_LAT,
            )
        } else {
            (self.width(), self.height())
        };
        let cols = (width_m / scale).ceil().max(0.0) as u64;
        let rows = (height_m / scale).ceil().max(0.0) as u64;
        cols * rows
    }

    /// Pixel window of this extent inside a north-up grid of `rows` x `cols`.
    ///
    /// A pixel belongs to the window when its centre lies inside the extent.
    pub fn pixel_window(&self, transform: &GeoTransform, rows: usize, cols: usize) -> Option<PixelWindow> {
        let (c0, r0) = transform.geo_to_pixel(self.west, self.north);
        let (c1, r1) = transform.geo_to_pixel(self.east, self.south);
        if !(c0.is_finite() && r0.is_finite() && c1.is_finite() && r1.is_finite()) {
            return None;
        }

        let col_start = (c0.min(c1) - 0.5).ceil().max(0.0) as usize;
        let row_start = (r0.min(r1) - 0.5).ceil().max(0.0) as usize;
        let col_end = ((c0.max(c1) - 0.5).floor() + 1.0).clamp(0.0, cols as f64) as usize;
        let row_end = ((r0.max(r1) - 0.5).floor() + 1.0).clamp(0.0, rows as f64) as usize;

        if col_start >= col_end || row_start >= row_end {
            return None;
        }
        Some((row_start, col_start, row_end - row_start, col_end - col_start))
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::northern_negros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_corners_are_normalised() {
        let e = Extent::northern_negros();
        assert_relative_eq!(e.west, 122.78);
        assert_relative_eq!(e.east, 123.58);
        assert_relative_eq!(e.south, 10.3);
        assert_relative_eq!(e.north, 11.0);
        assert!(e.is_valid());
    }

    #[test]
    fn test_pixel_count_projected() {
        let e = Extent::from_corners(0.0, 0.0, 300.0, 90.0);
        assert_eq!(e.pixel_count(30.0, false), 10 * 3);
    }

    #[test]
    fn test_pixel_count_study_box_under_limit() {
        let n = Extent::northern_negros().pixel_count(30.0, true);
        assert!(n > 5_000_000 && n < 300_000_000, "got {}", n);
    }

    #[test]
    fn test_pixel_window() {
        // 10x10 grid of unit cells, origin (0, 10)
        let gt = GeoTransform::new(0.0, 10.0, 1.0, -1.0);
        let e = Extent::from_corners(2.0, 3.0, 5.0, 8.0);
        let (r, c, h, w) = e.pixel_window(&gt, 10, 10).unwrap();
        assert_eq!((r, c, h, w), (2, 2, 5, 3));
    }

    #[test]
    fn test_pixel_window_outside() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, -1.0);
        let e = Extent::from_corners(20.0, 20.0, 30.0, 30.0);
        assert!(e.pixel_window(&gt, 10, 10).is_none());
    }

    #[test]
    fn test_intersection() {
        let a = Extent::from_corners(0.0, 0.0, 10.0, 10.0);
        let b = Extent::from_corners(5.0, 5.0, 15.0, 15.0);
        let i = a.intersection(&b).unwrap();
        assert_relative_eq!(i.west, 5.0);
        assert_relative_eq!(i.north, 10.0);
        assert!(a.intersection(&Extent::from_corners(11.0, 11.0, 12.0, 12.0)).is_none());
    }
}
