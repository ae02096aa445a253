//! Georeferenced single-band grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::extent::{Extent, PixelWindow};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, s};

/// A georeferenced 2D raster grid.
///
/// Values are stored row-major as `(row, col)`. Every band of a composite,
/// every feature layer and every class map is a `Raster`.
///
/// ```ignore
/// use covermap_core::Raster;
///
/// let mut red: Raster<f64> = Raster::filled(100, 100, f64::NAN);
/// red.set(10, 20, 0.08)?;
/// let v = red.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Zero-filled raster of a different cell type sharing this raster's georeferencing
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: self.nodata,
        }
    }

    /// Apply `f` to every cell, keeping georeferencing
    pub fn map<U: RasterElement>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster {
            data: self.data.mapv(f),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Bounds as an [`Extent`]
    pub fn extent(&self) -> Extent {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        Extent::from_corners(min_x, min_y, max_x, max_y)
    }

    /// Pixel centre in CRS coordinates
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Cell `(row, col)` containing a CRS point, if inside the grid
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        self.transform.cell_at(x, y, self.rows(), self.cols())
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Number of cells holding data
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !self.is_nodata(**v)).count()
    }

    /// Copy of a pixel window, with the transform shifted to the window origin.
    pub fn crop(&self, window: PixelWindow) -> Result<Self> {
        let (row_off, col_off, rows, cols) = window;
        if rows == 0 || cols == 0 || row_off + rows > self.rows() || col_off + cols > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row_off + rows,
                col: col_off + cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        let data = self
            .data
            .slice(s![row_off..row_off + rows, col_off..col_off + cols])
            .to_owned();
        Ok(Self {
            data,
            transform: self.transform.offset(row_off, col_off),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    /// Crop to the pixels whose centres fall inside `extent`.
    pub fn clip(&self, extent: &Extent) -> Result<Self> {
        let window = extent
            .pixel_window(&self.transform, self.rows(), self.cols())
            .ok_or_else(|| Error::Algorithm("clip extent does not overlap the raster".into()))?;
        self.crop(window)
    }

    /// Basic statistics over valid cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }
            if let Some(v) = value.to_f64() {
                min = min.min(v);
                max = max.max(v);
                sum += v;
                count += 1;
            }
        }

        let some_if = |v: f64| (count > 0).then_some(v);
        RasterStatistics {
            min: some_if(min),
            max: some_if(max),
            mean: some_if(sum / count.max(1) as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}
