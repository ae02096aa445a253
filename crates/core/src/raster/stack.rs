//! Named multi-band images

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::raster::{GeoTransform, Raster};

/// Ordered set of named `f64` bands on one grid.
///
/// Composites, feature stacks and classifier inputs are all `BandStack`s.
/// Every band shares the shape and transform of the first band added; NaN
/// marks masked pixels.
#[derive(Debug, Clone, Default)]
pub struct BandStack {
    names: Vec<String>,
    bands: Vec<Raster<f64>>,
}

impl BandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from `(name, band)` pairs in order
    pub fn from_bands<S: Into<String>>(bands: impl IntoIterator<Item = (S, Raster<f64>)>) -> Result<Self> {
        let mut stack = Self::new();
        for (name, band) in bands {
            stack.add_band(name, band)?;
        }
        Ok(stack)
    }

    /// Append a band. Names must be unique and grids must match.
    pub fn add_band(&mut self, name: impl Into<String>, band: Raster<f64>) -> Result<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(Error::DuplicateBand(name));
        }
        if let Some(first) = self.bands.first() {
            let (er, ec) = first.shape();
            let (ar, ac) = band.shape();
            if (er, ec) != (ar, ac) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        self.names.push(name);
        self.bands.push(band);
        Ok(())
    }

    /// Band names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Shape `(rows, cols)` shared by all bands, `(0, 0)` when empty
    pub fn shape(&self) -> (usize, usize) {
        self.bands.first().map(|b| b.shape()).unwrap_or((0, 0))
    }

    pub fn transform(&self) -> GeoTransform {
        self.bands.first().map(|b| *b.transform()).unwrap_or_default()
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.bands.first().and_then(|b| b.crs())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Look up a band by name
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.index_of(name)
            .map(|i| &self.bands[i])
            .ok_or_else(|| self.not_found(name))
    }

    pub fn bands(&self) -> &[Raster<f64>] {
        &self.bands
    }

    /// Iterate `(name, band)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.names.iter().map(String::as_str).zip(self.bands.iter())
    }

    /// New stack with the named bands, in the order given
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<BandStack> {
        let mut out = BandStack::new();
        for name in names {
            let name = name.as_ref();
            out.add_band(name, self.band(name)?.clone())?;
        }
        Ok(out)
    }

    /// Select `from` bands and give them the `to` names, pairwise
    pub fn select_as<S: AsRef<str>, T: AsRef<str>>(&self, from: &[S], to: &[T]) -> Result<BandStack> {
        if from.len() != to.len() {
            return Err(Error::InvalidParameter {
                name: "to",
                value: to.len().to_string(),
                reason: format!("expected {} names", from.len()),
            });
        }
        let mut out = BandStack::new();
        for (f, t) in from.iter().zip(to) {
            out.add_band(t.as_ref(), self.band(f.as_ref())?.clone())?;
        }
        Ok(out)
    }

    /// Append all bands of `other`
    pub fn concat(mut self, other: BandStack) -> Result<BandStack> {
        for (name, band) in other.names.into_iter().zip(other.bands) {
            self.add_band(name, band)?;
        }
        Ok(self)
    }

    /// Values of every band at one pixel, in band order
    pub fn pixel(&self, row: usize, col: usize) -> Result<Vec<f64>> {
        self.bands.iter().map(|b| b.get(row, col)).collect()
    }

    /// Fill `out` with the pixel vector; `out` must be `len()` long
    ///
    /// # Safety
    /// Caller must ensure `(row, col)` lies inside `shape()`
    pub unsafe fn pixel_into_unchecked(&self, row: usize, col: usize, out: &mut [f64]) {
        for (slot, band) in out.iter_mut().zip(&self.bands) {
            *slot = unsafe { band.get_unchecked(row, col) };
        }
    }

    /// Clip every band to `extent`
    pub fn clip(&self, extent: &Extent) -> Result<BandStack> {
        let mut out = BandStack::new();
        for (name, band) in self.iter() {
            out.add_band(name, band.clip(extent)?)?;
        }
        Ok(out)
    }

    fn not_found(&self, name: &str) -> Error {
        Error::BandNotFound {
            band: name.to_string(),
            available: self.names.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(v: f64) -> Raster<f64> {
        Raster::filled(2, 3, v)
    }

    #[test]
    fn test_add_and_lookup() {
        let stack = BandStack::from_bands([("B1", band(1.0)), ("B2", band(2.0))]).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.shape(), (2, 3));
        assert_eq!(stack.band("B2").unwrap().get(0, 0).unwrap(), 2.0);
        assert!(matches!(stack.band("B9"), Err(Error::BandNotFound { .. })));
    }

    #[test]
    fn test_rejects_duplicates_and_mismatched_grids() {
        let mut stack = BandStack::new();
        stack.add_band("B1", band(1.0)).unwrap();
        assert!(matches!(stack.add_band("B1", band(1.0)), Err(Error::DuplicateBand(_))));
        assert!(matches!(
            stack.add_band("B2", Raster::filled(3, 3, 0.0)),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_select_reorders_and_renames() {
        let stack = BandStack::from_bands([("a", band(1.0)), ("b", band(2.0)), ("c", band(3.0))]).unwrap();
        let sel = stack.select(&["c", "a"]).unwrap();
        assert_eq!(sel.names(), ["c", "a"]);
        let renamed = stack.select_as(&["b", "c"], &["B2", "B3"]).unwrap();
        assert_eq!(renamed.names(), ["B2", "B3"]);
        assert_eq!(renamed.pixel(1, 2).unwrap(), vec![2.0, 3.0]);
        assert!(stack.select_as(&["a"], &["x", "y"]).is_err());
    }

    #[test]
    fn test_concat() {
        let a = BandStack::from_bands([("a", band(1.0))]).unwrap();
        let b = BandStack::from_bands([("b", band(2.0))]).unwrap();
        let ab = a.clone().concat(b).unwrap();
        assert_eq!(ab.names(), ["a", "b"]);
        assert!(ab.concat(a).is_err());
    }
}
