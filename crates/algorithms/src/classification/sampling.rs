//! Pixel sampling at labelled points

use super::partition::RANDOM_COLUMN;
use covermap_core::vector::FeatureCollection;
use covermap_core::{BandStack, Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Feature vector of one point with its class
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub values: Vec<f64>,
    pub class_id: usize,
    /// Split value carried over from the point, if assigned
    pub random: Option<f64>,
}

/// Samples drawn from a stack, with the band order of their values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    pub band_names: Vec<String>,
    pub samples: Vec<Sample>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Row-major feature matrix
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.values.clone()).collect()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.class_id).collect()
    }

    /// Number of samples per class present
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.samples {
            *counts.entry(s.class_id).or_insert(0) += 1;
        }
        counts
    }
}

/// Sample the pixel under each point.
///
/// Values are taken from `bands` in the order given. Points outside the
/// stack, on a pixel where any selected band is masked, or without an
/// integral `class_property` are dropped.
pub fn sample_regions<S: AsRef<str>>(
    stack: &BandStack,
    points: &FeatureCollection,
    bands: &[S],
    class_property: &str,
) -> Result<SampleTable> {
    let selected = stack.select(bands)?;
    if selected.is_empty() {
        return Err(Error::InvalidParameter {
            name: "bands",
            value: String::new(),
            reason: "no bands selected for sampling".into(),
        });
    }
    let (rows, cols) = selected.shape();
    let transform = selected.transform();

    let mut table = SampleTable {
        band_names: selected.names().to_vec(),
        samples: Vec::with_capacity(points.len()),
    };
    let (mut outside, mut masked, mut unlabelled) = (0usize, 0usize, 0usize);

    for f in points.iter() {
        let Some(class_id) = f.get_class(class_property) else {
            unlabelled += 1;
            continue;
        };
        let Some((row, col)) = transform.cell_at(f.geometry.x(), f.geometry.y(), rows, cols) else {
            outside += 1;
            continue;
        };
        let values = selected.pixel(row, col)?;
        if values.iter().any(|v| v.is_nan()) {
            masked += 1;
            continue;
        }
        table.samples.push(Sample {
            values,
            class_id,
            random: f.get_f64(RANDOM_COLUMN),
        });
    }

    if unlabelled > 0 {
        warn!("{} points have no usable '{}' value", unlabelled, class_property);
    }
    debug!(
        "Sampled {} of {} points ({} outside, {} masked)",
        table.len(),
        points.len(),
        outside,
        masked
    );
    Ok(table)
}
