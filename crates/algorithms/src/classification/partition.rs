//! Random train/test assignment of labelled points

use covermap_core::vector::{AttributeValue, FeatureCollection};
use covermap_core::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Attribute holding the split value
pub const RANDOM_COLUMN: &str = "random";

/// Points split into training and testing sets
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub train: FeatureCollection,
    pub test: FeatureCollection,
}

/// Add a uniform `[0, 1)` value under `column` to every point.
///
/// Values are drawn in collection order from one stream seeded with `seed`,
/// so the same points and seed always get the same values.
pub fn random_column(points: &FeatureCollection, column: &str, seed: u64) -> FeatureCollection {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    points
        .iter()
        .cloned()
        .map(|f| f.with_property(column, AttributeValue::Float(rng.r#gen::<f64>())))
        .collect()
}

/// Split on `column`: `value <= threshold` trains, `value > threshold` tests.
///
/// Fails when a point lacks the column or either side ends up empty.
pub fn partition(points: &FeatureCollection, column: &str, threshold: f64) -> Result<Partition> {
    let mut train = FeatureCollection::new();
    let mut test = FeatureCollection::new();

    for (i, f) in points.iter().enumerate() {
        let value = f.get_f64(column).ok_or_else(|| Error::InvalidParameter {
            name: "column",
            value: column.to_string(),
            reason: format!("point {} has no numeric value", i),
        })?;
        if value <= threshold {
            train.push(f.clone());
        } else {
            test.push(f.clone());
        }
    }

    if train.is_empty() {
        return Err(Error::EmptyPartition { partition: "training" });
    }
    if test.is_empty() {
        return Err(Error::EmptyPartition { partition: "testing" });
    }
    Ok(Partition { train, test })
}
