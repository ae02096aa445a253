//! Supervised land-cover classification
//!
//! - **partition**: seeded random column and train/test split of labelled points
//! - **sampling**: feature vectors at point locations
//! - **random_forest**: bagged CART ensemble
//! - **accuracy**: error matrix with overall, consumer's and producer's accuracy
//! - **classify**: per-pixel prediction over a feature stack
//! - **postprocess**: label shift, majority filter and land mask

mod accuracy;
mod classify;
mod partition;
mod pipeline;
mod postprocess;
mod random_forest;
mod sampling;

pub use accuracy::{AccuracyReport, ConfusionMatrix};
pub use classify::classify_stack;
pub use partition::{Partition, RANDOM_COLUMN, partition, random_column};
pub use pipeline::{
    ClassificationParams, DEFAULT_MAX_CLASSES, DEFAULT_SEED, TrainedClassifier, train_and_evaluate,
};
pub use postprocess::{apply_land_mask, majority_filter, postprocess, shift_labels, to_u8};
pub use random_forest::{DecisionTree, RandomForest, RandomForestConfig};
pub use sampling::{Sample, SampleTable, sample_regions};
