//! # covermap algorithms
//!
//! Raster kernels and the classifier behind the land-cover pipeline.
//!
//! ## Algorithm categories
//!
//! - **imagery**: band math, cloud masks, median compositing, spectral indices
//! - **sar**: PALSAR DN calibration, HH/HV ratio, speckle filtering
//! - **texture**: sparse GLCM texture measures
//! - **statistics**: focal mean, median and mode
//! - **features**: classifier feature stack assembly
//! - **classification**: point sampling, random forest, accuracy, post-processing

pub mod classification;
pub mod features;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod sar;
pub mod statistics;
pub mod texture;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        AccuracyReport, ClassificationParams, ConfusionMatrix, RandomForest, RandomForestConfig,
        classify_stack, partition, postprocess, random_column, sample_regions, train_and_evaluate,
    };
    pub use crate::features::{FEATURE_BANDS, assemble_feature_stack};
    pub use crate::imagery::{OpticalSensor, optical_composite, spectral_indices};
    pub use crate::sar::{RadarParams, radar_composite};
    pub use crate::statistics::{FocalParams, FocalStatistic, focal_statistics};
    pub use crate::texture::{GlcmParams, texture_bands};
    pub use covermap_core::prelude::*;
}
