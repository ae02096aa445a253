//! Optical imagery: band math, cloud masking, compositing and spectral indices

mod band_math;
mod cloud_mask;
mod composite;
mod indices;
mod sensor;

pub(crate) use band_math::{build_output, check_dimensions};
pub use band_math::{band_math, band_math_n, band_test};
pub use cloud_mask::{
    BRIGHTNESS_THRESHOLD, brightness_mask, clear_sky_mask, positivity_mask, spectral_cloud_mask,
};
pub use composite::{median, median_composite, optical_composite};
pub use indices::{
    EviParams, INDEX_BANDS, SatviParams, evi, lswi, ndti, ndvi, normalized_difference, satvi,
    spectral_indices,
};
pub use sensor::{CANONICAL_BANDS, OpticalSensor};
