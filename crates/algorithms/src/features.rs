//! Classifier feature stack

use crate::imagery::{CANONICAL_BANDS, spectral_indices};
use crate::texture::{GlcmParams, texture_bands};
use covermap_core::{BandStack, Result};
use tracing::debug;

/// Bands fed to the classifier, in stack order
#[rustfmt::skip]
pub const FEATURE_BANDS: [&str; 30] = [
    "B1", "B2", "B3", "B4", "B5", "B7",
    "EVI", "LSWI", "NDTI", "NDVI", "SATVI",
    "HH", "HV", "RAT",
    "HH_asm", "HH_contrast", "HH_corr", "HH_var", "HH_idm", "HH_savg", "HH_ent", "HH_diss",
    "HV_asm", "HV_contrast", "HV_corr", "HV_var", "HV_idm", "HV_savg", "HV_ent", "HV_diss",
];

/// Stack the optical composite, its indices, the radar composite and its
/// textures, ordered as [`FEATURE_BANDS`].
pub fn assemble_feature_stack(optical: &BandStack, radar: &BandStack, glcm: &GlcmParams) -> Result<BandStack> {
    let reflectance = optical.select(&CANONICAL_BANDS)?;
    let indices = spectral_indices(&reflectance)?;
    let backscatter = radar.select(&["HH", "HV", "RAT"])?;
    let texture = texture_bands(&backscatter, glcm)?;
    debug!("Feature inputs: {} optical, {} index, {} radar, {} texture bands",
        reflectance.len(), indices.len(), backscatter.len(), texture.len());

    reflectance
        .concat(indices)?
        .concat(backscatter)?
        .concat(texture)?
        .select(&FEATURE_BANDS)
}
