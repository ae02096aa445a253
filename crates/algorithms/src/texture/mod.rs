//! Texture features from co-occurrence statistics

mod glcm;

pub use glcm::{GLCM_MEASURES, GlcmMeasure, GlcmParams, glcm_texture, gray_levels, texture_bands};
