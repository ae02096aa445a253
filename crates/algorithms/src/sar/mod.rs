//! L-band radar backscatter: DN calibration, ratio band and speckle smoothing

mod calibrate;

pub use calibrate::{
    CALIBRATION_OFFSET_DB, RADAR_BANDS, RadarParams, SpeckleFilterParams, SpeckleFilterType,
    db_ratio, gamma0_db, median_dn, radar_composite, speckle_filter,
};
