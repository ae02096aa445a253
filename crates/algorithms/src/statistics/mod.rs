//! Moving-window statistics

pub mod focal;

pub use focal::{FocalParams, FocalStatistic, focal_statistics, mode};
