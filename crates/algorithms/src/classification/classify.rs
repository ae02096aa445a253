//! Per-pixel classification of a feature stack

use super::random_forest::RandomForest;
use crate::imagery::build_output;
use crate::maybe_rayon::*;
use covermap_core::{BandStack, Raster, Result};
use tracing::info;

/// Classify every pixel of `stack` with a trained forest.
///
/// Bands are taken in the forest's feature order, so the stack may carry
/// extra bands. Pixels where any feature is NaN stay NaN.
///
/// # Returns
/// Raster of class labels on the stack's grid.
pub fn classify_stack(stack: &BandStack, forest: &RandomForest) -> Result<Raster<f64>> {
    let features = stack.select(forest.feature_names())?;
    let (rows, cols) = features.shape();
    let n_features = features.len();
    let n_classes = forest.n_classes().max(1);
    info!("Classifying {}x{} pixels with {} trees", rows, cols, forest.n_trees());

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut pixel = vec![0.0; n_features];
            let mut votes = vec![0usize; n_classes];
            for (col, out) in row_data.iter_mut().enumerate() {
                unsafe { features.pixel_into_unchecked(row, col, &mut pixel) };
                if pixel.iter().any(|v| v.is_nan()) {
                    continue;
                }
                *out = forest.vote(&pixel, &mut votes) as f64;
            }
            row_data
        })
        .collect();

    build_output(&features.bands()[0], rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::RandomForestConfig;
    use covermap_core::GeoTransform;

    #[test]
    fn test_classify_stack_masks_nan() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![if i % 2 == 0 { 0.1 } else { 0.9 }, 1.0]).collect();
        let y: Vec<usize> = (0..60).map(|i| i % 2).collect();
        let names = vec!["NDVI".to_string(), "HH".to_string()];
        let config = RandomForestConfig::default()
            .with_n_trees(5)
            .with_variables_per_split(2)
            .with_min_leaf_population(1)
            .with_bag_fraction(1.0);
        let forest = RandomForest::fit(&x, &y, &names, &config).unwrap();

        let mut ndvi = Raster::from_vec(vec![0.1, 0.9, f64::NAN, 0.85], 2, 2).unwrap();
        ndvi.set_transform(GeoTransform::new(10.0, 20.0, 30.0, -30.0));
        let hh = ndvi.like(1.0);
        // Extra band and reversed order: selection follows the forest
        let stack = BandStack::from_bands([("HH", hh), ("B1", ndvi.like(0.0)), ("NDVI", ndvi)]).unwrap();

        let classes = classify_stack(&stack, &forest).unwrap();
        assert_eq!(classes.get(0, 0).unwrap(), 0.0);
        assert_eq!(classes.get(0, 1).unwrap(), 1.0);
        assert!(classes.get(1, 0).unwrap().is_nan());
        assert_eq!(classes.get(1, 1).unwrap(), 1.0);
        assert_eq!(classes.transform().origin_x, 10.0);
    }

    #[test]
    fn test_missing_feature_band() {
        let x = vec![vec![0.0]; 20];
        let y = vec![0; 20];
        let forest =
            RandomForest::fit(&x, &y, &["EVI".to_string()], &RandomForestConfig::default().with_n_trees(1)).unwrap();
        let stack = BandStack::from_bands([("NDVI", Raster::<f64>::filled(2, 2, 0.0))]).unwrap();
        assert!(classify_stack(&stack, &forest).is_err());
    }
}
