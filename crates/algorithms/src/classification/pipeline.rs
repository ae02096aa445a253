//! Train-and-evaluate workflow over labelled points

use super::accuracy::{AccuracyReport, ConfusionMatrix};
use super::partition::{RANDOM_COLUMN, partition, random_column};
use super::random_forest::{RandomForest, RandomForestConfig};
use super::sampling::{SampleTable, sample_regions};
use crate::features::FEATURE_BANDS;
use covermap_core::vector::FeatureCollection;
use covermap_core::{BandStack, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Seed shared by the split and the forest
pub const DEFAULT_SEED: u64 = 2015;

/// Land-cover classes before the +1 shift
pub const DEFAULT_MAX_CLASSES: usize = 5;

/// Settings of one classification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationParams {
    /// Point attribute holding the class id
    pub class_property: String,
    /// Bands used as features, in order
    pub bands: Vec<String>,
    pub random_column: String,
    /// Points with `random <= split_threshold` train, the rest test
    pub split_threshold: f64,
    /// Seeds both the random column and the forest; `forest.seed` is overridden
    pub seed: u64,
    pub forest: RandomForestConfig,
    /// Labels must lie in `0..max_classes`
    pub max_classes: usize,
    /// Fail when a class present in training has fewer samples
    pub min_samples_per_class: Option<usize>,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            class_property: "ClassID2".into(),
            bands: FEATURE_BANDS.iter().map(|b| b.to_string()).collect(),
            random_column: RANDOM_COLUMN.into(),
            split_threshold: 0.7,
            seed: DEFAULT_SEED,
            forest: RandomForestConfig::default(),
            max_classes: DEFAULT_MAX_CLASSES,
            min_samples_per_class: None,
        }
    }
}

/// Trained forest with its held-out accuracy
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    pub forest: RandomForest,
    pub report: AccuracyReport,
    pub training: SampleTable,
    pub testing: SampleTable,
}

/// Split the points, train a forest on the training share and score it on
/// the testing share.
pub fn train_and_evaluate(
    stack: &BandStack,
    points: &FeatureCollection,
    params: &ClassificationParams,
) -> Result<TrainedClassifier> {
    let points = random_column(points, &params.random_column, params.seed);
    let split = partition(&points, &params.random_column, params.split_threshold)?;
    info!(
        "Split {} points: {} training, {} testing",
        points.len(),
        split.train.len(),
        split.test.len()
    );

    let training = sample_regions(stack, &split.train, &params.bands, &params.class_property)?;
    let testing = sample_regions(stack, &split.test, &params.bands, &params.class_property)?;
    if training.is_empty() {
        return Err(Error::EmptyPartition { partition: "training" });
    }
    if testing.is_empty() {
        return Err(Error::EmptyPartition { partition: "testing" });
    }
    check_labels(&training, params.max_classes)?;
    check_labels(&testing, params.max_classes)?;
    if let Some(required) = params.min_samples_per_class {
        check_class_counts(&training, required)?;
    }
    info!("Training, n = {}", training.len());
    info!("Testing, n = {}", testing.len());

    let config = params.forest.clone().with_seed(params.seed);
    let forest = RandomForest::train(&training, &config)?;
    let predicted = forest.predict_batch(&testing.features());
    let matrix = ConfusionMatrix::from_labels(&testing.labels(), &predicted)?;
    let report = AccuracyReport::new(matrix, training.len(), testing.len());
    info!("Overall accuracy {:.4}", report.overall_accuracy);

    Ok(TrainedClassifier {
        forest,
        report,
        training,
        testing,
    })
}

fn check_labels(samples: &SampleTable, n_classes: usize) -> Result<()> {
    match samples.samples.iter().find(|s| s.class_id >= n_classes) {
        Some(s) => Err(Error::ClassOutOfRange {
            class: s.class_id,
            n_classes,
        }),
        None => Ok(()),
    }
}

fn check_class_counts(samples: &SampleTable, required: usize) -> Result<()> {
    match samples.class_counts().into_iter().find(|&(_, n)| n < required) {
        Some((class, count)) => Err(Error::InsufficientSamples {
            class,
            count,
            required,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covermap_core::vector::{AttributeValue, Feature};
    use covermap_core::{GeoTransform, Raster};
    use geo_types::Point;

    /// Two bands on a 20x20 grid; class = column band / 4
    fn fixture() -> (BandStack, FeatureCollection) {
        let gt = GeoTransform::new(0.0, 20.0, 1.0, -1.0);
        let mut a = Raster::from_vec((0..400).map(|i| (i % 20) as f64).collect(), 20, 20).unwrap();
        a.set_transform(gt);
        let mut b = Raster::from_vec((0..400).map(|i| (i / 20) as f64).collect(), 20, 20).unwrap();
        b.set_transform(gt);
        let stack = BandStack::from_bands([("a", a), ("b", b)]).unwrap();

        let points = (0..400)
            .map(|i| {
                let (row, col) = (i / 20, i % 20);
                Feature::new(Point::new(col as f64 + 0.5, 20.0 - row as f64 - 0.5))
                    .with_property("ClassID2", AttributeValue::Int((col / 4) as i64))
            })
            .collect();
        (stack, points)
    }

    fn params() -> ClassificationParams {
        ClassificationParams {
            bands: vec!["a".into(), "b".into()],
            forest: RandomForestConfig::default().with_n_trees(20),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let p = ClassificationParams::default();
        assert_eq!(p.class_property, "ClassID2");
        assert_eq!(p.bands.len(), 30);
        assert_eq!(p.split_threshold, 0.7);
        assert_eq!(p.seed, 2015);
        assert_eq!(p.max_classes, 5);
    }

    #[test]
    fn test_split_seed_also_seeds_forest() {
        let (stack, points) = fixture();
        let p = ClassificationParams { seed: 7, ..params() };
        let result = train_and_evaluate(&stack, &points, &p).unwrap();
        assert_eq!(result.forest.config().seed, 7);

        let ignored = ClassificationParams {
            forest: p.forest.clone().with_seed(99),
            ..p.clone()
        };
        let again = train_and_evaluate(&stack, &points, &ignored).unwrap();
        assert_eq!(again.forest, result.forest);
    }

    #[test]
    fn test_label_outside_legend_is_rejected() {
        let (stack, points) = fixture();
        let points: FeatureCollection = points
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let mut f = f.clone();
                if i == 0 {
                    f.set_property("ClassID2", AttributeValue::Float(1e19));
                }
                f
            })
            .collect();
        let p = ClassificationParams {
            forest: RandomForestConfig::default().with_n_trees(2),
            ..params()
        };
        assert!(matches!(
            train_and_evaluate(&stack, &points, &p),
            Err(Error::ClassOutOfRange { n_classes: 5, .. })
        ));

        // Labels 3 and 4 exceed a three-class legend
        let narrow = ClassificationParams { max_classes: 3, ..p };
        assert!(matches!(
            train_and_evaluate(&stack, &points, &narrow),
            Err(Error::ClassOutOfRange { n_classes: 3, .. })
        ));
    }

    #[test]
    fn test_train_and_evaluate() {
        let (stack, points) = fixture();
        let result = train_and_evaluate(&stack, &points, &params()).unwrap();
        assert_eq!(result.training.len() + result.testing.len(), 400);
        assert_eq!(result.report.n_test, result.testing.len());
        assert!(result.report.overall_accuracy > 0.9);
        assert_eq!(result.forest.feature_names().to_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_deterministic() {
        let (stack, points) = fixture();
        let a = train_and_evaluate(&stack, &points, &params()).unwrap();
        let b = train_and_evaluate(&stack, &points, &params()).unwrap();
        assert_eq!(a.report, b.report);
        assert_eq!(a.forest, b.forest);
    }

    #[test]
    fn test_insufficient_samples() {
        let (stack, points) = fixture();
        let p = ClassificationParams {
            min_samples_per_class: Some(1000),
            ..params()
        };
        assert!(matches!(
            train_and_evaluate(&stack, &points, &p),
            Err(Error::InsufficientSamples { required: 1000, .. })
        ));
    }

    #[test]
    fn test_no_points_inside_stack() {
        let (stack, points) = fixture();
        let far: FeatureCollection = points
            .iter()
            .map(|f| {
                let mut f = f.clone();
                f.geometry = Point::new(f.geometry.x() + 100.0, f.geometry.y());
                f
            })
            .collect();
        assert!(matches!(
            train_and_evaluate(&stack, &far, &params()),
            Err(Error::EmptyPartition { partition: "training" })
        ));
    }
}
