//! Bagged ensemble of decision trees

use super::config::RandomForestConfig;
use super::tree::{DecisionTree, TreeParams};
use crate::classification::sampling::SampleTable;
use crate::maybe_rayon::*;
use covermap_core::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// A trained random forest classifier.
///
/// Each tree votes for one class; the most voted class wins and ties go to
/// the lowest label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    n_classes: usize,
    config: RandomForestConfig,
}

/// Draw `draw_count` row indices with replacement
fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect()
}

impl RandomForest {
    /// Train on a sample table.
    pub fn train(samples: &SampleTable, config: &RandomForestConfig) -> Result<Self> {
        Self::fit(&samples.features(), &samples.labels(), &samples.band_names, config)
    }

    /// Train on a row-major feature matrix.
    ///
    /// Every tree gets its own seed drawn from `config.seed`, so results do
    /// not depend on the number of worker threads.
    #[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
        config: &RandomForestConfig,
    ) -> Result<Self> {
        config.validate()?;
        if features.is_empty() {
            return Err(Error::Algorithm("cannot train a forest without samples".into()));
        }
        if features.len() != labels.len() {
            return Err(Error::InvalidParameter {
                name: "labels",
                value: labels.len().to_string(),
                reason: format!("expected one label per sample ({})", features.len()),
            });
        }
        let n_features = feature_names.len();
        if n_features == 0 {
            return Err(Error::Algorithm("cannot train a forest without features".into()));
        }
        if let Some((i, row)) = features.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(Error::InvalidParameter {
                name: "features",
                value: row.len().to_string(),
                reason: format!("sample {} does not have {} values", i, n_features),
            });
        }
        if features.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::Algorithm("training samples contain non-finite values".into()));
        }

        let n_samples = features.len();
        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let params = TreeParams {
            variables_per_split: config.resolve_variables_per_split(n_features)?,
            min_leaf_population: config.min_leaf_population,
            max_nodes: config.max_nodes,
            n_classes,
        };
        let draw_count = ((n_samples as f64 * config.bag_fraction).ceil() as usize).max(1);

        info!(
            n_trees = config.n_trees,
            n_features,
            n_classes,
            variables_per_split = params.variables_per_split,
            "training random forest"
        );

        let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
        let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

        let trees: Vec<DecisionTree> = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let bag = bootstrap_sample(n_samples, draw_count, &mut rng);
                DecisionTree::fit(features, labels, bag, &params, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        let total_nodes: usize = trees.iter().map(|t| t.n_nodes()).sum();
        debug!(total_nodes, "forest grown");

        Ok(Self {
            trees,
            feature_names: feature_names.to_vec(),
            n_classes,
            config: config.clone(),
        })
    }

    /// Class of one feature vector, ordered as [`feature_names`](Self::feature_names)
    pub fn predict(&self, sample: &[f64]) -> usize {
        let mut votes = vec![0usize; self.n_classes.max(1)];
        self.vote(sample, &mut votes)
    }

    /// Predict with a caller-provided vote buffer of length `n_classes`
    pub(crate) fn vote(&self, sample: &[f64], votes: &mut [usize]) -> usize {
        votes.iter_mut().for_each(|v| *v = 0);
        for tree in &self.trees {
            votes[tree.predict(sample)] += 1;
        }
        let mut best = 0;
        for (class, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = class;
            }
        }
        best
    }

    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Vec<usize> {
        samples.par_iter().map(|s| self.predict(s)).collect()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// One more than the largest training label
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    /// Share of splits using each feature, summing to 1 when any split exists
    pub fn split_frequencies(&self) -> Vec<(String, f64)> {
        let mut counts = vec![0usize; self.feature_names.len()];
        for tree in &self.trees {
            tree.split_counts(&mut counts);
        }
        let total = counts.iter().sum::<usize>().max(1) as f64;
        self.feature_names
            .iter()
            .cloned()
            .zip(counts.into_iter().map(|c| c as f64 / total))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::AssetNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
