//! Random forest hyperparameters

use covermap_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters of the forest classifier.
///
/// Defaults: 100 trees, `ceil(sqrt(n_features))` candidate variables per
/// split, at least 10 samples per leaf, half-size bags drawn with
/// replacement and no cap on nodes per tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub n_trees: usize,
    /// Candidate variables per split, `None` for `ceil(sqrt(n_features))`
    pub variables_per_split: Option<usize>,
    /// Minimum number of training samples in each leaf
    pub min_leaf_population: usize,
    /// Bag size as a fraction of the training set
    pub bag_fraction: f64,
    /// Maximum number of nodes per tree, `None` for unlimited
    pub max_nodes: Option<usize>,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            variables_per_split: None,
            min_leaf_population: 10,
            bag_fraction: 0.5,
            max_nodes: None,
            seed: 0,
        }
    }
}

impl RandomForestConfig {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_variables_per_split(mut self, n: usize) -> Self {
        self.variables_per_split = Some(n);
        self
    }

    pub fn with_min_leaf_population(mut self, n: usize) -> Self {
        self.min_leaf_population = n;
        self
    }

    pub fn with_bag_fraction(mut self, fraction: f64) -> Self {
        self.bag_fraction = fraction;
        self
    }

    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = Some(n);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(invalid("n_trees", self.n_trees, "must be at least 1"));
        }
        if self.min_leaf_population == 0 {
            return Err(invalid(
                "min_leaf_population",
                self.min_leaf_population,
                "must be at least 1",
            ));
        }
        if !(self.bag_fraction > 0.0 && self.bag_fraction <= 1.0) {
            return Err(invalid("bag_fraction", self.bag_fraction, "must be in (0, 1]"));
        }
        if self.variables_per_split == Some(0) {
            return Err(invalid("variables_per_split", 0, "must be at least 1"));
        }
        if let Some(n) = self.max_nodes
            && n == 0
        {
            return Err(invalid("max_nodes", n, "must be at least 1"));
        }
        Ok(())
    }

    /// Candidate variables per split for `n_features` inputs
    pub(crate) fn resolve_variables_per_split(&self, n_features: usize) -> Result<usize> {
        let n = self
            .variables_per_split
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);
        if n == 0 || n > n_features {
            return Err(invalid(
                "variables_per_split",
                n,
                &format!("must be between 1 and {}", n_features),
            ));
        }
        Ok(n)
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RandomForestConfig::default();
        assert_eq!(c.n_trees, 100);
        assert_eq!(c.min_leaf_population, 10);
        assert_eq!(c.bag_fraction, 0.5);
        assert!(c.validate().is_ok());
        assert_eq!(c.resolve_variables_per_split(30).unwrap(), 6);
    }

    #[test]
    fn test_invalid_values() {
        assert!(RandomForestConfig::default().with_n_trees(0).validate().is_err());
        assert!(RandomForestConfig::default().with_bag_fraction(1.5).validate().is_err());
        assert!(RandomForestConfig::default().with_max_nodes(0).validate().is_err());
        let c = RandomForestConfig::default().with_variables_per_split(31);
        assert!(c.resolve_variables_per_split(30).is_err());
    }

    #[test]
    fn test_partial_json() {
        let c: RandomForestConfig = serde_json::from_str(r#"{"n_trees": 20, "seed": 9}"#).unwrap();
        assert_eq!(c.n_trees, 20);
        assert_eq!(c.seed, 9);
        assert_eq!(c.min_leaf_population, 10);
    }
}
