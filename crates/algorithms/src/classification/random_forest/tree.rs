//! CART decision tree with Gini splits

use covermap_core::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tree node stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub variables_per_split: usize,
    pub min_leaf_population: usize,
    pub max_nodes: Option<usize>,
    pub n_classes: usize,
}

/// A fitted classification tree.
///
/// Samples go left when `value <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Gini impurity of a class histogram holding `total` samples
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn class_counts(labels: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[labels[i]] += 1;
    }
    counts
}

/// Most frequent class, lowest label on ties
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = class;
        }
    }
    best
}

impl DecisionTree {
    /// Grow a tree on the rows of `features` listed in `indices`.
    ///
    /// `indices` may repeat rows (bootstrap bags).
    pub(crate) fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::Algorithm("cannot grow a tree on an empty bag".into()));
        }
        let n_features = features[indices[0]].len();
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
        };

        // Depth-first growth; each stack entry is (node slot, samples)
        tree.nodes.push(Node::Leaf { class: 0 });
        let mut stack = vec![(0usize, indices)];
        let mut feature_pool: Vec<usize> = (0..n_features).collect();

        while let Some((slot, idx)) = stack.pop() {
            let counts = class_counts(labels, &idx, params.n_classes);
            let class = majority(&counts);
            let node_impurity = gini(&counts, idx.len());

            let can_split = node_impurity > 0.0
                && idx.len() >= 2 * params.min_leaf_population
                && params.max_nodes.is_none_or(|max| tree.nodes.len() + 2 <= max);

            let split = if can_split {
                best_split(features, labels, &idx, node_impurity, params, &mut feature_pool, rng)
            } else {
                None
            };

            match split {
                Some(s) => {
                    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
                        .iter()
                        .partition(|&&i| features[i][s.feature] <= s.threshold);
                    let left = tree.nodes.len();
                    let right = left + 1;
                    tree.nodes.push(Node::Leaf { class: 0 });
                    tree.nodes.push(Node::Leaf { class: 0 });
                    tree.nodes[slot] = Node::Split {
                        feature: s.feature,
                        threshold: s.threshold,
                        left,
                        right,
                    };
                    stack.push((right, right_idx));
                    stack.push((left, left_idx));
                }
                None => tree.nodes[slot] = Node::Leaf { class },
            }
        }

        Ok(tree)
    }

    /// Class of one feature vector
    pub fn predict(&self, sample: &[f64]) -> usize {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Split count per feature
    pub(crate) fn split_counts(&self, out: &mut [usize]) {
        for node in &self.nodes {
            if let Node::Split { feature, .. } = node {
                out[*feature] += 1;
            }
        }
    }
}

/// Best Gini split over a random subset of features, if any lowers impurity.
fn best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    idx: &[usize],
    node_impurity: f64,
    params: &TreeParams,
    feature_pool: &mut [usize],
    rng: &mut impl Rng,
) -> Option<SplitCandidate> {
    let n_features = feature_pool.len();
    let n = idx.len();
    let min_leaf = params.min_leaf_population;
    let mut best: Option<SplitCandidate> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

    // Partial Fisher-Yates: the first `k` slots become the candidate set
    for i in 0..params.variables_per_split.min(n_features) {
        let j = rng.gen_range(i..n_features);
        feature_pool.swap(i, j);
        let feature = feature_pool[i];

        sorted.clear();
        sorted.extend(idx.iter().map(|&s| (features[s][feature], labels[s])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = vec![0usize; params.n_classes];
        let mut right = vec![0usize; params.n_classes];
        for &(_, label) in &sorted {
            right[label] += 1;
        }

        for pos in 0..n - 1 {
            let (value, label) = sorted[pos];
            left[label] += 1;
            right[label] -= 1;

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf {
                continue;
            }
            if n_right < min_leaf {
                break;
            }
            let next = sorted[pos + 1].0;
            if value == next {
                continue;
            }

            let impurity =
                (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right)) / n as f64;
            if impurity < node_impurity - 1e-12
                && best.as_ref().is_none_or(|b| impurity < b.impurity)
            {
                best = Some(SplitCandidate {
                    feature,
                    threshold: value + (next - value) / 2.0,
                    impurity,
                });
            }
        }
    }

    best
}
