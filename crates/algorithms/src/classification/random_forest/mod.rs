//! Random forest classifier
//!
//! Bootstrap-bagged CART trees with Gini splits on a random subset of the
//! features at each node.

mod config;
mod forest;
mod tree;

pub use config::RandomForestConfig;
pub use forest::RandomForest;
pub use tree::DecisionTree;
