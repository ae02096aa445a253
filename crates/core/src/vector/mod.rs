//! Point features for training and validation regions

use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value of a feature property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view; strings are parsed, booleans and nulls are not numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Null | AttributeValue::Bool(_) => None,
        }
    }
}

/// A point with named properties
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Point<f64>,
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: Point<f64>) -> Self {
        Self {
            geometry,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Numeric property value
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_property(key).and_then(AttributeValue::as_f64)
    }

    /// Non-negative integral property, as used for class labels
    pub fn get_class(&self, key: &str) -> Option<usize> {
        self.get_f64(key)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as usize)
    }
}

/// Ordered collection of point features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Concatenate collections, preserving order
    pub fn merge(mut self, other: FeatureCollection) -> Self {
        self.features.extend(other.features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
