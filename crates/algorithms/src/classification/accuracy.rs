//! Error matrix and accuracy statistics

use covermap_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error matrix indexed by label value.
///
/// `matrix[actual][predicted]` counts test samples of class `actual`
/// classified as `predicted`. Rows and columns run from 0 to the largest
/// label seen, so unused label values have empty rows and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[usize], predicted: &[usize]) -> Result<Self> {
        if actual.is_empty() {
            return Err(Error::Algorithm("no labels to compare".into()));
        }
        if actual.len() != predicted.len() {
            return Err(Error::InvalidParameter {
                name: "predicted",
                value: predicted.len().to_string(),
                reason: format!("expected {} predictions", actual.len()),
            });
        }
        let n = actual.iter().chain(predicted).max().map_or(0, |&m| m + 1);
        let mut matrix = vec![vec![0usize; n]; n];
        for (&a, &p) in actual.iter().zip(predicted) {
            matrix[a][p] += 1;
        }
        Ok(Self { matrix })
    }

    /// Build from explicit counts; rows must form a square matrix.
    pub fn from_rows(matrix: Vec<Vec<usize>>) -> Result<Self> {
        let n = matrix.len();
        if n == 0 || matrix.iter().any(|r| r.len() != n) {
            return Err(Error::InvalidDimensions { width: n, height: n });
        }
        Ok(Self { matrix })
    }

    pub fn n_classes(&self) -> usize {
        self.matrix.len()
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    fn row_total(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    fn col_total(&self, class: usize) -> usize {
        self.matrix.iter().map(|r| r[class]).sum()
    }

    /// Trace over total
    pub fn overall_accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Consumer's accuracy (precision) per class: diagonal over column total.
    ///
    /// `None` for classes never predicted.
    pub fn consumers_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.n_classes())
            .map(|c| ratio(self.matrix[c][c], self.col_total(c)))
            .collect()
    }

    /// Producer's accuracy (recall) per class: diagonal over row total.
    ///
    /// `None` for classes absent from the reference labels.
    pub fn producers_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.n_classes())
            .map(|c| ratio(self.matrix[c][c], self.row_total(c)))
            .collect()
    }

    /// Harmonic mean of consumer's and producer's accuracy per class
    pub fn f1(&self) -> Vec<Option<f64>> {
        self.consumers_accuracy()
            .into_iter()
            .zip(self.producers_accuracy())
            .map(|(ua, pa)| match (ua, pa) {
                (Some(u), Some(p)) if u + p > 0.0 => Some(2.0 * u * p / (u + p)),
                _ => None,
            })
            .collect()
    }

    /// Cohen's kappa, `None` when chance agreement is total
    pub fn kappa(&self) -> Option<f64> {
        let total = self.total() as f64;
        if total == 0.0 {
            return None;
        }
        let po = self.overall_accuracy();
        let pe: f64 = (0..self.n_classes())
            .map(|c| self.row_total(c) as f64 * self.col_total(c) as f64)
            .sum::<f64>()
            / (total * total);
        if (1.0 - pe).abs() < 1e-12 {
            return None;
        }
        Some((po - pe) / (1.0 - pe))
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "actual\\pred")?;
        for j in 0..self.n_classes() {
            write!(f, " {:>6}", j)?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "{:>11}", i)?;
            for v in row {
                write!(f, " {:>6}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Accuracy assessment of one classification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub n_train: usize,
    pub n_test: usize,
    pub confusion_matrix: ConfusionMatrix,
    pub overall_accuracy: f64,
    pub consumers_accuracy: Vec<Option<f64>>,
    pub producers_accuracy: Vec<Option<f64>>,
    pub f1: Vec<Option<f64>>,
    pub kappa: Option<f64>,
}

impl AccuracyReport {
    pub fn new(confusion_matrix: ConfusionMatrix, n_train: usize, n_test: usize) -> Self {
        Self {
            n_train,
            n_test,
            overall_accuracy: confusion_matrix.overall_accuracy(),
            consumers_accuracy: confusion_matrix.consumers_accuracy(),
            producers_accuracy: confusion_matrix.producers_accuracy(),
            f1: confusion_matrix.f1(),
            kappa: confusion_matrix.kappa(),
            confusion_matrix,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn fmt_per_class(values: &[Option<f64>]) -> String {
    values
        .iter()
        .map(|v| v.map_or_else(|| "-".to_string(), |x| format!("{:.4}", x)))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training, n = {}", self.n_train)?;
        writeln!(f, "Testing, n = {}", self.n_test)?;
        writeln!(f, "Error matrix:")?;
        write!(f, "{}", self.confusion_matrix)?;
        writeln!(f, "OA: {:.4}", self.overall_accuracy)?;
        writeln!(f, "UA: [{}]", fmt_per_class(&self.consumers_accuracy))?;
        writeln!(f, "PA: [{}]", fmt_per_class(&self.producers_accuracy))?;
        writeln!(f, "F1: [{}]", fmt_per_class(&self.f1))?;
        match self.kappa {
            Some(k) => writeln!(f, "Kappa: {:.4}", k),
            None => writeln!(f, "Kappa: -"),
        }
    }
}
