use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ArtifactError;

// --- Public Data Structures ---
// These structs define the human-readable format of a fitted classifier when it is
// exported to a TOML or JSON artifact.

/// A fitted binary classifier. The `kind` key selects the model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

/// An ensemble of classification trees voting by averaged class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class labels, in the order used by every leaf's `value` vector.
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

/// One tree stored as a flat node array. Node 0 is the root, and children always sit
/// after their parent, so evaluation walks strictly forward through the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go to `left`, all others to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class training weight that reached this leaf.
    Leaf { value: Vec<f64> },
}

/// A linear decision boundary over the scaled features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Exactly two labels: negative class first, positive class second.
    pub classes: Vec<i64>,
    pub coef: Vec<f64>,
    pub intercept: f64,
}

#[derive(Error, Debug, PartialEq)]
pub enum ClassifierError {
    #[error("The classifier was trained on {expected} features, but the row has {found}.")]
    DimensionMismatch { found: usize, expected: usize },
    #[error("Feature {index} has non-finite value {value}.")]
    NonFiniteFeature { index: usize, value: f64 },
}

impl Classifier {
    pub fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(forest) => forest.n_features,
            Self::LogisticRegression(model) => model.coef.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
        }
    }

    /// Structural checks run once at load time. After this passes, `predict` cannot
    /// index out of bounds or loop.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::RandomForest(forest) => forest.validate(),
            Self::LogisticRegression(model) => model.validate(),
        }
    }

    /// Predicts the class label for one scaled row.
    pub fn predict(&self, row: ArrayView1<f64>) -> Result<i64, ClassifierError> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(ClassifierError::DimensionMismatch {
                found: row.len(),
                expected,
            });
        }
        if let Some((index, &value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature { index, value });
        }

        Ok(match self {
            Self::RandomForest(forest) => forest.predict(row),
            Self::LogisticRegression(model) => model.predict(row),
        })
    }
}

impl RandomForest {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.is_empty() {
            return Err(invalid("random forest has no classes"));
        }
        if self.trees.is_empty() {
            return Err(invalid("random forest has no trees"));
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|reason| invalid(format!("tree {tree_idx}: {reason}")))?;
        }
        Ok(())
    }

    /// Class probabilities averaged over all trees, in `classes` order.
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> Vec<f64> {
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let value = tree.leaf_value(row);
            let weight: f64 = value.iter().sum();
            if weight > 0.0 {
                for (total, v) in totals.iter_mut().zip(value) {
                    *total += v / weight;
                }
            }
        }
        let n_trees = self.trees.len() as f64;
        totals.iter_mut().for_each(|t| *t /= n_trees);
        totals
    }

    fn predict(&self, row: ArrayView1<f64>) -> i64 {
        let proba = self.predict_proba(row);
        // First maximum wins on ties.
        let mut best = 0;
        for (idx, &p) in proba.iter().enumerate().skip(1) {
            if p > proba[best] {
                best = idx;
            }
        }
        self.classes[best]
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature}, but only {n_features} exist"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= n_nodes {
                            return Err(format!(
                                "node {idx} points to child {child}, outside {}..{n_nodes}",
                                idx + 1
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {idx} has {} class weights, expected {n_classes}",
                            value.len()
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("leaf {idx} has a negative or non-finite weight"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.len() != 2 {
            return Err(invalid(format!(
                "logistic regression needs exactly 2 classes, found {}",
                self.classes.len()
            )));
        }
        if self.coef.is_empty() {
            return Err(invalid("logistic regression has no coefficients"));
        }
        if !self.intercept.is_finite() || self.coef.iter().any(|c| !c.is_finite()) {
            return Err(invalid("logistic regression has non-finite parameters"));
        }
        Ok(())
    }

    pub fn decision_function(&self, row: ArrayView1<f64>) -> f64 {
        row.dot(&ArrayView1::from(self.coef.as_slice())) + self.intercept
    }

    fn predict(&self, row: ArrayView1<f64>) -> i64 {
        if self.decision_function(row) > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }
}

fn invalid(reason: impl Into<String>) -> ArtifactError {
    ArtifactError::InvalidClassifier(reason.into())
}
