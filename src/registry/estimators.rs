//! Model artifacts
//!
//! Trained classifiers are exported as JSON documents tagged by `kind`.
//! Trees follow the usual layout: `x[feature] <= threshold` goes left.

use serde::Deserialize;

use crate::features::FeatureMatrix;
use crate::{AppError, AppResult};
use super::classifier::{check_width, label_for_score, Classifier, Predictor, ProbabilisticPredictor};

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LinearWeights),
    LinearSvm(LinearWeights),
    DecisionTree(DecisionTree),
    RandomForest { trees: Vec<DecisionTree> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearWeights {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

/// Split node when `feature` is set, leaf otherwise
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    /// Leaf class weights `[class0, class1]`
    #[serde(default)]
    pub value: Option<[f64; 2]>,
}

impl ModelArtifact {
    /// Validate the artifact and wrap it in its capability variant
    pub fn into_classifier(self) -> AppResult<Classifier> {
        Ok(match self {
            ModelArtifact::LogisticRegression(w) => {
                w.validate()?;
                Classifier::Probabilistic(Box::new(LogisticRegression { weights: w }))
            }
            ModelArtifact::LinearSvm(w) => {
                w.validate()?;
                Classifier::HardLabel(Box::new(LinearSvm { weights: w }))
            }
            ModelArtifact::DecisionTree(tree) => {
                tree.validate()?;
                Classifier::Probabilistic(Box::new(tree))
            }
            ModelArtifact::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(AppError::ManifestError("Random forest has no trees".to_string()));
                }
                for tree in &trees {
                    tree.validate()?;
                }
                Classifier::Probabilistic(Box::new(RandomForest { trees }))
            }
        })
    }
}

/// Hard label from `[p0, p1]`, using the same cut-off evaluation counts at
fn proba_label(p: &[f64]) -> u8 {
    match p {
        [_, p1] => label_for_score(*p1),
        _ => 0,
    }
}

// ============================================================================
// LINEAR MODELS
// ============================================================================

impl LinearWeights {
    fn validate(&self) -> AppResult<()> {
        if self.coefficients.is_empty() {
            return Err(AppError::ManifestError("Linear model has no coefficients".to_string()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::ManifestError("Linear model has non-finite weights".to_string()));
        }
        Ok(())
    }

    fn decision(&self, x: &FeatureMatrix) -> AppResult<Vec<f64>> {
        check_width(x, self.coefficients.len())?;
        Ok(x
            .rows()
            .map(|row| {
                row.iter()
                    .zip(&self.coefficients)
                    .map(|(v, w)| v * w)
                    .sum::<f64>()
                    + self.intercept
            })
            .collect())
    }
}

#[derive(Debug)]
struct LogisticRegression {
    weights: LinearWeights,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Predictor for LogisticRegression {
    fn n_features(&self) -> Option<usize> {
        Some(self.weights.coefficients.len())
    }

    fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
        Ok(self.predict_proba(x)?.iter().map(|p| proba_label(p)).collect())
    }
}

impl ProbabilisticPredictor for LogisticRegression {
    fn predict_proba(&self, x: &FeatureMatrix) -> AppResult<Vec<Vec<f64>>> {
        Ok(self
            .weights
            .decision(x)?
            .into_iter()
            .map(|z| {
                let p1 = sigmoid(z);
                vec![1.0 - p1, p1]
            })
            .collect())
    }
}

#[derive(Debug)]
struct LinearSvm {
    weights: LinearWeights,
}

impl Predictor for LinearSvm {
    fn n_features(&self) -> Option<usize> {
        Some(self.weights.coefficients.len())
    }

    fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
        Ok(self
            .weights
            .decision(x)?
            .into_iter()
            .map(|d| u8::from(d > 0.0))
            .collect())
    }
}

// ============================================================================
// TREES
// ============================================================================

impl DecisionTree {
    /// Children must point forward so traversal always terminates
    fn validate(&self) -> AppResult<()> {
        if self.nodes.is_empty() {
            return Err(AppError::ManifestError("Decision tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match (node.feature, node.left, node.right, node.value) {
                (Some(_), Some(l), Some(r), _) => {
                    if l <= i || r <= i || l >= self.nodes.len() || r >= self.nodes.len() {
                        return Err(AppError::ManifestError(format!(
                            "Decision tree node {} has invalid children",
                            i
                        )));
                    }
                }
                (None, _, _, Some([c0, c1])) => {
                    if !(c0 >= 0.0 && c1 >= 0.0 && c0 + c1 > 0.0) {
                        return Err(AppError::ManifestError(format!(
                            "Decision tree leaf {} has invalid class weights",
                            i
                        )));
                    }
                }
                _ => {
                    return Err(AppError::ManifestError(format!(
                        "Decision tree node {} is neither a split nor a leaf",
                        i
                    )))
                }
            }
        }
        Ok(())
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes.iter().filter_map(|n| n.feature).max()
    }

    fn ensure_width(&self, x: &FeatureMatrix) -> AppResult<()> {
        match self.max_feature() {
            Some(f) if f >= x.width() => Err(AppError::DataError(format!(
                "Model splits on feature {} but only {} features were encoded",
                f,
                x.width()
            ))),
            _ => Ok(()),
        }
    }

    fn leaf_proba(&self, row: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match (node.feature, node.left, node.right) {
                (Some(f), Some(l), Some(r)) => {
                    idx = if row[f] <= node.threshold { l } else { r };
                }
                _ => {
                    // validate() guarantees leaves carry positive weights
                    let [c0, c1] = node.value.unwrap_or([1.0, 0.0]);
                    let total = c0 + c1;
                    return [c0 / total, c1 / total];
                }
            }
        }
    }
}

impl Predictor for DecisionTree {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
        Ok(self.predict_proba(x)?.iter().map(|p| proba_label(p)).collect())
    }
}

impl ProbabilisticPredictor for DecisionTree {
    fn predict_proba(&self, x: &FeatureMatrix) -> AppResult<Vec<Vec<f64>>> {
        self.ensure_width(x)?;
        Ok(x.rows().map(|row| self.leaf_proba(row).to_vec()).collect())
    }
}

#[derive(Debug)]
struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl Predictor for RandomForest {
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, x: &FeatureMatrix) -> AppResult<Vec<u8>> {
        Ok(self.predict_proba(x)?.iter().map(|p| proba_label(p)).collect())
    }
}

impl ProbabilisticPredictor for RandomForest {
    fn predict_proba(&self, x: &FeatureMatrix) -> AppResult<Vec<Vec<f64>>> {
        for tree in &self.trees {
            tree.ensure_width(x)?;
        }
        let n = self.trees.len() as f64;
        Ok(x
            .rows()
            .map(|row| {
                let [s0, s1] = self.trees.iter().fold([0.0, 0.0], |acc, tree| {
                    let [p0, p1] = tree.leaf_proba(row);
                    [acc[0] + p0, acc[1] + p1]
                });
                vec![s0 / n, s1 / n]
            })
            .collect())
    }
}
