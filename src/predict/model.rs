// src/predict/model.rs
//! Regression model seam plus the on-disk artifact formats we can load.
//!
//! The rest of the crate only relies on `RegressionModel`: a vector of
//! features in, one score out. Anything satisfying that can be plugged in.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::predict::features::FEATURE_COUNT;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} features, got {got}")]
    Shape { expected: usize, got: usize },
    #[error("{0}")]
    Internal(String),
}

pub trait RegressionModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
    /// Model name/type for logs.
    fn name(&self) -> &str;
}

/// Shared handle used by the predictor.
pub type DynModel = Arc<dyn RegressionModel>;

/// Wraps any `Fn(&[f64]) -> f64` as a model with a fixed input width.
pub struct FnModel<F> {
    width: usize,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(width: usize, f: F) -> Self {
        Self { width, f }
    }
}

impl<F> RegressionModel for FnModel<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.width, features)?;
        Ok((self.f)(features))
    }

    fn name(&self) -> &str {
        "fn"
    }
}

fn check_shape(expected: usize, features: &[f64]) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::Shape {
            expected,
            got: features.len(),
        });
    }
    Ok(())
}

/* ----------------------------
Artifacts (JSON)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

/// `intercept + Σ coefficients[i] * x[i]`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl RegressionModel for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_shape(self.coefficients.len(), features)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Boosted regression trees: `base_score + learning_rate * Σ tree(x)`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Node 0 is the root. Splits send `x[feature] < threshold` left.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl Tree {
    /// Children must point forward and stay in range, so evaluation always
    /// terminates at a leaf.
    fn validate(&self, width: usize) -> anyhow::Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (i, n) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                threshold,
            } = n
            {
                if *feature >= width {
                    bail!("node {i}: feature {feature} out of range");
                }
                if !threshold.is_finite() {
                    bail!("node {i}: non-finite threshold");
                }
                for c in [*left, *right] {
                    if c <= i || c >= self.nodes.len() {
                        bail!("node {i}: child {c} out of range");
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        ModelError::Internal(format!("feature {feature} missing"))
                    })?;
                    idx = if v < *threshold { *left } else { *right };
                }
                None => return Err(ModelError::Internal(format!("dangling node {idx}"))),
            }
        }
    }
}

impl RegressionModel for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_shape(FEATURE_COUNT, features)?;
        let mut sum = 0.0;
        for t in &self.trees {
            sum += t.eval(features)?;
        }
        Ok(self.base_score + self.learning_rate * sum)
    }

    fn name(&self) -> &str {
        "tree_ensemble"
    }
}

impl ModelArtifact {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let art: ModelArtifact = serde_json::from_str(s).context("parsing model artifact")?;
        art.validate()?;
        Ok(art)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self {
            ModelArtifact::Linear(m) => {
                if m.coefficients.len() != FEATURE_COUNT {
                    bail!(
                        "linear model has {} coefficients, expected {FEATURE_COUNT}",
                        m.coefficients.len()
                    );
                }
                if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                    bail!("linear model has non-finite parameters");
                }
            }
            ModelArtifact::TreeEnsemble(m) => {
                if !m.base_score.is_finite() || !m.learning_rate.is_finite() {
                    bail!("tree ensemble has non-finite parameters");
                }
                for (i, t) in m.trees.iter().enumerate() {
                    t.validate(FEATURE_COUNT)
                        .with_context(|| format!("tree {i}"))?;
                }
            }
        }
        Ok(())
    }

    pub fn into_model(self) -> DynModel {
        match self {
            ModelArtifact::Linear(m) => Arc::new(m),
            ModelArtifact::TreeEnsemble(m) => Arc::new(m),
        }
    }
}

/// Read, validate and wrap a model artifact.
pub fn load_model(path: &Path) -> anyhow::Result<DynModel> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading model artifact {}", path.display()))?;
    let art = ModelArtifact::from_json_str(&data)
        .with_context(|| format!("loading model artifact {}", path.display()))?;
    Ok(art.into_model())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR: &str = r#"{
        "kind": "linear",
        "intercept": 1.0,
        "coefficients": [0.5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    }"#;

    const TREES: &str = r#"{
        "kind": "tree_ensemble",
        "base_score": 5.0,
        "learning_rate": 0.5,
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 3.0, "left": 1, "right": 2 },
                { "leaf": 2.0 },
                { "leaf": -2.0 }
            ] },
            { "nodes": [ { "leaf": 1.0 } ] }
        ]
    }"#;

    fn x(age: f64) -> Vec<f64> {
        let mut v = vec![0.0; FEATURE_COUNT];
        v[0] = age;
        v
    }

    #[test]
    fn linear_model_evaluates() {
        let m = ModelArtifact::from_json_str(LINEAR).unwrap().into_model();
        assert_eq!(m.name(), "linear");
        assert_eq!(m.predict(&x(4.0)).unwrap(), 3.0);
    }

    #[test]
    fn linear_model_rejects_wrong_width() {
        let m = ModelArtifact::from_json_str(LINEAR).unwrap().into_model();
        assert_eq!(
            m.predict(&[1.0, 2.0]),
            Err(ModelError::Shape {
                expected: FEATURE_COUNT,
                got: 2
            })
        );
    }

    #[test]
    fn tree_ensemble_walks_splits() {
        let m = ModelArtifact::from_json_str(TREES).unwrap().into_model();
        // young: 5 + 0.5 * (2 + 1)
        assert_eq!(m.predict(&x(1.0)).unwrap(), 6.5);
        // old: 5 + 0.5 * (-2 + 1)
        assert_eq!(m.predict(&x(10.0)).unwrap(), 4.5);
    }

    #[test]
    fn malformed_artifacts_fail_to_load() {
        let short = r#"{ "kind": "linear", "intercept": 0.0, "coefficients": [1.0] }"#;
        assert!(ModelArtifact::from_json_str(short).is_err());

        let cyclic = r#"{ "kind": "tree_ensemble", "base_score": 0.0, "trees": [
            { "nodes": [ { "feature": 0, "threshold": 1.0, "left": 0, "right": 0 } ] } ] }"#;
        assert!(ModelArtifact::from_json_str(cyclic).is_err());

        let bad_feature = r#"{ "kind": "tree_ensemble", "base_score": 0.0, "trees": [
            { "nodes": [ { "feature": 11, "threshold": 1.0, "left": 1, "right": 2 },
                         { "leaf": 0.0 }, { "leaf": 0.0 } ] } ] }"#;
        assert!(ModelArtifact::from_json_str(bad_feature).is_err());

        assert!(ModelArtifact::from_json_str(r#"{ "kind": "pickle" }"#).is_err());
    }

    #[test]
    fn fn_model_checks_width() {
        let m = FnModel::new(FEATURE_COUNT, |x: &[f64]| x.iter().sum());
        assert_eq!(m.predict(&x(2.0)).unwrap(), 2.0);
        assert!(m.predict(&[]).is_err());
    }

    #[test]
    fn shipped_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/model.json");
        let m = load_model(&path).unwrap();
        assert_eq!(m.predict(&[0.0; FEATURE_COUNT]).map(|_| ()), Ok(()));
    }
}
