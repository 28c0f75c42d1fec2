//! Support vector machine decision functions.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: i32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    pub fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * d2).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(degree),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }
}

/// Trained decision function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Classifier {
    /// One-vs-rest linear model: one weight row per class, arg-max wins.
    /// A single row over two classes is a binary model: positive decision means class 1.
    Linear { coef: Vec<Vec<f64>>, intercept: Vec<f64> },

    /// One-vs-one kernel SVM in libsvm layout.
    ///
    /// Support vectors are grouped by class (`n_support[i]` for class `i`).
    /// `dual_coef` has `n_classes - 1` rows; `intercept` holds one value per class
    /// pair `(i, j)`, `i < j`, in row-major order. A positive pair decision votes for
    /// `i`, and vote ties go to the lowest class index.
    ///
    /// Coefficients must carry libsvm's signs. scikit-learn negates the public
    /// `dual_coef_` and `intercept_` of a two-class `SVC`, so a binary export taken
    /// from those attributes has to be negated back, otherwise every prediction flips.
    /// Its private `_dual_coef_` and `_intercept_` already have the libsvm signs.
    Svc {
        kernel: Kernel,
        support_vectors: Vec<Vec<f64>>,
        n_support: Vec<usize>,
        dual_coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

impl Classifier {
    /// Input dimension, `None` when there is nothing to infer it from.
    pub fn input_len(&self) -> Option<usize> {
        match self {
            Classifier::Linear { coef, .. } => coef.first().map(Vec::len),
            Classifier::Svc {
                support_vectors, ..
            } => support_vectors.first().map(Vec::len),
        }
    }

    /// Structural checks against the expected input length and class count.
    pub fn validate(&self, input_len: usize, n_classes: usize) -> Result<()> {
        match self {
            Classifier::Linear { coef, intercept } => {
                let binary = coef.len() == 1 && n_classes == 2;
                if coef.len() != n_classes && !binary {
                    return Err(ModelError::Invalid(format!(
                        "linear model has {} weight rows for {} classes",
                        coef.len(),
                        n_classes
                    )));
                }
                if intercept.len() != coef.len() {
                    return Err(ModelError::Invalid(format!(
                        "linear model has {} intercepts for {} weight rows",
                        intercept.len(),
                        coef.len()
                    )));
                }
                check_rows(coef, input_len, "weight")
            }
            Classifier::Svc {
                support_vectors,
                n_support,
                dual_coef,
                intercept,
                ..
            } => {
                if n_classes < 2 {
                    return Err(ModelError::Invalid(
                        "SVC needs at least two classes".to_string(),
                    ));
                }
                if n_support.len() != n_classes {
                    return Err(ModelError::Invalid(format!(
                        "n_support lists {} classes, labels list {}",
                        n_support.len(),
                        n_classes
                    )));
                }
                let total: usize = n_support.iter().sum();
                if total != support_vectors.len() {
                    return Err(ModelError::Invalid(format!(
                        "n_support sums to {}, found {} support vectors",
                        total,
                        support_vectors.len()
                    )));
                }
                check_rows(support_vectors, input_len, "support vector")?;
                if dual_coef.len() != n_classes - 1 {
                    return Err(ModelError::Invalid(format!(
                        "dual_coef has {} rows, expected {}",
                        dual_coef.len(),
                        n_classes - 1
                    )));
                }
                check_rows(dual_coef, total, "dual coefficient")?;
                let pairs = n_classes * (n_classes - 1) / 2;
                if intercept.len() != pairs {
                    return Err(ModelError::Invalid(format!(
                        "SVC has {} intercepts, expected {}",
                        intercept.len(),
                        pairs
                    )));
                }
                Ok(())
            }
        }
    }

    /// Class index for a scaled feature vector. Assumes [`Classifier::validate`] passed.
    pub fn predict(&self, x: &[f64]) -> usize {
        match self {
            Classifier::Linear { coef, intercept } => {
                let scores: Vec<f64> = coef
                    .iter()
                    .zip(intercept)
                    .map(|(w, b)| dot(w, x) + b)
                    .collect();
                if scores.len() == 1 {
                    return usize::from(scores[0] > 0.0);
                }
                argmax(&scores)
            }
            Classifier::Svc {
                kernel,
                support_vectors,
                n_support,
                dual_coef,
                intercept,
            } => {
                let n_classes = n_support.len();
                let kvalue: Vec<f64> = support_vectors.iter().map(|sv| kernel.eval(sv, x)).collect();

                let mut start = vec![0usize; n_classes];
                for i in 1..n_classes {
                    start[i] = start[i - 1] + n_support[i - 1];
                }

                let mut votes = vec![0usize; n_classes];
                let mut p = 0;
                for i in 0..n_classes {
                    for j in (i + 1)..n_classes {
                        let mut sum = intercept[p];
                        for k in start[i]..start[i] + n_support[i] {
                            sum += dual_coef[j - 1][k] * kvalue[k];
                        }
                        for k in start[j]..start[j] + n_support[j] {
                            sum += dual_coef[i][k] * kvalue[k];
                        }
                        if sum > 0.0 {
                            votes[i] += 1;
                        } else {
                            votes[j] += 1;
                        }
                        p += 1;
                    }
                }

                let mut best = 0;
                for (i, &v) in votes.iter().enumerate() {
                    if v > votes[best] {
                        best = i;
                    }
                }
                best
            }
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Index of the largest score, first one on ties.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

fn check_rows(rows: &[Vec<f64>], len: usize, what: &str) -> Result<()> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != len) {
        return Err(ModelError::Invalid(format!(
            "{} row {} has length {}, expected {}",
            what,
            i,
            row.len(),
            len
        )));
    }
    Ok(())
}
