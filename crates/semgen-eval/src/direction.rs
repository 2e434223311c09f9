//! Pairwise causal direction tests.
//!
//! A direction score is positive when the data favours `a -> b`, negative
//! for `b -> a`, and close to zero when no direction can be told apart.

use std::f64::consts::{PI, SQRT_2};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::errors::EvalError;
use crate::metrics::{correlation, standardize};
use crate::model::EvaluateOptions;

/// Scores below this magnitude are treated as undetermined.
pub const UNDETERMINED_THRESHOLD: f64 = 1e-5;

pub trait DirectionTest {
    fn name(&self) -> &'static str;

    fn score(&self, a: &[f64], b: &[f64]) -> Result<f64, EvalError>;
}

/// Pick the test for `options.power`: pairwise LiNGAM up to 1, the
/// regression-based test above it.
///
/// Fails with [`EvalError::SensitivityRange`] when the regression-based test
/// would be used with a sensitivity outside `[1, 10]`.
pub fn direction_test(options: &EvaluateOptions) -> Result<Box<dyn DirectionTest>, EvalError> {
    if options.power <= 1.0 {
        Ok(Box::new(PairwiseLingam))
    } else {
        check_sensitivity(options.sensitivity)?;
        Ok(Box::new(NonLinearDirection {
            independence: RandomFourierTest {
                seed: options.seed,
                ..RandomFourierTest::default()
            },
            neighbors: DEFAULT_NEIGHBORS,
            n_train: options.n_train,
            sensitivity: options.sensitivity,
            seed: options.seed,
        }))
    }
}

pub fn check_sensitivity(sensitivity: Option<f64>) -> Result<(), EvalError> {
    match sensitivity {
        Some(value) if !(1.0..=10.0).contains(&value) => Err(EvalError::SensitivityRange(value)),
        _ => Ok(()),
    }
}

/// Pairwise LiNGAM, hyperbolic tangent variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseLingam;

impl DirectionTest for PairwiseLingam {
    fn name(&self) -> &'static str {
        "pairwise_lingam"
    }

    fn score(&self, a: &[f64], b: &[f64]) -> Result<f64, EvalError> {
        check_pair(a, b)?;
        let (Some(a), Some(b)) = (standardize(a), standardize(b)) else {
            return Err(EvalError::InsufficientData(
                "constant series has no direction".to_string(),
            ));
        };
        let rho = correlation(&a, &b).unwrap_or(0.0);
        let cumulant = a
            .iter()
            .zip(&b)
            .map(|(x, y)| x * y.tanh() - y * x.tanh())
            .sum::<f64>()
            / a.len() as f64;
        Ok(rho * cumulant)
    }
}

/// Result of an independence test between two series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndependenceOutcome {
    pub p_value: f64,
    pub statistic: f64,
}

/// Residual independence test used by [`NonLinearDirection`].
pub trait IndependenceTest {
    fn test(&self, x: &[f64], y: &[f64]) -> Result<IndependenceOutcome, EvalError>;

    /// Random features per series; scales the statistic in the sensitivity form.
    fn num_features(&self) -> usize;
}

const DEFAULT_NEIGHBORS: usize = 10;

/// Regress each series on the other with k-nearest neighbours and compare
/// how independent the residuals are from the regressor.
#[derive(Debug, Clone)]
pub struct NonLinearDirection<T: IndependenceTest> {
    pub independence: T,
    pub neighbors: usize,
    pub n_train: usize,
    pub sensitivity: Option<f64>,
    pub seed: u64,
}

impl<T: IndependenceTest> NonLinearDirection<T> {
    pub fn new(independence: T) -> Self {
        Self {
            independence,
            neighbors: DEFAULT_NEIGHBORS,
            n_train: 100_000,
            sensitivity: None,
            seed: 0,
        }
    }

    /// Independence of the residuals of `effect ~ cause` from `cause`, in
    /// `[0, 1]`; higher supports `cause -> effect`.
    fn fit_independence(&self, cause: &[f64], effect: &[f64]) -> Result<f64, EvalError> {
        let (cause, effect) = self.subsample(cause, effect);
        let residuals = knn_residuals(&cause, &effect, self.neighbors);
        let outcome = self.independence.test(&cause, &residuals)?;

        let dependence = match self.sensitivity {
            None => (1.0 - outcome.p_value).powf(0.5_f64.ln() / 0.99_f64.ln()),
            Some(sensitivity) => {
                let threshold = 11.0 - sensitivity;
                let scaled = outcome.statistic / (self.independence.num_features() as f64).powi(2);
                if outcome.statistic <= threshold {
                    0.5 - (threshold - scaled).tanh() / 2.0
                } else {
                    0.5 + (scaled - threshold).tanh() / 2.0
                }
            }
        };
        Ok(1.0 - dependence)
    }

    fn subsample(&self, a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
        if self.n_train >= a.len() {
            return (a.to_vec(), b.to_vec());
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let picked = rand::seq::index::sample(&mut rng, a.len(), self.n_train);
        picked.iter().map(|idx| (a[idx], b[idx])).unzip()
    }
}

impl<T: IndependenceTest> DirectionTest for NonLinearDirection<T> {
    fn name(&self) -> &'static str {
        "knn_residual_independence"
    }

    fn score(&self, a: &[f64], b: &[f64]) -> Result<f64, EvalError> {
        check_sensitivity(self.sensitivity)?;
        check_pair(a, b)?;
        if a.len() <= self.neighbors {
            return Err(EvalError::InsufficientData(format!(
                "{} rows; need more than {} for the neighbour regression",
                a.len(),
                self.neighbors
            )));
        }

        let forward = self.fit_independence(a, b)?;
        let backward = self.fit_independence(b, a)?;
        Ok((forward - backward) / 1000.0)
    }
}

/// Kernel dependence test on random Fourier features with a permutation
/// p-value.
#[derive(Debug, Clone)]
pub struct RandomFourierTest {
    pub features: usize,
    pub permutations: usize,
    pub seed: u64,
}

impl Default for RandomFourierTest {
    fn default() -> Self {
        Self {
            features: 5,
            permutations: 200,
            seed: 0,
        }
    }
}

impl IndependenceTest for RandomFourierTest {
    fn test(&self, x: &[f64], y: &[f64]) -> Result<IndependenceOutcome, EvalError> {
        check_pair(x, y)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let fx = fourier_features(x, self.features, &mut rng);
        let fy = fourier_features(y, self.features, &mut rng);

        let statistic = cross_covariance_statistic(&fx, &fy, None);
        let mut order: Vec<usize> = (0..y.len()).collect();
        let mut exceed = 0_usize;
        for _ in 0..self.permutations {
            order.shuffle(&mut rng);
            if cross_covariance_statistic(&fx, &fy, Some(&order)) >= statistic {
                exceed += 1;
            }
        }

        Ok(IndependenceOutcome {
            p_value: (exceed + 1) as f64 / (self.permutations + 1) as f64,
            statistic,
        })
    }

    fn num_features(&self) -> usize {
        self.features
    }
}

/// Centred `sqrt(2) * cos(w * x + b)` features of the standardised series,
/// one row per feature.
fn fourier_features<R: Rng + ?Sized>(
    values: &[f64],
    features: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let scaled = standardize(values).unwrap_or_else(|| vec![0.0; values.len()]);
    (0..features)
        .map(|_| {
            let w: f64 = StandardNormal.sample(rng);
            let b = rng.random_range(0.0..2.0 * PI);
            let mut row: Vec<f64> = scaled.iter().map(|v| SQRT_2 * (w * v + b).cos()).collect();
            let center = row.iter().sum::<f64>() / row.len() as f64;
            for v in &mut row {
                *v -= center;
            }
            row
        })
        .collect()
}

/// `n * ||C_xy||_F^2` where `C_xy` is the feature cross-covariance, with `y`
/// optionally read through a permutation.
fn cross_covariance_statistic(fx: &[Vec<f64>], fy: &[Vec<f64>], order: Option<&[usize]>) -> f64 {
    let n = fx.first().map_or(0, Vec::len);
    if n == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for row_x in fx {
        for row_y in fy {
            let cov = match order {
                Some(order) => row_x
                    .iter()
                    .zip(order)
                    .map(|(x, &idx)| x * row_y[idx])
                    .sum::<f64>(),
                None => row_x.iter().zip(row_y).map(|(x, y)| x * y).sum::<f64>(),
            } / n as f64;
            total += cov * cov;
        }
    }
    total * n as f64
}

/// Residuals of `y` after a k-nearest-neighbour regression on `x`. Each
/// prediction averages the `k` points closest in `x`, the point itself
/// included.
pub fn knn_residuals(x: &[f64], y: &[f64], k: usize) -> Vec<f64> {
    let n = x.len();
    let k = k.clamp(1, n.max(1));
    let mut sorted: Vec<usize> = (0..n).collect();
    sorted.sort_by(|&l, &r| x[l].total_cmp(&x[r]));

    let mut residuals = vec![0.0; n];
    for (pos, &idx) in sorted.iter().enumerate() {
        let origin = x[idx];
        // Window [lo, hi) over the sorted order, grown toward the nearer side.
        let (mut lo, mut hi) = (pos, pos + 1);
        let mut sum = y[idx];
        while hi - lo < k {
            let grow_left = match (lo.checked_sub(1), hi < n) {
                (Some(l), true) => origin - x[sorted[l]] <= x[sorted[hi]] - origin,
                (Some(_), false) => true,
                (None, _) => false,
            };
            if grow_left {
                lo -= 1;
                sum += y[sorted[lo]];
            } else {
                sum += y[sorted[hi]];
                hi += 1;
            }
        }
        residuals[idx] = y[idx] - sum / k as f64;
    }
    residuals
}

fn check_pair(a: &[f64], b: &[f64]) -> Result<(), EvalError> {
    if a.len() != b.len() {
        return Err(EvalError::InvalidDataset(format!(
            "series lengths differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.len() < 2 {
        return Err(EvalError::InsufficientData(format!("{} rows", a.len())));
    }
    Ok(())
}
