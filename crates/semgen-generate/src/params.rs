use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Exp, Gumbel, LogNormal, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::expr::EvalError;
use crate::model::TuningConfig;

/// Noise distribution families; all take a location and a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Lognormal,
    Laplace,
    Logistic,
    Gumbel,
    Normal,
}

impl DistributionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Lognormal => "lognormal",
            Self::Laplace => "laplace",
            Self::Logistic => "logistic",
            Self::Gumbel => "gumbel",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Noise distribution fixed for one hook occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseDraw {
    pub index: usize,
    pub kind: DistributionKind,
    pub location: f64,
    pub scale: f64,
}

impl NoiseDraw {
    /// Draw one value from this distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, EvalError> {
        let Self {
            location, scale, ..
        } = *self;
        let value = match self.kind {
            DistributionKind::Lognormal => LogNormal::new(location, scale)
                .map_err(|err| EvalError::Hook(err.to_string()))?
                .sample(rng),
            DistributionKind::Normal => Normal::new(location, scale)
                .map_err(|err| EvalError::Hook(err.to_string()))?
                .sample(rng),
            DistributionKind::Gumbel => Gumbel::new(location, scale)
                .map_err(|err| EvalError::Hook(err.to_string()))?
                .sample(rng),
            DistributionKind::Laplace => {
                let u = open_unit(rng);
                if u < 0.5 {
                    location + scale * (2.0 * u).ln()
                } else {
                    location - scale * (2.0 * (1.0 - u)).ln()
                }
            }
            DistributionKind::Logistic => {
                let u = open_unit(rng);
                location + scale * (u / (1.0 - u)).ln()
            }
        };
        Ok(value)
    }
}

impl fmt::Display for NoiseDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.kind, self.location, self.scale)
    }
}

/// Coefficient fixed for one hook occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefDraw {
    pub index: usize,
    /// Signed value, rounded to three decimals.
    pub value: f64,
    pub sign: i8,
}

impl CoefDraw {
    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }
}

/// Min/max of drawn coefficient magnitudes and noise scales for the current
/// parameter generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub smallest_coef: Option<f64>,
    pub largest_coef: Option<f64>,
    pub smallest_std: Option<f64>,
    pub largest_std: Option<f64>,
    pub coef_draws: u64,
    pub noise_draws: u64,
}

impl RunStatistics {
    fn record_coef(&mut self, magnitude: f64) {
        self.coef_draws += 1;
        self.smallest_coef = Some(self.smallest_coef.map_or(magnitude, |v| v.min(magnitude)));
        self.largest_coef = Some(self.largest_coef.map_or(magnitude, |v| v.max(magnitude)));
    }

    fn record_std(&mut self, scale: f64) {
        self.noise_draws += 1;
        self.smallest_std = Some(self.smallest_std.map_or(scale, |v| v.min(scale)));
        self.largest_std = Some(self.largest_std.map_or(scale, |v| v.max(scale)));
    }

    /// Largest over smallest coefficient magnitude.
    pub fn coef_range(&self) -> Option<f64> {
        ratio(self.largest_coef, self.smallest_coef)
    }

    /// Largest over smallest noise scale.
    pub fn std_range(&self) -> Option<f64> {
        ratio(self.largest_std, self.smallest_std)
    }

    pub fn total_range(&self) -> Option<f64> {
        Some(self.coef_range()? * self.std_range()?)
    }
}

fn ratio(largest: Option<f64>, smallest: Option<f64>) -> Option<f64> {
    match (largest, smallest) {
        (Some(largest), Some(smallest)) if smallest > 0.0 => Some(largest / smallest),
        _ => None,
    }
}

/// Cached noise and coefficient draws, keyed by occurrence index.
///
/// Draws persist until [`ParameterStore::reset`]; each reset starts a new
/// parameter generation.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    noises: BTreeMap<usize, NoiseDraw>,
    coefs: BTreeMap<usize, CoefDraw>,
    stats: RunStatistics,
    generation: u64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached draw and the statistics; the next requests draw fresh.
    pub fn reset(&mut self) {
        self.noises.clear();
        self.coefs.clear();
        self.stats = RunStatistics::default();
        self.generation += 1;
    }

    /// Number of resets so far; zero means no generation has started.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn draw_or_reuse_noise<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
        tuning: &TuningConfig,
    ) -> Result<NoiseDraw, EvalError> {
        if let Some(draw) = self.noises.get(&index) {
            return Ok(*draw);
        }

        let kind = tuning.distributions[rng.random_range(0..tuning.distributions.len())];
        let location = round3(
            Normal::new(tuning.mean_mean, tuning.mean_scale)
                .map_err(|err| EvalError::Hook(err.to_string()))?
                .sample(rng),
        );
        let scale = round3(
            exponential(tuning.std_scale * tuning.min_std, rng)? + tuning.min_std,
        );
        let draw = NoiseDraw {
            index,
            kind,
            location,
            scale,
        };

        self.stats.record_std(scale);
        self.noises.insert(index, draw);
        debug!(index, kind = %kind, location, scale, "noise drawn");
        Ok(draw)
    }

    pub fn draw_or_reuse_coef<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
        tuning: &TuningConfig,
    ) -> Result<CoefDraw, EvalError> {
        if let Some(draw) = self.coefs.get(&index) {
            return Ok(*draw);
        }

        let magnitude = exponential(tuning.coef_scale * tuning.min_coef, rng)? + tuning.min_coef;
        // One in five coefficients is negative.
        let sign: i8 = if rng.random_range(0..5) == 0 { -1 } else { 1 };
        let value = round3(magnitude * f64::from(sign));
        let draw = CoefDraw { index, value, sign };

        self.stats.record_coef(draw.magnitude());
        self.coefs.insert(index, draw);
        debug!(index, value, "coefficient drawn");
        Ok(draw)
    }

    pub fn noise_draw(&self, index: usize) -> Option<&NoiseDraw> {
        self.noises.get(&index)
    }

    pub fn coef_draw(&self, index: usize) -> Option<&CoefDraw> {
        self.coefs.get(&index)
    }

    pub fn noises(&self) -> impl Iterator<Item = &NoiseDraw> {
        self.noises.values()
    }

    pub fn coefs(&self) -> impl Iterator<Item = &CoefDraw> {
        self.coefs.values()
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }
}

fn exponential<R: Rng + ?Sized>(scale: f64, rng: &mut R) -> Result<f64, EvalError> {
    Ok(Exp::new(1.0 / scale)
        .map_err(|err| EvalError::Hook(err.to_string()))?
        .sample(rng))
}

// Uniform on the open interval (0, 1).
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(f64::EPSILON..1.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn three_decimal_rounding_sends_ties_to_even() {
        assert_eq!(round3(0.0625), 0.062);
        assert_eq!(round3(0.1875), 0.188);
        assert_eq!(round3(-0.0625), -0.062);
        assert_eq!(round3(1.23449), 1.234);
    }

    #[test]
    fn reuses_draws_until_reset() {
        let tuning = TuningConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut store = ParameterStore::new();
        store.reset();

        let noise = store
            .draw_or_reuse_noise(0, &mut rng, &tuning)
            .expect("noise");
        let coef = store.draw_or_reuse_coef(0, &mut rng, &tuning).expect("coef");
        for _ in 0..100 {
            assert_eq!(store.draw_or_reuse_noise(0, &mut rng, &tuning), Ok(noise));
            assert_eq!(store.draw_or_reuse_coef(0, &mut rng, &tuning), Ok(coef));
        }
        assert_eq!(store.statistics().noise_draws, 1);
        assert_eq!(store.statistics().coef_draws, 1);

        store.reset();
        assert_eq!(store.generation(), 2);
        assert!(store.noise_draw(0).is_none());
        assert_eq!(store.statistics(), &RunStatistics::default());
    }

    #[test]
    fn coefficients_respect_floor_rounding_and_sign_bias() {
        let tuning = TuningConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut store = ParameterStore::new();
        let draws = 10_000;

        let mut negatives = 0;
        for index in 0..draws {
            let draw = store
                .draw_or_reuse_coef(index, &mut rng, &tuning)
                .expect("coef");
            assert!(draw.magnitude() >= tuning.min_coef);
            assert_eq!(draw.value, round3(draw.value));
            assert_eq!(draw.value.signum(), f64::from(draw.sign));
            if draw.sign < 0 {
                negatives += 1;
            }
        }

        let fraction = negatives as f64 / draws as f64;
        // Binomial(10000, 0.2) has a standard deviation of 0.004.
        assert!((fraction - 0.2).abs() < 0.02, "negative fraction {fraction}");
    }

    #[test]
    fn noise_parameters_follow_tuning() {
        let tuning = TuningConfig {
            distributions: vec![DistributionKind::Laplace],
            ..TuningConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut store = ParameterStore::new();
        for index in 0..200 {
            let draw = store
                .draw_or_reuse_noise(index, &mut rng, &tuning)
                .expect("noise");
            assert_eq!(draw.kind, DistributionKind::Laplace);
            assert!(draw.scale >= tuning.min_std);
            assert_eq!(draw.location, round3(draw.location));
        }
        let stats = store.statistics();
        assert!(stats.std_range().expect("std range") >= 1.0);
        assert!(stats.coef_range().is_none());
        assert!(stats.total_range().is_none());
    }

    #[test]
    fn samples_center_on_location() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for kind in [
            DistributionKind::Laplace,
            DistributionKind::Logistic,
            DistributionKind::Normal,
        ] {
            let draw = NoiseDraw {
                index: 0,
                kind,
                location: 3.0,
                scale: 0.5,
            };
            let n = 20_000;
            let mean = (0..n)
                .map(|_| draw.sample(&mut rng).expect("sample"))
                .sum::<f64>()
                / n as f64;
            assert!((mean - 3.0).abs() < 0.05, "{kind}: mean {mean}");
        }
    }

    #[test]
    fn display_matches_realized_model_form() {
        let draw = NoiseDraw {
            index: 0,
            kind: DistributionKind::Gumbel,
            location: -1.25,
            scale: 0.5,
        };
        assert_eq!(draw.to_string(), "gumbel(-1.25,0.5)");
    }
}
