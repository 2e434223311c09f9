use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use semgen_core::{ModelDefinition, load_model, validate_model};

use crate::compiler::{CompiledModel, Unit, compile_model};
use crate::errors::GenerationError;
use crate::expr::{EvalError, HookKind, HookSite, Hooks};
use crate::introspect::render_realized_model;
use crate::model::{DatasetReport, GenerateOptions, TuningConfig};
use crate::output::write_dataset;
use crate::params::{ParameterStore, RunStatistics};

/// One generated row: values of the observed variables in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values formatted for a CSV record.
    pub fn to_record(&self) -> Vec<String> {
        self.values.iter().map(f64::to_string).collect()
    }
}

/// Builder for [`Generator`]. Exactly one model source must be set.
#[derive(Debug, Default)]
pub struct GeneratorBuilder {
    model_path: Option<PathBuf>,
    definition: Option<ModelDefinition>,
    options: GenerateOptions,
}

impl GeneratorBuilder {
    /// Load the model from a TOML or JSON file.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn definition(mut self, definition: ModelDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn tuning(mut self, tuning: TuningConfig) -> Self {
        self.options.tuning = tuning;
        self
    }

    pub fn build(self) -> Result<Generator, GenerationError> {
        let (model, model_path) = match (self.model_path, self.definition) {
            (Some(path), None) => (load_model(&path)?, Some(path)),
            (None, Some(definition)) => (definition, None),
            (None, None) => {
                return Err(GenerationError::Configuration(
                    "either a model path or a model definition is required".to_string(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(GenerationError::Configuration(
                    "model path and model definition are mutually exclusive".to_string(),
                ));
            }
        };
        Generator::new(model, model_path, self.options)
    }
}

/// Synthetic data session over one structural equation model.
///
/// Parameters drawn by `noise()`, `coef()` and `data()` stay fixed across
/// samples until a sampling call asks for a reset.
#[derive(Debug)]
pub struct Generator {
    model: ModelDefinition,
    model_path: Option<PathBuf>,
    compiled: CompiledModel,
    store: ParameterStore,
    rng: ChaCha8Rng,
    seed: u64,
    options: GenerateOptions,
}

impl Generator {
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    pub fn from_definition(
        model: ModelDefinition,
        options: GenerateOptions,
    ) -> Result<Self, GenerationError> {
        Self::new(model, None, options)
    }

    pub fn from_path(path: &Path, options: GenerateOptions) -> Result<Self, GenerationError> {
        let model = load_model(path)?;
        Self::new(model, Some(path.to_path_buf()), options)
    }

    fn new(
        model: ModelDefinition,
        model_path: Option<PathBuf>,
        options: GenerateOptions,
    ) -> Result<Self, GenerationError> {
        options.tuning.validate()?;

        if model.variables.len() != model.equations.len() {
            return Err(GenerationError::Configuration(format!(
                "model declares {} variables but {} equations",
                model.variables.len(),
                model.equations.len()
            )));
        }

        let report = validate_model(&model);
        for warning in &report.warnings {
            warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }
        if !report.is_ok() {
            return Err(GenerationError::Configuration(report.error_summary()));
        }

        let compiled = compile_model(&model);
        if options.strict {
            if let Some(err) = compiled.errors().next() {
                return Err(GenerationError::Compilation(err.clone()));
            }
        }

        let seed = match options.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::rng().random();
                info!(seed, "no seed supplied; using a random one");
                seed
            }
        };

        let (noise_sites, coef_sites) = compiled.hook_counts();
        info!(
            variables = model.variables.len(),
            observed = compiled.outputs().len(),
            noise_sites,
            coef_sites,
            invalid_equations = compiled.errors().count(),
            seed,
            "model compiled"
        );

        Ok(Self {
            model,
            model_path,
            compiled,
            store: ParameterStore::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            options,
        })
    }

    /// Observed variable names, in the order values appear in each sample.
    pub fn variables(&self) -> Vec<&str> {
        self.compiled
            .outputs()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn compiled(&self) -> &CompiledModel {
        &self.compiled
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.store
    }

    pub fn statistics(&self) -> &RunStatistics {
        self.store.statistics()
    }

    /// Lazily produce `count` samples.
    ///
    /// With `reset`, every cached parameter is discarded before the first
    /// sample. The first sampling call of a session always resets.
    pub fn samples(&mut self, count: u64, reset: bool) -> SampleStream<'_> {
        if reset || self.store.generation() == 0 {
            self.store.reset();
            info!(generation = self.store.generation(), "parameters reset");
        }
        SampleStream {
            generator: self,
            remaining: count,
        }
    }

    /// Generate `count` samples into a CSV file.
    ///
    /// Without `out`, the file sits next to the model file with a `.csv`
    /// extension.
    pub fn generate(
        &mut self,
        count: u64,
        reset: bool,
        out: Option<&Path>,
    ) -> Result<DatasetReport, GenerationError> {
        let start = Instant::now();
        let path = match (out, self.model_path.as_deref()) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(model_path)) => model_path.with_extension("csv"),
            (None, None) => {
                return Err(GenerationError::Configuration(
                    "no output path given and the model was not loaded from a file".to_string(),
                ));
            }
        };
        let header: Vec<String> = self.variables().into_iter().map(str::to_string).collect();

        info!(path = %path.display(), rows = count, reset, "writing dataset");
        let summary = write_dataset(&path, &header, self.samples(count, reset))?;

        if summary.rows_failed > 0 {
            warn!(
                rows_failed = summary.rows_failed,
                rows_written = summary.rows_written,
                "some samples failed and were skipped"
            );
        }
        info!(
            path = %path.display(),
            rows_written = summary.rows_written,
            bytes = summary.bytes_written,
            "dataset written"
        );

        Ok(DatasetReport {
            path,
            variables: header,
            rows_requested: count,
            rows_written: summary.rows_written,
            rows_failed: summary.rows_failed,
            bytes_written: summary.bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
            seed: self.seed,
            parameter_generation: self.store.generation(),
        })
    }

    /// Equations with every hook replaced by its drawn parameters, followed
    /// by a statistics block.
    pub fn describe_realized_model(&self) -> Result<String, GenerationError> {
        if self.store.generation() == 0 {
            return Err(GenerationError::NotSampled);
        }
        Ok(render_realized_model(
            &self.compiled,
            &self.store,
            &self.options.tuning,
        ))
    }

    fn sample_once(&mut self) -> Result<Sample, GenerationError> {
        let mut env: Vec<Option<f64>> = vec![None; self.compiled.slot_count()];
        let mut ctx = PassContext::new(&mut self.store, &mut self.rng, &self.options.tuning);

        for equation in self.compiled.equations() {
            let unit = match &equation.unit {
                Unit::Ready(unit) => unit,
                Unit::Invalid(err) => return Err(GenerationError::Compilation(err.clone())),
            };
            let value = unit.expr.eval(&env, &mut ctx).map_err(|source| {
                warn!(
                    variable = %equation.variable,
                    equation = %equation.source,
                    error = %source,
                    "equation failed; sample dropped"
                );
                GenerationError::Equation {
                    variable: equation.variable.clone(),
                    equation: equation.source.clone(),
                    source,
                }
            })?;
            env[equation.target_slot] = Some(value);
        }

        let values = self
            .compiled
            .outputs()
            .iter()
            .map(|(name, slot)| {
                env[*slot].ok_or_else(|| GenerationError::Unassigned(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sample::new(values))
    }
}

/// Lazy sequence of samples borrowed from a [`Generator`].
///
/// A failed sample is yielded as an error; the following samples are still
/// produced.
#[derive(Debug)]
pub struct SampleStream<'a> {
    generator: &'a mut Generator,
    remaining: u64,
}

impl Iterator for SampleStream<'_> {
    type Item = Result<Sample, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.sample_once())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Per-sample hook state: counts occurrences and resolves them through the
/// parameter store.
struct PassContext<'a, R: Rng + ?Sized> {
    store: &'a mut ParameterStore,
    rng: &'a mut R,
    tuning: &'a TuningConfig,
    noise_count: usize,
    coef_count: usize,
}

impl<'a, R: Rng + ?Sized> PassContext<'a, R> {
    fn new(store: &'a mut ParameterStore, rng: &'a mut R, tuning: &'a TuningConfig) -> Self {
        Self {
            store,
            rng,
            tuning,
            noise_count: 0,
            coef_count: 0,
        }
    }
}

impl<R: Rng + ?Sized> Hooks for PassContext<'_, R> {
    fn draw(&mut self, site: &HookSite) -> Result<f64, EvalError> {
        match site.kind {
            HookKind::Noise | HookKind::Data => {
                let index = self.noise_count;
                self.noise_count += 1;
                debug_assert_eq!(index, site.ordinal, "noise occurrence out of order");
                let draw = self
                    .store
                    .draw_or_reuse_noise(index, &mut *self.rng, self.tuning)?;
                let value = draw.sample(&mut *self.rng)?;
                if site.kind == HookKind::Data {
                    Ok(value + self.tuning.data_offset)
                } else {
                    Ok(value)
                }
            }
            HookKind::Coef => {
                let index = self.coef_count;
                self.coef_count += 1;
                debug_assert_eq!(index, site.ordinal, "coef occurrence out of order");
                let draw = self
                    .store
                    .draw_or_reuse_coef(index, &mut *self.rng, self.tuning)?;
                debug!(index, value = draw.value, "coef resolved");
                Ok(draw.value)
            }
        }
    }
}
