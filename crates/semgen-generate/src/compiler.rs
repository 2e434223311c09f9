use semgen_core::ModelDefinition;
use tracing::warn;

use crate::expr::{
    CompilationError, Expr, HookOrdinals, HookSite, Scope, parse_equation, split_assignment,
    tokenize,
};

/// Executable form of one equation.
#[derive(Debug, Clone)]
pub struct EquationUnit {
    pub expr: Expr,
    /// Hook sites in evaluation order, with spans into the equation text.
    pub hooks: Vec<HookSite>,
    /// The text carries its own `NAME =` prefix.
    pub assignment: bool,
}

#[derive(Debug, Clone)]
pub enum Unit {
    Ready(EquationUnit),
    Invalid(CompilationError),
}

/// One compiled equation, bound to its declaration position.
#[derive(Debug, Clone)]
pub struct CompiledEquation {
    /// Declared variable at the same position.
    pub variable: String,
    /// Name the equation assigns to.
    pub target: String,
    pub target_slot: usize,
    pub source: String,
    pub unit: Unit,
}

/// Equations compiled once per model, evaluated once per sample.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    equations: Vec<CompiledEquation>,
    scope: Scope,
    outputs: Vec<(String, usize)>,
    ordinals: HookOrdinals,
}

impl CompiledModel {
    pub fn equations(&self) -> &[CompiledEquation] {
        &self.equations
    }

    /// Observed variable names with their environment slots, in declaration order.
    pub fn outputs(&self) -> &[(String, usize)] {
        &self.outputs
    }

    /// Number of environment slots a sample needs.
    pub fn slot_count(&self) -> usize {
        self.scope.len()
    }

    /// Hook occurrences per full pass: `(noise + data, coef)`.
    pub fn hook_counts(&self) -> (usize, usize) {
        (self.ordinals.noise, self.ordinals.coef)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompilationError> {
        self.equations.iter().filter_map(|equation| match &equation.unit {
            Unit::Invalid(err) => Some(err),
            Unit::Ready(_) => None,
        })
    }
}

/// Compile every equation of the model. Equations that fail to compile are
/// kept as [`Unit::Invalid`] so callers can decide how to treat them.
pub fn compile_model(model: &ModelDefinition) -> CompiledModel {
    let mut scope = Scope::new();
    for variable in &model.variables {
        scope.bind(&variable.name);
    }

    let tokenized: Vec<_> = model.equations.iter().map(|source| tokenize(source)).collect();

    let mut targets = Vec::with_capacity(model.equations.len());
    for (idx, tokens) in tokenized.iter().enumerate() {
        let declared = model
            .variables
            .get(idx)
            .map(|variable| variable.name.as_str())
            .unwrap_or_default();
        let target = match tokens {
            Ok(tokens) => split_assignment(tokens).0.unwrap_or(declared),
            Err(_) => declared,
        };
        scope.bind(target);
        targets.push(target.to_string());
    }

    let mut ordinals = HookOrdinals::default();
    let mut equations = Vec::with_capacity(model.equations.len());
    for (idx, (source, tokens)) in model.equations.iter().zip(tokenized).enumerate() {
        let variable = model
            .variables
            .get(idx)
            .map(|variable| variable.name.clone())
            .unwrap_or_default();
        let target = targets[idx].clone();
        let target_slot = scope.bind(&target);

        let unit = match tokens
            .and_then(|tokens| parse_equation(source, &tokens, &scope, &mut ordinals))
        {
            Ok(parsed) => {
                warn_on_undeclared_parents(model, idx, &target, &parsed.expr);
                Unit::Ready(EquationUnit {
                    expr: parsed.expr,
                    hooks: parsed.hooks,
                    assignment: parsed.target.is_some(),
                })
            }
            Err(err) => {
                warn!(
                    variable = %variable,
                    equation = %source,
                    error = %err,
                    "equation failed to compile"
                );
                Unit::Invalid(err)
            }
        };

        equations.push(CompiledEquation {
            variable,
            target,
            target_slot,
            source: source.clone(),
            unit,
        });
    }

    let outputs = model
        .variables
        .iter()
        .filter(|variable| variable.observed)
        .filter_map(|variable| {
            scope
                .slot(&variable.name)
                .map(|slot| (variable.name.clone(), slot))
        })
        .collect();

    CompiledModel {
        equations,
        scope,
        outputs,
        ordinals,
    }
}

fn warn_on_undeclared_parents(model: &ModelDefinition, idx: usize, target: &str, expr: &Expr) {
    let Some(variable) = model.variables.get(idx) else {
        return;
    };
    for name in expr.referenced_variables() {
        if name != target && !variable.parents.iter().any(|parent| parent == name) {
            warn!(
                variable = %variable.name,
                reference = %name,
                "equation reads a variable not listed among its parents"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::HookKind;
    use semgen_core::VariableSpec;

    #[test]
    fn binds_declared_and_assigned_names() {
        let model = ModelDefinition::from_pairs(vec![
            (VariableSpec::new("A", &[]), "A = noise()"),
            (VariableSpec::latent("H", &["A"]), "helper = coef() * A"),
            (VariableSpec::new("B", &["A"]), "B = helper + data()"),
        ]);
        let compiled = compile_model(&model);

        assert_eq!(compiled.errors().count(), 0);
        assert_eq!(compiled.slot_count(), 4);
        assert_eq!(compiled.equations()[1].target, "helper");
        assert_eq!(compiled.equations()[1].variable, "H");
        assert_eq!(
            compiled.outputs(),
            &[("A".to_string(), 0), ("B".to_string(), 2)]
        );
        assert_eq!(compiled.hook_counts(), (2, 1));

        let Unit::Ready(unit) = &compiled.equations()[2].unit else {
            panic!("equation should compile");
        };
        assert!(unit.assignment);
        assert_eq!(unit.hooks[0].kind, HookKind::Data);
        assert_eq!(unit.hooks[0].ordinal, 1);
    }

    #[test]
    fn invalid_equations_are_kept_and_reported() {
        let model = ModelDefinition::from_pairs(vec![
            (VariableSpec::new("A", &[]), "noise() +"),
            (VariableSpec::new("B", &["A"]), "A + noise()"),
        ]);
        let compiled = compile_model(&model);

        let errors: Vec<_> = compiled.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].equation, "noise() +");
        assert!(matches!(compiled.equations()[1].unit, Unit::Ready(_)));
        // The failed equation does not consume a noise ordinal.
        assert_eq!(compiled.hook_counts(), (1, 0));
    }
}
