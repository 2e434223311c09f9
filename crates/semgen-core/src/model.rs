use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Optional data type tag carried by a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Numeric,
    Categorical,
}

/// Declaration of a single model variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    /// Variable name, referenced by later equations.
    pub name: String,
    /// Parent variables in declaration order.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Latent variables (`observed = false`) are computed but not emitted.
    #[serde(default = "default_observed")]
    pub observed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

fn default_observed() -> bool {
    true
}

impl VariableSpec {
    /// Observed variable with the given parents.
    pub fn new(name: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            name: name.into(),
            parents: parents.iter().map(|parent| parent.to_string()).collect(),
            observed: true,
            data_type: None,
        }
    }

    /// Latent variable with the given parents.
    pub fn latent(name: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            observed: false,
            ..Self::new(name, parents)
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Variable entry in a model file; accepts a bare name or a full spec.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum VariableDecl {
    Name(String),
    Spec(VariableSpec),
}

impl VariableDecl {
    pub fn name(&self) -> &str {
        match self {
            VariableDecl::Name(name) => name.as_str(),
            VariableDecl::Spec(spec) => spec.name.as_str(),
        }
    }

    pub fn into_spec(self) -> VariableSpec {
        match self {
            VariableDecl::Name(name) => VariableSpec::new(name, &[]),
            VariableDecl::Spec(spec) => spec,
        }
    }
}

/// On-disk model document: variable declarations plus a parallel list of
/// equations, one per variable and in the same order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    /// Optional human readable model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub variables: Vec<VariableDecl>,
    pub equations: Vec<String>,
}

/// Normalized structural equation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub variables: Vec<VariableSpec>,
    pub equations: Vec<String>,
}

impl ModelDefinition {
    pub fn new(variables: Vec<VariableSpec>, equations: Vec<String>) -> Self {
        Self {
            variables,
            equations,
        }
    }

    /// Build a definition from `(spec, equation)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (VariableSpec, S)>,
        S: Into<String>,
    {
        let (variables, equations) = pairs
            .into_iter()
            .map(|(spec, equation)| (spec, equation.into()))
            .unzip();
        Self {
            variables,
            equations,
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Declaration index of a variable.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|var| var.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|var| var.name == name)
    }

    /// Names of observed variables, in declaration order.
    pub fn observed_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|var| var.observed)
            .map(|var| var.name.as_str())
            .collect()
    }

    pub fn latent_count(&self) -> usize {
        self.variables.iter().filter(|var| !var.observed).count()
    }
}

impl From<ModelFile> for ModelDefinition {
    fn from(file: ModelFile) -> Self {
        Self {
            variables: file
                .variables
                .into_iter()
                .map(VariableDecl::into_spec)
                .collect(),
            equations: file.equations,
        }
    }
}
