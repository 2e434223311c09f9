use std::path::Path;

use semgen_generate::TuningConfig;

use crate::CliError;

/// Load tuning parameters from a TOML file; missing keys keep their defaults.
pub fn load_tuning(path: &Path) -> Result<TuningConfig, CliError> {
    let text = std::fs::read_to_string(path)?;
    parse_tuning(&text)
}

pub fn parse_tuning(text: &str) -> Result<TuningConfig, CliError> {
    let tuning: TuningConfig =
        toml::from_str(text).map_err(|err| CliError::InvalidConfig(err.to_string()))?;
    tuning.validate()?;
    Ok(tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgen_generate::DistributionKind;

    #[test]
    fn partial_file_keeps_defaults() {
        let tuning = parse_tuning(
            r#"
            min_coef = 0.5
            distributions = ["normal", "laplace"]
            "#,
        )
        .expect("tuning");
        assert_eq!(tuning.min_coef, 0.5);
        assert_eq!(tuning.std_scale, TuningConfig::default().std_scale);
        assert_eq!(
            tuning.distributions,
            vec![DistributionKind::Normal, DistributionKind::Laplace]
        );
    }

    #[test]
    fn example_tuning_file_loads() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../models/examples/tuning.toml");
        let tuning = load_tuning(&path).expect("example tuning");
        assert_eq!(tuning.min_coef, 0.2);
        assert_eq!(tuning.distributions.len(), 3);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            parse_tuning("min_cof = 1.0"),
            Err(CliError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse_tuning("coef_scale = 0.0"),
            Err(CliError::Generation(_))
        ));
    }
}
