use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::EvalError;
use crate::metrics::WarningItem;

/// Numeric table loaded from a generated CSV file, stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
    rows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self, EvalError> {
        if columns.len() != values.len() {
            return Err(EvalError::InvalidDataset(format!(
                "{} column names for {} columns",
                columns.len(),
                values.len()
            )));
        }
        let rows = values.first().map_or(0, Vec::len);
        if let Some(idx) = values.iter().position(|column| column.len() != rows) {
            return Err(EvalError::InvalidDataset(format!(
                "column '{}' has {} values, expected {rows}",
                columns[idx],
                values[idx].len()
            )));
        }
        Ok(Self {
            columns,
            values,
            rows,
        })
    }

    /// Read a CSV file with a header row; every cell must be numeric.
    pub fn read_csv(path: &Path) -> Result<Self, EvalError> {
        let mut warnings = Vec::new();
        Self::parse(File::open(path)?, true, &mut warnings)
    }

    /// Parse CSV data. Without `strict`, rows holding non-numeric cells are
    /// dropped and reported through `warnings`.
    pub fn parse<R: Read>(
        reader: R,
        strict: bool,
        warnings: &mut Vec<WarningItem>,
    ) -> Result<Self, EvalError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = reader
            .headers()?
            .iter()
            .map(|header| header.to_string())
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Err(EvalError::InvalidDataset("missing header row".to_string()));
        }

        let mut values = vec![Vec::new(); columns.len()];
        let mut row = Vec::with_capacity(columns.len());
        for (row_idx, result) in reader.records().enumerate() {
            let record = result.map_err(|err| {
                if matches!(err.kind(), csv::ErrorKind::UnequalLengths { .. }) {
                    EvalError::InvalidDataset(format!("ragged row {}: {err}", row_idx + 1))
                } else {
                    EvalError::Csv(err)
                }
            })?;

            row.clear();
            let mut bad_cell = None;
            for (col_idx, cell) in record.iter().enumerate() {
                match cell.parse::<f64>() {
                    Ok(value) => row.push(value),
                    Err(_) => {
                        bad_cell = Some((col_idx, cell.to_string()));
                        break;
                    }
                }
            }

            match bad_cell {
                None => {
                    for (column, value) in values.iter_mut().zip(&row) {
                        column.push(*value);
                    }
                }
                Some((col_idx, cell)) if strict => {
                    return Err(EvalError::InvalidDataset(format!(
                        "non-numeric value '{cell}' in column '{}' row {}",
                        columns[col_idx],
                        row_idx + 1
                    )));
                }
                Some((col_idx, cell)) => warnings.push(WarningItem {
                    code: "invalid_value".to_string(),
                    path: format!("{}:{}", columns[col_idx], row_idx + 1),
                    message: format!("non-numeric value '{cell}'; row dropped"),
                    hint: Some("check CSV serialization for this column".to_string()),
                }),
            }
        }

        Self::new(columns, values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|column| column == name)
            .map(|idx| self.values[idx].as_slice())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, strict: bool) -> (Result<Dataset, EvalError>, Vec<WarningItem>) {
        let mut warnings = Vec::new();
        let result = Dataset::parse(text.as_bytes(), strict, &mut warnings);
        (result, warnings)
    }

    #[test]
    fn parses_numeric_columns() {
        let (dataset, warnings) = parse("A,B\n1,2.5\n-3,4e2\n", true);
        let dataset = dataset.expect("dataset");
        assert!(warnings.is_empty());
        assert_eq!(dataset.rows(), 2);
        assert_eq!(dataset.column("A"), Some(&[1.0, -3.0][..]));
        assert_eq!(dataset.column("B"), Some(&[2.5, 400.0][..]));
        assert_eq!(dataset.column("C"), None);
    }

    #[test]
    fn ragged_rows_are_invalid() {
        let (dataset, _) = parse("A,B\n1,2\n3\n", true);
        assert!(matches!(dataset, Err(EvalError::InvalidDataset(_))));
    }

    #[test]
    fn non_numeric_cells_depend_on_strictness() {
        let text = "A,B\n1,2\nx,4\n5,6\n";

        let (strict, _) = parse(text, true);
        assert!(matches!(strict, Err(EvalError::InvalidDataset(_))));

        let (lenient, warnings) = parse(text, false);
        let lenient = lenient.expect("lenient dataset");
        assert_eq!(lenient.rows(), 2);
        assert_eq!(lenient.column("A"), Some(&[1.0, 5.0][..]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "A:2");
    }
}
