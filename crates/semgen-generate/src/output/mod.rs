pub mod csv;

pub use self::csv::{WriteSummary, write_dataset, write_samples_csv};
