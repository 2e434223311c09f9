use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Sample;
use crate::errors::GenerationError;

/// Counters reported after a dataset has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub rows_written: u64,
    pub rows_failed: u64,
    pub bytes_written: u64,
}

/// Write `header` followed by one row per successful sample.
///
/// Failed samples are skipped and counted; the stream keeps going.
pub fn write_samples_csv<W, I>(
    writer: W,
    header: &[String],
    samples: I,
) -> Result<WriteSummary, GenerationError>
where
    W: Write,
    I: IntoIterator<Item = Result<Sample, GenerationError>>,
{
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(header)?;

    let mut summary = WriteSummary::default();
    for sample in samples {
        match sample {
            Ok(sample) => {
                writer.write_record(sample.to_record())?;
                summary.rows_written += 1;
            }
            Err(err) => {
                debug!(error = %err, "sample skipped");
                summary.rows_failed += 1;
            }
        }
    }

    writer.flush()?;
    let counting = writer
        .into_inner()
        .map_err(|err| GenerationError::Io(err.into_error()))?;
    summary.bytes_written = counting.bytes_written();
    Ok(summary)
}

/// Create `path` and write the dataset into it.
pub fn write_dataset<I>(
    path: &Path,
    header: &[String],
    samples: I,
) -> Result<WriteSummary, GenerationError>
where
    I: IntoIterator<Item = Result<Sample, GenerationError>>,
{
    let file = BufWriter::new(File::create(path)?);
    write_samples_csv(file, header, samples)
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
