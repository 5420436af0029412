//! CSV input of wallet ids and CSV output of score rows.

use crate::domain::WalletAddress;
use crate::pipeline::{RunSummary, ScoreResult};
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::fs::File;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header of the input column holding wallet addresses.
pub const WALLET_ID_COLUMN: &str = "wallet_id";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("input is missing the {0} column")]
    MissingColumn(&'static str),
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Read wallet ids from a CSV file with a `wallet_id` header.
pub fn read_wallet_ids(path: impl AsRef<Path>) -> Result<Vec<WalletAddress>, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_wallet_ids(file)
}

/// Parse wallet ids, normalizing case, dropping blanks and later duplicates.
pub fn parse_wallet_ids<R: std::io::Read>(reader: R) -> Result<Vec<WalletAddress>, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(WALLET_ID_COLUMN))
        .ok_or(IoError::MissingColumn(WALLET_ID_COLUMN))?;

    let mut seen = HashSet::new();
    let mut wallets = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(wallet) = record
            .get(column)
            .and_then(|raw| WalletAddress::new(raw).ok())
        else {
            continue;
        };
        if seen.insert(wallet.clone()) {
            wallets.push(wallet);
        }
    }

    Ok(wallets)
}

/// Single-writer sink for score rows. Rows are buffered until [`ResultWriter::flush`].
pub struct ResultWriter<W: std::io::Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ResultWriter<File> {
    /// Create (or truncate) the output file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).map_err(|source| IoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(file))
    }
}

impl<W: std::io::Write> ResultWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    pub fn write(&mut self, result: &ScoreResult) -> Result<(), IoError> {
        self.writer.serialize(result)?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), IoError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, IoError> {
        self.writer
            .into_inner()
            .map_err(|e| IoError::Write(e.into_error()))
    }
}

/// Result of draining a score stream into a [`ResultWriter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub summary: RunSummary,
    /// `true` when `shutdown` fired before the stream was exhausted.
    pub interrupted: bool,
}

/// Write rows as the stream yields them until it ends or `shutdown` resolves.
///
/// On shutdown no further rows are pulled; wallets still in flight are dropped
/// without output. Rows already written are flushed either way.
pub async fn write_stream<S, W, F>(
    results: S,
    writer: &mut ResultWriter<W>,
    shutdown: F,
) -> Result<StreamOutcome, IoError>
where
    S: Stream<Item = ScoreResult>,
    W: std::io::Write,
    F: Future,
{
    let mut outcome = StreamOutcome::default();
    tokio::pin!(results);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                outcome.interrupted = true;
                break;
            }
            next = results.next() => match next {
                Some(result) => {
                    writer.write(&result)?;
                    outcome.summary.record(&result);
                }
                None => break,
            },
        }
    }

    writer.flush()?;
    Ok(outcome)
}

/// Write all rows to `path` in one go.
pub fn write_results(path: impl AsRef<Path>, results: &[ScoreResult]) -> Result<(), IoError> {
    let mut writer = ResultWriter::create(path)?;
    for result in results {
        writer.write(result)?;
    }
    writer.flush()
}
