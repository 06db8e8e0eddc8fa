//! Error types for the flight optimizer.

use thiserror::Error;

/// Fatal conditions raised by the optimization engine.
///
/// All of these abort the run at the point of detection; the engine has no
/// partial-result recovery.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The catalog contains no flight records, so there is no search space.
    #[error("catalog has no flight records to optimize")]
    EmptyCatalog,

    /// The run configuration failed validation before generation 0.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A chromosome references a catalog id that does not exist. This is an
    /// internal invariant violation, not a recoverable runtime condition.
    #[error("flight id {id} is out of range for a catalog of {len} records")]
    OutOfRange { id: usize, len: usize },
}

/// Errors raised while loading and cleaning a flight catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog is missing required column '{0}'")]
    MissingColumn(String),

    /// A field survived cleaning but still cannot be parsed.
    #[error("record {row}: cannot parse {column} from '{value}'")]
    BadField {
        row: usize,
        column: &'static str,
        value: String,
    },
}
