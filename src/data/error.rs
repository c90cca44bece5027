use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::metrics::DerivedMetric;

/// Fatal load failures. Nothing is rendered when one of these occurs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid player table: {reason}", .path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("unsupported file extension: .{extension}")]
    UnsupportedFormat { extension: String },
}

impl LoadError {
    /// `true` for missing or unreadable files, `false` for files that were
    /// read but could not be interpreted as a table.
    pub fn is_data_source(&self) -> bool {
        matches!(self, LoadError::NotFound { .. } | LoadError::Io { .. })
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        LoadError::Schema {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Recoverable conditions surfaced next to the data instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An expected input column is absent from the file.
    MissingColumn { column: String },
    /// A derived metric was not computed because a source column is absent.
    MetricSkipped {
        metric: DerivedMetric,
        missing: Vec<String>,
    },
    /// The active filter matches no rows.
    EmptyResult,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingColumn { column } => write!(f, "column '{column}' is missing"),
            Diagnostic::MetricSkipped { metric, missing } => {
                write!(f, "{metric} not available (missing {})", missing.join(", "))
            }
            Diagnostic::EmptyResult => write!(f, "no players match the current filters"),
        }
    }
}
