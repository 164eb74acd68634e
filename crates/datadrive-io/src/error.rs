use std::fmt::Display;
use std::path::Path;

use thiserror::Error;

/// Failure to read or query a structured file.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("invalid selector `{selector}` at offset {offset}: {message}")]
    Selector {
        selector: String,
        offset: usize,
        message: String,
    },

    #[error("sheet `{sheet}` not found")]
    MissingSheet { sheet: String },

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl IoError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn from_backend<E: Display>(backend: &'static str, err: E) -> Self {
        Self::Backend {
            backend,
            message: err.to_string(),
        }
    }

    pub(crate) fn xml(position: usize, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }
}
