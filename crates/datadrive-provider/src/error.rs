use datadrive_io::IoError;
use datadrive_resource::ResourceError;
use thiserror::Error;

/// Errors raised while loading a resource or answering a data query.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("resource `{path}` declares neither a type nor selector bindings")]
    Untyped { path: String },

    #[error("selector `{selector}` matched nothing in `{path}`")]
    NoMatch { selector: String, path: String },

    #[error("selectors matched different numbers of records: {}", format_counts(.counts))]
    MismatchedBindingCounts { counts: Vec<(String, usize)> },

    #[error("invalid index expression `{expression}`: {message}")]
    InvalidIndex { expression: String, message: String },

    #[error("index {index} is out of range ({available} records available)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("no record has key `{key}`")]
    KeyNotFound { key: String },

    #[error("cannot build `{type_name}` from {location}: {message}")]
    Decode {
        type_name: &'static str,
        location: String,
        message: String,
    },

    #[error("row {row} holds `{found}`, not `{expected}`")]
    UnexpectedType {
        row: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unsupported data file `{path}` (extension `{extension}`)")]
    UnsupportedFormat { path: String, extension: String },

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("malformed JSON in `{path}`: {message}")]
    Json { path: String, message: String },
}

fn format_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(selector, n)| format!("`{selector}` = {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
