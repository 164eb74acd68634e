use thiserror::Error;

/// Errors raised while building or querying resources and binding maps.
///
/// These are caller-programming errors: they surface synchronously at
/// construction or lookup time and are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("invalid {argument}: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    #[error("no binding registered for selector `{selector}`")]
    NotFound { selector: String },

    #[error("resource `{path}` has no selector bindings")]
    NoBindings { path: String },
}

impl ResourceError {
    pub(crate) fn invalid(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }
}
