use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One problem found in a manifest, addressed by a dotted path such as
/// `sources[2].bindings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIssue {
    pub path: String,
    pub message: String,
}

impl ManifestIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("manifest validation failed with {} issue(s)", .issues.len())]
pub struct ValidationError {
    issues: Vec<ManifestIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ManifestIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ManifestIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ManifestIssue> {
        self.issues
    }
}
