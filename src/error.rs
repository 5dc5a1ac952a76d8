use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Violation { field, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected input. The caller corrects the fields and retries;
    /// nothing was persisted.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Delete blocked because dependent records still reference the subject.
    #[error("subject '{subject}' still has {dependents} dependent record(s); delete those first")]
    Referential { subject: String, dependents: usize },

    /// Disk write failed. The previous on-disk state is intact.
    #[error("persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// A collection or snapshot file exists but does not parse.
    #[error("corrupt data file {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },

    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Missing or malformed AI environment configuration. Fatal for the
    /// AI-dependent commands only; every other command runs without it.
    #[error("configuration invalid:\n  {}", .0.join("\n  "))]
    Config(Vec<String>),
}

/// Failures talking to the remote AI endpoint. None of these touch local
/// state; all are recoverable by retry or a configuration fix.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI endpoint rejected the credentials (HTTP {0})")]
    AuthFailure(u16),

    #[error("AI endpoint rate limit reached; wait and retry")]
    RateLimited,

    /// A non-auth, non-rate-limit HTTP failure status from the endpoint.
    #[error("AI endpoint returned HTTP {0}")]
    Upstream(u16),

    #[error("AI transport failure: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = Error::Validation(vec![
            Violation::new("score", "must be at most max_score"),
            Violation::new("date", "must not be in the far future"),
        ]);

        let text = err.to_string();
        assert!(text.contains("score: must be at most max_score"));
        assert!(text.contains("date: must not be in the far future"));
    }
}
