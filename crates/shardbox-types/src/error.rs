use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The input is not a canonical content address.
    #[error("malformed content address {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("invalid partition name {0:?}: expected [A-Za-z0-9_-]+")]
    InvalidPartition(String),
}

impl TypeError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
