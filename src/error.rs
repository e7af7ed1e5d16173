use std::time::Duration;

/// Boxed error used to carry collaborator failures across the dial boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal outcome of a connect call.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Malformed target, or a dial error the collaborator marked permanent.
    /// Never retried.
    #[error("invalid target: {reason}")]
    InvalidTarget {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
    /// Every allowed dial failed.
    #[error("connection exhausted after {attempts} attempts: {source}")]
    ConnectionExhausted {
        /// Total dial attempts made (`max_retries + 1`).
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        source: BoxError,
    },
    /// The overall connect deadline elapsed before a dial succeeded.
    #[error("connect deadline of {deadline:?} exceeded after {attempts} failed attempts")]
    DeadlineExceeded { deadline: Duration, attempts: u32 },
}

impl ConnectError {
    pub(crate) fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
            source: None,
        }
    }

    /// Returns `true` for the retry-budget-consumed outcome.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ConnectionExhausted { .. })
    }
}

/// A single dial did not finish within `ConnectParams::dial_timeout`.
#[derive(Debug, thiserror::Error)]
#[error("dial timed out after {0:?}")]
pub struct DialTimedOut(pub Duration);

/// Failure to assemble connection settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(String),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
    #[error("reading settings file failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("parsing settings file failed: {0}")]
    Parse(#[from] serde_json::Error),
}
