use thiserror::Error;

pub type Result<T, E = MapError> = std::result::Result<T, E>;

/// Failures raised by the map core.
///
/// `Configuration` aborts only the descriptor item it names; `ExternalFetch`
/// is recovered by the caller; `InvariantViolation` means a caller referenced
/// something the map never registered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("invalid {context}: {reason}")]
    Configuration { context: String, reason: String },
    #[error("external fetch failed: {0}")]
    ExternalFetch(String),
    #[error("unknown {kind} `{name}`")]
    InvariantViolation { kind: &'static str, name: String },
    #[error("invalid zoom level {0}")]
    InvalidZoom(f64),
    #[error("layer `{0}` is not attached to a map")]
    Detached(String),
}

impl MapError {
    pub fn config(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::InvariantViolation {
            kind,
            name: name.into(),
        }
    }
}
