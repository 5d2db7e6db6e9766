use std::fmt;

/// How a failed operation is surfaced to the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or generic server failure.
    Transport,
    /// HTTP 413; the server explains the size limit.
    PayloadTooLarge { message: String },
    /// HTTP 403; rendered as an access-denied state, never as a banner.
    PermissionDenied,
    /// Some items of a multi-item operation failed.
    PartialFailure,
    /// Pre-flight checks on an upload batch failed.
    Validation,
}

impl FailureKind {
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport failure"),
            Self::PayloadTooLarge { message } => write!(f, "payload too large: {message}"),
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::PartialFailure => f.write_str("partial failure"),
            Self::Validation => f.write_str("validation failure"),
        }
    }
}
