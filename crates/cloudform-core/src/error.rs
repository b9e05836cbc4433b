//! Error types for the reconciliation core

use thiserror::Error;

/// Errors raised by the reconciliation core
#[derive(Error, Debug)]
pub enum CloudError {
    /// A composite identity string could not be decoded
    #[error("Invalid identity {raw:?}: {reason}")]
    Structural { raw: String, reason: String },

    /// A plan or identity violates a static schema constraint
    #[error("Validation failed for {attribute}: {message}")]
    Validation { attribute: String, message: String },

    /// An immutable attribute changed; only delete-then-create can satisfy the plan
    #[error("Attribute {attribute} cannot be changed in place; the resource must be replaced")]
    ReplacementRequired { attribute: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn structural(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// The attribute this error points at, if any
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Validation { attribute, .. } | Self::ReplacementRequired { attribute } => {
                Some(attribute)
            }
            _ => None,
        }
    }

    /// The classified remote failure, if this error came from the adapter boundary
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure reported by a remote API, classified once at the adapter boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict ({status}): {message}")]
    Conflict { status: u16, message: String },

    #[error("transient failure ({status}): {message}")]
    Transient { status: u16, message: String },

    #[error("{}", unclassified_message(.status, .message))]
    Unclassified { status: Option<u16>, message: String },
}

fn unclassified_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("remote error ({status}): {message}"),
        None => format!("remote error: {message}"),
    }
}

impl RemoteError {
    /// Classify a remote failure by its status code.
    ///
    /// `None` means the request never produced a response (transport failure
    /// after the client's own retries were exhausted).
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            Some(404) => Self::NotFound { message },
            Some(status @ (400 | 409)) => Self::Conflict { status, message },
            Some(status @ (408 | 429 | 500..=599)) => Self::Transient { status, message },
            status => Self::Unclassified { status, message },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            status: 409,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Conflict { status, .. } | Self::Transient { status, .. } => Some(*status),
            Self::Unclassified { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Conflict { message, .. }
            | Self::Transient { message, .. }
            | Self::Unclassified { message, .. } => message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_codes() {
        assert!(RemoteError::classify(Some(404), "gone").is_not_found());
        assert_eq!(
            RemoteError::classify(Some(400), "bad"),
            RemoteError::Conflict {
                status: 400,
                message: "bad".to_string()
            }
        );
        assert!(matches!(
            RemoteError::classify(Some(409), "busy"),
            RemoteError::Conflict { status: 409, .. }
        ));
        assert!(RemoteError::classify(Some(429), "slow down").is_transient());
        assert!(RemoteError::classify(Some(503), "unavailable").is_transient());
        assert!(matches!(
            RemoteError::classify(Some(401), "unauthorized"),
            RemoteError::Unclassified {
                status: Some(401),
                ..
            }
        ));
        assert!(matches!(
            RemoteError::classify(None, "connection reset"),
            RemoteError::Unclassified { status: None, .. }
        ));
    }

    #[test]
    fn test_remote_error_display() {
        let err = CloudError::from(RemoteError::classify(Some(500), "boom"));
        assert_eq!(err.to_string(), "transient failure (500): boom");

        let err = RemoteError::classify(None, "timed out");
        assert_eq!(err.to_string(), "remote error: timed out");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_attribute() {
        let err = CloudError::ReplacementRequired {
            attribute: "region".to_string(),
        };
        assert_eq!(err.attribute(), Some("region"));
        assert_eq!(CloudError::structural("1:2", "segment count mismatch").attribute(), None);
    }
}
