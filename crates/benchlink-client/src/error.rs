//! Error types for server communication

use thiserror::Error;

/// Errors raised by [`crate::RemoteJobClient`] operations.
///
/// `ConnectionMissing` is a precondition failure: the caller must
/// re-authenticate, the client never retries it. `NotFound` is split out from
/// the generic `Remote` variant so pollers and download paths can stop instead
/// of retrying a resource that will never appear.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no active session; log in before calling the server")]
    ConnectionMissing,

    #[error("server returned status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("transport error: {reason}")]
    Transport { reason: String },

    #[error("malformed server response: {reason}")]
    Decode { reason: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode {
                reason: err.to_string(),
            }
        } else {
            ClientError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

impl ClientError {
    /// Whether the polling loop may swallow this error and retry on the next
    /// tick. A missing session can never recover on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, ClientError::ConnectionMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_missing_is_not_transient() {
        assert!(!ClientError::ConnectionMissing.is_transient());
    }

    #[test]
    fn test_remote_error_is_transient() {
        let err = ClientError::Remote {
            status: 500,
            message: "internal".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ClientError::Remote {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "server returned status 403: forbidden");

        let err = ClientError::NotFound {
            resource: "report r.zip".to_string(),
        };
        assert!(err.to_string().contains("r.zip"));
    }
}
