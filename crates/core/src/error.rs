use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A malformed AIR identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid AIR: {0}")]
    InvalidAir(String),
    #[error("invalid model id: '{0}' too many '.' characters")]
    TooManyDots(String),
    #[error("invalid model id: '{0}' too many '@' characters")]
    TooManyAts(String),
    #[error("unable to parse {field}: '{fragment}' to integer")]
    InvalidNumber {
        field: &'static str,
        fragment: String,
    },
}

/// Classification of a non-2xx response from the model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Unauthorized,
    ClientError(u16),
    ServiceError(u16),
    Other(u16),
}

impl RemoteStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            401 => RemoteStatus::Unauthorized,
            400..=499 => RemoteStatus::ClientError(code),
            500..=599 => RemoteStatus::ServiceError(code),
            _ => RemoteStatus::Other(code),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            RemoteStatus::Unauthorized => 401,
            RemoteStatus::ClientError(code)
            | RemoteStatus::ServiceError(code)
            | RemoteStatus::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteStatus::Unauthorized => {
                write!(f, "401: Unauthorized request, check your API key")
            }
            RemoteStatus::ClientError(code) => write!(f, "{}: Bad request", code),
            RemoteStatus::ServiceError(code) => write!(
                f,
                "{}: Service unavailable, the remote may be down or under maintenance",
                code
            ),
            RemoteStatus::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Everything that can go wrong while resolving or downloading one item.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP error {status} ({url})")]
    Status { status: RemoteStatus, url: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{0} has no primary file")]
    NoPrimaryFile(String),

    #[error("model {0} has no published versions")]
    NoVersions(i64),

    #[error("cannot derive a file name from image url '{0}'")]
    InvalidImageUrl(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gave up after {0:?}")]
    Timeout(Duration),
}

impl GrabError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GrabError::Io {
            path: path.into(),
            source,
        }
    }

    /// The remote status, when the failure was a non-2xx response.
    pub fn status(&self) -> Option<RemoteStatus> {
        match self {
            GrabError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(RemoteStatus::from_code(401), RemoteStatus::Unauthorized);
        assert_eq!(RemoteStatus::from_code(403), RemoteStatus::ClientError(403));
        assert_eq!(RemoteStatus::from_code(404), RemoteStatus::ClientError(404));
        assert_eq!(RemoteStatus::from_code(503), RemoteStatus::ServiceError(503));
        assert_eq!(RemoteStatus::from_code(302), RemoteStatus::Other(302));
    }

    #[test]
    fn test_status_code_is_preserved() {
        for code in [302, 401, 404, 429, 500, 599] {
            assert_eq!(RemoteStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_unauthorized_message_mentions_key() {
        let err = GrabError::Status {
            status: RemoteStatus::Unauthorized,
            url: "https://civitai.com/api/v1/models/1".to_string(),
        };
        assert!(err.to_string().contains("API key"));
        assert_eq!(err.status(), Some(RemoteStatus::Unauthorized));
    }
}
