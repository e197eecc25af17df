//! Error types for DocScout

use thiserror::Error;

/// Coarse classification of a [`DocScoutError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (URL, repository identifier, tool arguments)
    Validation,
    /// Transport or remote service failure
    Network,
    /// Repository or archive does not exist
    NotFound,
    /// Local filesystem or archive extraction failure
    Io,
    /// Assistant tool-call round limit reached
    Limit,
}

/// Errors that can occur in DocScout operations
#[derive(Debug, Error)]
pub enum DocScoutError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL failed to parse or has a non-HTTP scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Repository identifier is malformed
    #[error("Invalid GitHub repository: {0}")]
    InvalidRepo(String),

    /// Word to count is empty
    #[error("Missing required parameter: word")]
    EmptyWord,

    /// Tool name is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments do not match the tool schema
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Hosted model credential is not configured
    #[error("{0} environment variable is not set")]
    MissingApiKey(&'static str),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    Connect(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Other request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Hosted model returned an unusable response
    #[error("Model error: {0}")]
    Model(String),

    /// Repository archive does not exist
    #[error("Repository {0} not found")]
    RepoNotFound(String),

    /// Archive could not be read or extracted
    #[error("Archive error: {0}")]
    Archive(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Assistant exceeded the configured number of tool-call rounds
    #[error("Tool call limit reached after {0} rounds without a final answer")]
    ToolRoundLimit(usize),
}

impl DocScoutError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DocScoutError::Timeout
        } else if err.is_connect() {
            DocScoutError::Connect(err)
        } else {
            DocScoutError::Request(err.to_string())
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocScoutError::MissingUrl
            | DocScoutError::InvalidUrl(_)
            | DocScoutError::InvalidRepo(_)
            | DocScoutError::EmptyWord
            | DocScoutError::UnknownTool(_)
            | DocScoutError::InvalidArguments(_)
            | DocScoutError::MissingApiKey(_) => ErrorKind::Validation,
            DocScoutError::ClientBuild(_)
            | DocScoutError::Connect(_)
            | DocScoutError::Timeout
            | DocScoutError::Request(_)
            | DocScoutError::HttpStatus { .. }
            | DocScoutError::Model(_) => ErrorKind::Network,
            DocScoutError::RepoNotFound(_) => ErrorKind::NotFound,
            DocScoutError::Archive(_) | DocScoutError::Io(_) => ErrorKind::Io,
            DocScoutError::ToolRoundLimit(_) => ErrorKind::Limit,
        }
    }
}

impl From<zip::result::ZipError> for DocScoutError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => DocScoutError::Io(e),
            other => DocScoutError::Archive(other.to_string()),
        }
    }
}

/// Result alias used across the crate
pub type Result<T, E = DocScoutError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DocScoutError::MissingUrl.to_string(),
            "Missing required parameter: url"
        );
        assert_eq!(
            DocScoutError::RepoNotFound("owner/repo".to_string()).to_string(),
            "Repository owner/repo not found"
        );
        assert_eq!(
            DocScoutError::HttpStatus {
                status: 503,
                url: "https://r.jina.ai/https://example.com".to_string()
            }
            .to_string(),
            "HTTP 503 from https://r.jina.ai/https://example.com"
        );
        assert_eq!(
            DocScoutError::MissingApiKey("OPENAI_API_KEY").to_string(),
            "OPENAI_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DocScoutError::MissingUrl.kind(), ErrorKind::Validation);
        assert_eq!(
            DocScoutError::InvalidRepo("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(DocScoutError::Timeout.kind(), ErrorKind::Network);
        assert_eq!(
            DocScoutError::RepoNotFound("a/b".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DocScoutError::Archive("bad".to_string()).kind(),
            ErrorKind::Io
        );
        assert_eq!(DocScoutError::ToolRoundLimit(3).kind(), ErrorKind::Limit);
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: DocScoutError = zip::result::ZipError::FileNotFound.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err, DocScoutError::Archive(_)));
    }
}
