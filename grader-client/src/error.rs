//! Error types for the grader client

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when using the grader client
///
/// Validation failures (`InvalidArgument`, `InvalidFormat`, `NotFound`) are
/// always raised before any request is sent. Transport failures are passed
/// through from reqwest unchanged.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GraderError {
    /// A required value was absent or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value was present but malformed (URL prefix, file extension)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A local file or directory is missing, or an image has an unsupported extension
    #[error("{message}: {}", .path.display())]
    NotFound {
        /// The offending local path
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// The service answered 500 for a download, meaning the identifier does not resolve
    #[error(
        "The {resource} could not be found at the URI {uri}. \
         Verify that you are using the exact URI returned by `GraderClient::process_image`"
    )]
    RemoteNotFound {
        /// Human-readable name of the requested artifact
        resource: &'static str,
        /// The identifier that was sent
        uri: String,
    },

    /// The service answered 200 but the payload is not the expected kind of file
    #[error(
        "The response does not appear to contain {expected} (content type: {content_type}). \
         Examine the response body to determine what was actually returned"
    )]
    ContentMismatch {
        /// Description of the expected payload
        expected: &'static str,
        /// The content type the service declared
        content_type: String,
    },

    /// The service answered 200 but the JSON body lacked a usable `uri`
    #[error("Malformed service response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Local file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl GraderError {
    /// Returns `true` if this error was raised by local validation, before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GraderError::InvalidArgument(_)
                | GraderError::InvalidFormat(_)
                | GraderError::NotFound { .. }
        )
    }
}
