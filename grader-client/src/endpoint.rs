//! Service endpoints and base URL handling

use crate::error::GraderError;
use std::fmt;

/// The five operations offered by the grading service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    UploadImage,
    ProcessImage,
    DownloadMarkedAnswers,
    DownloadConfirmationImage,
    UpdateMarkedAnswers,
}

impl Endpoint {
    /// Path of the endpoint relative to the service base URL
    pub(crate) const fn path(self) -> &'static str {
        match self {
            Endpoint::UploadImage => "api/upload/image",
            Endpoint::ProcessImage => "api/process/image",
            Endpoint::DownloadMarkedAnswers => "api/download/marked_answers",
            Endpoint::DownloadConfirmationImage => "api/download/confirmation_image",
            Endpoint::UpdateMarkedAnswers => "api/update/marked_answers",
        }
    }

    /// Operation name used in log events
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Endpoint::UploadImage => "upload_image",
            Endpoint::ProcessImage => "process_image",
            Endpoint::DownloadMarkedAnswers => "download_marked_answers",
            Endpoint::DownloadConfirmationImage => "download_confirmation_image",
            Endpoint::UpdateMarkedAnswers => "update_marked_answers",
        }
    }
}

/// Base URL of a grading service deployment
///
/// Only the scheme prefix is checked: the value must start with `http://` or
/// `https://`. Anything else about the address is left to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteUrl(String);

impl RemoteUrl {
    /// Validate and wrap a base URL
    ///
    /// # Errors
    ///
    /// Returns `GraderError::InvalidFormat` if the value lacks an `http://` or
    /// `https://` prefix, including when it is empty.
    pub fn parse(url: &str) -> Result<Self, GraderError> {
        crate::validate::validate_url(Some(url)).map(|url| RemoteUrl(url.to_string()))
    }

    /// The URL as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a relative path segment, keeping exactly one `/` between the parts
    ///
    /// # Example
    ///
    /// ```
    /// use grader_client::RemoteUrl;
    ///
    /// let base = RemoteUrl::parse("https://grader.example.com/").unwrap();
    /// assert_eq!(
    ///     base.join("/api/process/image"),
    ///     "https://grader.example.com/api/process/image"
    /// );
    /// ```
    pub fn join(&self, segment: &str) -> String {
        let base = self.0.trim_end_matches('/');
        let segment = segment.trim_start_matches('/');
        format!("{}/{}", base, segment)
    }

    pub(crate) fn endpoint(&self, endpoint: Endpoint) -> String {
        self.join(endpoint.path())
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RemoteUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RemoteUrl {
    type Error = GraderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RemoteUrl::parse(value)
    }
}

impl TryFrom<String> for RemoteUrl {
    type Error = GraderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RemoteUrl::parse(&value)
    }
}
