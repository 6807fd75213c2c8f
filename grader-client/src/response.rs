//! Captured service responses and operation outcomes

use crate::error::GraderError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;

/// A fully read HTTP response from the grading service
///
/// The body is read eagerly so the response can be handed back to the caller
/// after the client has interpreted it.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ServiceResponse {
    /// Read a reqwest response to the end
    pub(crate) fn read(response: reqwest::blocking::Response) -> Result<Self, GraderError> {
        let url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();

        Ok(Self {
            url,
            status,
            headers,
            body,
        })
    }

    /// Final URL of the request
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The declared media type without parameters, lowercased
    pub fn content_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value
            .split_once(';')
            .map_or(value, |(essence, _)| essence)
            .trim();
        if essence.is_empty() {
            None
        } else {
            Some(essence.to_ascii_lowercase())
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GraderError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Result of an operation that reached the service
///
/// Statuses other than 200 are not errors: they come back as
/// [`Outcome::ServerRejected`] with the response attached so the caller can
/// decide what they mean. The one exception is a 500 on a download, which
/// fails with [`GraderError::RemoteNotFound`].
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The service answered 200 and the derived value was extracted
    Success {
        /// The service response
        response: ServiceResponse,
        /// Identifier or destination path produced by the operation
        value: T,
    },
    /// The service answered with some other status
    ServerRejected(ServiceResponse),
}

impl<T> Outcome<T> {
    /// The service response, whichever way the call went
    pub fn response(&self) -> &ServiceResponse {
        match self {
            Outcome::Success { response, .. } => response,
            Outcome::ServerRejected(response) => response,
        }
    }

    /// The derived value on success
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::ServerRejected(_) => None,
        }
    }

    /// Whether the service answered 200
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Split into the response and the derived value, if any
    pub fn into_parts(self) -> (ServiceResponse, Option<T>) {
        match self {
            Outcome::Success { response, value } => (response, Some(value)),
            Outcome::ServerRejected(response) => (response, None),
        }
    }

    /// Consume and return the derived value, if any
    pub fn into_value(self) -> Option<T> {
        self.into_parts().1
    }
}
