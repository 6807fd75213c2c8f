//! Grader Client Library
//!
//! Blocking client for the answer-sheet grading service. It wraps the
//! service's five operations behind a validated interface:
//!
//! - upload an answer sheet image
//! - process it into marked answers and a confirmation image
//! - download the marked answers (JSON)
//! - download the confirmation image (JPEG)
//! - replace the marked answers with a corrected file
//!
//! # Features
//!
//! - Inputs are validated before any request is sent
//! - Per-call overrides for base URL, credential and identifier
//! - Non-200 replies come back as [`Outcome::ServerRejected`] instead of errors
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Well-typed errors using thiserror, `tracing` events for every request
//!
//! # Example
//!
//! ```no_run
//! use grader_client::{GraderClient, Outcome, Overrides};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraderClient::new("https://actgrader.com", "oauth-token")?;
//!
//! let uri = match client.upload_image("scans/sheet.jpg", &Overrides::new())? {
//!     Outcome::Success { value, .. } => value,
//!     Outcome::ServerRejected(response) => {
//!         println!("Upload rejected: {}", response.status());
//!         return Ok(());
//!     }
//! };
//!
//! let for_sheet = Overrides::new().uri(uri);
//! client.process_image(&for_sheet)?;
//! client.download_marked_answers("out/answers.json", &for_sheet)?;
//! client.download_confirmation_image("out/confirmation.jpg", &for_sheet)?;
//! # Ok(())
//! # }
//! ```

mod client;
mod credential;
mod endpoint;
mod error;
mod response;
mod validate;

pub use client::{
    DOWNLOAD_DIR_ENV, GraderClient, GraderClientBuilder, Overrides, TOKEN_ENV, URL_ENV,
};
pub use credential::Credential;
pub use endpoint::RemoteUrl;
pub use error::GraderError;
pub use response::{Outcome, ServiceResponse};
pub use validate::{
    IMAGE_EXTENSIONS, resolve, validate_credential, validate_destination, validate_image_path,
    validate_uri, validate_url,
};
