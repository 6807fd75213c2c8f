//! Grading service client implementation

use crate::credential::Credential;
use crate::endpoint::{Endpoint, RemoteUrl};
use crate::error::GraderError;
use crate::response::{Outcome, ServiceResponse};
use crate::validate::{self, resolve};
use reqwest::StatusCode;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable holding the service base URL
pub const URL_ENV: &str = "GRADER_URL";
/// Environment variable holding the credential token
pub const TOKEN_ENV: &str = "GRADER_TOKEN";
/// Environment variable holding the default download directory
pub const DOWNLOAD_DIR_ENV: &str = "GRADER_DOWNLOAD_DIR";

/// File name the service expects for uploaded answer sheets
const UPLOAD_FILE_NAME: &str = "aOriginal.jpg";
/// File name the service expects for replacement marked answers
const UPDATE_FILE_NAME: &str = "updated_answers.json";

/// JSON reply of the upload, process and update endpoints
#[derive(Deserialize)]
struct UriReply {
    uri: String,
}

/// A file the service can hand back for an answer sheet
struct Artifact {
    endpoint: Endpoint,
    extension: &'static str,
    resource: &'static str,
    expected: &'static str,
    accepts: fn(&str) -> bool,
}

const MARKED_ANSWERS: Artifact = Artifact {
    endpoint: Endpoint::DownloadMarkedAnswers,
    extension: "json",
    resource: "extracted answers",
    expected: "a json file",
    accepts: |content_type| {
        matches!(
            content_type,
            "application/json" | "application/octet-stream" | "text/plain"
        ) || content_type.ends_with("+json")
    },
};

const CONFIRMATION_IMAGE: Artifact = Artifact {
    endpoint: Endpoint::DownloadConfirmationImage,
    extension: "jpg",
    resource: "confirmation image",
    expected: "an image file",
    accepts: |content_type| {
        content_type.starts_with("image/") || content_type == "application/octet-stream"
    },
};

/// Per-call replacements for the client's configured values
///
/// Anything left unset falls back to the client's own field.
///
/// # Example
///
/// ```
/// use grader_client::Overrides;
///
/// let overrides = Overrides::new()
///     .uri("sheet-0042")
///     .base_url("http://localhost:8080");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    base_url: Option<String>,
    credential: Option<String>,
    uri: Option<String>,
}

impl Overrides {
    /// No overrides: use the client's configuration as is
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another base URL for this call
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use another credential for this call
    pub fn credential(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(token.into());
        self
    }

    /// Use another resource identifier for this call
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("uri", &self.uri)
            .finish()
    }
}

/// The grading service client
///
/// Wraps the five service operations. Every operation validates its inputs
/// before sending anything, then returns an [`Outcome`]: `Success` for HTTP
/// 200, `ServerRejected` for other statuses. Identifiers returned by the
/// service are never stored on the client; call [`GraderClient::set_uri`] to
/// make one the default.
///
/// # Example
///
/// ```no_run
/// use grader_client::{GraderClient, Overrides};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = GraderClient::new("https://actgrader.com", "oauth-token")?;
///
/// let upload = client.upload_image("scans/sheet.jpg", &Overrides::new())?;
/// if let Some(uri) = upload.value() {
///     client.set_uri(uri.clone());
///     client.process_image(&Overrides::new())?;
///     client.download_marked_answers("out/answers.json", &Overrides::new())?;
///     client.download_confirmation_image("out/confirmation.jpg", &Overrides::new())?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GraderClient {
    client: reqwest::blocking::Client,
    base_url: RemoteUrl,
    credential: Credential,
    uri: Option<String>,
    download_directory: Option<PathBuf>,
}

impl GraderClient {
    /// Create a client for the service at `url`
    ///
    /// # Errors
    ///
    /// * `GraderError::InvalidArgument` - empty credential
    /// * `GraderError::InvalidFormat` - URL without an `http://` or `https://` prefix, or empty
    /// * `GraderError::ClientInit` - the HTTP client cannot be initialized
    pub fn new(url: &str, credential: impl Into<String>) -> Result<Self, GraderError> {
        Self::builder().base_url(url)?.credential(credential)?.build()
    }

    /// Create a client configured from `GRADER_URL`, `GRADER_TOKEN` and
    /// optionally `GRADER_DOWNLOAD_DIR`
    pub fn from_env() -> Result<Self, GraderError> {
        GraderClientBuilder::from_env()?.build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> GraderClientBuilder {
        GraderClientBuilder::new()
    }

    /// Configured base URL
    pub fn base_url(&self) -> &RemoteUrl {
        &self.base_url
    }

    /// Replace the base URL
    pub fn set_base_url(&mut self, url: &str) -> Result<(), GraderError> {
        self.base_url = RemoteUrl::parse(url)?;
        Ok(())
    }

    /// Configured credential
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Replace the credential
    pub fn set_credential(&mut self, token: impl Into<String>) -> Result<(), GraderError> {
        self.credential = Credential::new(token)?;
        Ok(())
    }

    /// Default resource identifier, if one is set
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Make `uri` the default resource identifier
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = Some(uri.into());
    }

    /// Forget the default resource identifier
    pub fn clear_uri(&mut self) {
        self.uri = None;
    }

    /// Default download directory, if one is set
    pub fn download_directory(&self) -> Option<&Path> {
        self.download_directory.as_deref()
    }

    /// Set the default download directory
    pub fn set_download_directory(&mut self, directory: impl Into<PathBuf>) {
        self.download_directory = Some(directory.into());
    }

    /// `file_name` inside the default download directory
    ///
    /// Returns `None` when no download directory is configured. The
    /// directory is not created.
    pub fn download_path(&self, file_name: &str) -> Option<PathBuf> {
        self.download_directory
            .as_ref()
            .map(|directory| directory.join(file_name))
    }

    /// Upload an answer sheet image
    ///
    /// The image is sent as a multipart `file` part named `aOriginal.jpg`. No
    /// processing is started; the service only stores the image and creates a
    /// new resource for it.
    ///
    /// # Returns
    ///
    /// * `Outcome::Success` - carries the identifier of the new resource
    /// * `Outcome::ServerRejected` - any status other than 200
    ///
    /// # Errors
    ///
    /// * `GraderError::NotFound` - missing image or extension outside jpg, jpeg, png, tif, tiff
    /// * `GraderError::InvalidArgument` / `GraderError::InvalidFormat` - bad URL or credential
    /// * `GraderError::MalformedResponse` - 200 reply without a `uri`
    /// * `GraderError::Request` - transport failure
    pub fn upload_image(
        &self,
        path: impl AsRef<Path>,
        overrides: &Overrides,
    ) -> Result<Outcome<String>, GraderError> {
        let path = path.as_ref();
        validate::validate_image_path(path)?;
        let base_url = self.effective_url(overrides)?;
        self.check_credential(overrides)?;

        let image = fs::read(path)?;
        let form = Form::new().part("file", Part::bytes(image).file_name(UPLOAD_FILE_NAME));

        let url = base_url.endpoint(Endpoint::UploadImage);
        let response = self.send(Endpoint::UploadImage, self.client.post(&url).multipart(form))?;
        Self::uri_outcome(Endpoint::UploadImage, response)
    }

    /// Process an uploaded answer sheet
    ///
    /// The service extracts the marked answers into a JSON file and renders a
    /// confirmation image. Nothing is downloaded; use
    /// [`GraderClient::download_marked_answers`] and
    /// [`GraderClient::download_confirmation_image`] for that.
    ///
    /// # Errors
    ///
    /// * `GraderError::InvalidArgument` - no identifier given or configured
    /// * `GraderError::InvalidArgument` / `GraderError::InvalidFormat` - bad URL or credential
    /// * `GraderError::MalformedResponse` - 200 reply without a `uri`
    /// * `GraderError::Request` - transport failure
    pub fn process_image(&self, overrides: &Overrides) -> Result<Outcome<String>, GraderError> {
        let base_url = self.effective_url(overrides)?;
        self.check_credential(overrides)?;
        let uri = validate::validate_uri(self.effective_uri(overrides))?;

        let url = base_url.endpoint(Endpoint::ProcessImage);
        let response = self.send(
            Endpoint::ProcessImage,
            self.client.post(&url).form(&[("uri", uri)]),
        )?;
        Self::uri_outcome(Endpoint::ProcessImage, response)
    }

    /// Replace the service's marked answers with a corrected JSON file
    ///
    /// Meant for fixing answers the service misread. The identifier is not
    /// validated here: without one, the request goes out with no `uri` part
    /// and the service decides.
    ///
    /// # Errors
    ///
    /// * `GraderError::InvalidArgument` / `GraderError::InvalidFormat` - bad URL or credential
    /// * `GraderError::Io` - the JSON file cannot be read
    /// * `GraderError::MalformedResponse` - 200 reply without a `uri`
    /// * `GraderError::Request` - transport failure
    pub fn update_marked_answers(
        &self,
        path: impl AsRef<Path>,
        overrides: &Overrides,
    ) -> Result<Outcome<String>, GraderError> {
        let path = path.as_ref();
        let base_url = self.effective_url(overrides)?;
        self.check_credential(overrides)?;

        let mut form = Form::new();
        match self.effective_uri(overrides) {
            Some(uri) => form = form.text("uri", uri.to_string()),
            None => warn!(
                operation = Endpoint::UpdateMarkedAnswers.name(),
                "no URI given or configured, sending update without one"
            ),
        }
        let answers = fs::read(path)?;
        let form = form.part("file", Part::bytes(answers).file_name(UPDATE_FILE_NAME));

        let url = base_url.endpoint(Endpoint::UpdateMarkedAnswers);
        let response = self.send(
            Endpoint::UpdateMarkedAnswers,
            self.client.put(&url).multipart(form),
        )?;
        Self::uri_outcome(Endpoint::UpdateMarkedAnswers, response)
    }

    /// Download the marked answers of a processed sheet as a JSON file
    ///
    /// `destination` must end in `.json` and its directory must exist. The
    /// response body is written to it verbatim.
    ///
    /// # Errors
    ///
    /// * `GraderError::NotFound` - the destination directory does not exist
    /// * `GraderError::InvalidFormat` - the destination does not end in `.json`
    /// * `GraderError::InvalidArgument` - no identifier given or configured
    /// * `GraderError::RemoteNotFound` - the service answered 500
    /// * `GraderError::ContentMismatch` - the 200 reply is not JSON-like
    /// * `GraderError::Io` - the destination cannot be written
    /// * `GraderError::Request` - transport failure
    pub fn download_marked_answers(
        &self,
        destination: impl AsRef<Path>,
        overrides: &Overrides,
    ) -> Result<Outcome<PathBuf>, GraderError> {
        let destination = destination.as_ref();
        validate::validate_destination(destination, MARKED_ANSWERS.extension)?;
        let uri = validate::validate_uri(self.effective_uri(overrides))?;
        let base_url = self.effective_url(overrides)?;
        self.check_credential(overrides)?;

        self.download(&MARKED_ANSWERS, destination, &base_url, uri)
    }

    /// Download the confirmation image of a processed sheet as a JPEG file
    ///
    /// `destination` must end in `.jpg` and its directory must exist. The
    /// response body is written to it verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`GraderClient::download_marked_answers`], with `.jpg` as the
    /// required extension and an image as the expected payload.
    pub fn download_confirmation_image(
        &self,
        destination: impl AsRef<Path>,
        overrides: &Overrides,
    ) -> Result<Outcome<PathBuf>, GraderError> {
        let destination = destination.as_ref();
        validate::validate_destination(destination, CONFIRMATION_IMAGE.extension)?;
        let uri = validate::validate_uri(self.effective_uri(overrides))?;
        self.check_credential(overrides)?;
        let base_url = self.effective_url(overrides)?;

        self.download(&CONFIRMATION_IMAGE, destination, &base_url, uri)
    }

    fn effective_url(&self, overrides: &Overrides) -> Result<RemoteUrl, GraderError> {
        match overrides.base_url.as_deref() {
            Some(url) => RemoteUrl::parse(url),
            None => Ok(self.base_url.clone()),
        }
    }

    fn check_credential(&self, overrides: &Overrides) -> Result<(), GraderError> {
        validate::validate_credential(resolve(
            overrides.credential.as_deref(),
            Some(self.credential.expose()),
        ))
        .map(|_| ())
    }

    fn effective_uri<'a>(&'a self, overrides: &'a Overrides) -> Option<&'a str> {
        resolve(overrides.uri.as_deref(), self.uri.as_deref())
    }

    /// Send a prepared request and read the whole response
    fn send(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<ServiceResponse, GraderError> {
        // TODO: attach the credential once the service documents which auth header it expects
        let request = request.build()?;
        debug!(
            operation = endpoint.name(),
            method = %request.method(),
            url = %request.url(),
            "sending request"
        );

        let response = ServiceResponse::read(self.client.execute(request)?)?;
        debug!(
            operation = endpoint.name(),
            status = %response.status(),
            bytes = response.body().len(),
            "received response"
        );
        Ok(response)
    }

    /// Interpret a reply whose 200 body is `{"uri": ...}`
    fn uri_outcome(
        endpoint: Endpoint,
        response: ServiceResponse,
    ) -> Result<Outcome<String>, GraderError> {
        if response.status() != StatusCode::OK {
            warn!(
                operation = endpoint.name(),
                status = %response.status(),
                "service rejected request"
            );
            return Ok(Outcome::ServerRejected(response));
        }

        let UriReply { uri } = response.json()?;
        info!(operation = endpoint.name(), uri = %uri, "request succeeded");
        Ok(Outcome::Success {
            response,
            value: uri,
        })
    }

    /// Fetch an artifact and write it to `destination`
    fn download(
        &self,
        artifact: &Artifact,
        destination: &Path,
        base_url: &RemoteUrl,
        uri: &str,
    ) -> Result<Outcome<PathBuf>, GraderError> {
        let url = base_url.endpoint(artifact.endpoint);
        let response = self.send(
            artifact.endpoint,
            self.client.post(&url).form(&[("uri", uri)]),
        )?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::INTERNAL_SERVER_ERROR => {
                return Err(GraderError::RemoteNotFound {
                    resource: artifact.resource,
                    uri: uri.to_string(),
                });
            }
            status => {
                warn!(
                    operation = artifact.endpoint.name(),
                    status = %status,
                    "service rejected request"
                );
                return Ok(Outcome::ServerRejected(response));
            }
        }

        if let Some(content_type) = response.content_type()
            && !(artifact.accepts)(&content_type)
        {
            return Err(GraderError::ContentMismatch {
                expected: artifact.expected,
                content_type,
            });
        }

        let mut file = File::create(destination)?;
        file.write_all(response.body())?;
        info!(
            operation = artifact.endpoint.name(),
            path = %destination.display(),
            bytes = response.body().len(),
            "download written"
        );

        Ok(Outcome::Success {
            response,
            value: destination.to_path_buf(),
        })
    }
}

/// Builder for configuring a grader client
///
/// The base URL and credential are required. Timeouts are only applied when
/// set explicitly with [`GraderClientBuilder::timeout`]; without one, requests
/// never time out, even on a custom reqwest `ClientBuilder`.
///
/// # Example
///
/// ```no_run
/// use grader_client::GraderClient;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraderClient::builder()
///     .base_url("http://localhost:8080")?
///     .credential("oauth-token")?
///     .download_directory("downloads")
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct GraderClientBuilder {
    base_url: Option<RemoteUrl>,
    credential: Option<Credential>,
    uri: Option<String>,
    download_directory: Option<PathBuf>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl GraderClientBuilder {
    /// Create a new builder with nothing configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder pre-filled from `GRADER_URL`, `GRADER_TOKEN` and
    /// `GRADER_DOWNLOAD_DIR`, where set
    ///
    /// # Errors
    ///
    /// Returns a validation error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, GraderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GraderError> {
        let mut builder = Self::new();
        if let Some(url) = lookup(URL_ENV) {
            builder = builder.base_url(&url)?;
        }
        if let Some(token) = lookup(TOKEN_ENV) {
            builder = builder.credential(token)?;
        }
        if let Some(directory) = lookup(DOWNLOAD_DIR_ENV) {
            builder = builder.download_directory(directory);
        }
        Ok(builder)
    }

    /// Set the service base URL
    ///
    /// # Errors
    ///
    /// Returns an error unless the URL starts with `http://` or `https://`.
    pub fn base_url(mut self, url: &str) -> Result<Self, GraderError> {
        self.base_url = Some(RemoteUrl::parse(url)?);
        Ok(self)
    }

    /// Set the credential token
    ///
    /// # Errors
    ///
    /// Returns `GraderError::InvalidArgument` if the token is empty.
    pub fn credential(mut self, token: impl Into<String>) -> Result<Self, GraderError> {
        self.credential = Some(Credential::new(token)?);
        Ok(self)
    }

    /// Set the default resource identifier
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the default download directory
    pub fn download_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.download_directory = Some(directory.into());
        self
    }

    /// Set the total request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client builder (proxies, TLS settings, ...)
    ///
    /// Any total timeout set on `builder` is replaced by the one configured
    /// with [`GraderClientBuilder::timeout`], or by none.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the grader client with the configured settings
    ///
    /// # Errors
    ///
    /// * `GraderError::InvalidArgument` - base URL or credential not set
    /// * `GraderError::ClientInit` - the HTTP client cannot be initialized
    pub fn build(self) -> Result<GraderClient, GraderError> {
        let base_url = self.base_url.ok_or_else(|| {
            GraderError::InvalidArgument(
                "The URL is missing. Set it with `base_url` or GRADER_URL.".to_string(),
            )
        })?;
        let credential = self.credential.ok_or_else(|| {
            GraderError::InvalidArgument(
                "The credential is missing. Set it with `credential` or GRADER_TOKEN."
                    .to_string(),
            )
        })?;

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());
        // None clears reqwest's blocking default of 30s
        let mut builder = builder.timeout(self.timeout);
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let client = builder
            .build()
            .map_err(|e| GraderError::ClientInit(e.to_string()))?;

        Ok(GraderClient {
            client,
            base_url,
            credential,
            uri: self.uri,
            download_directory: self.download_directory,
        })
    }
}
