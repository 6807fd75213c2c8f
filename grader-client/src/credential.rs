//! Opaque service credential

use crate::error::GraderError;
use std::fmt;
use zeroize::Zeroizing;

/// Bearer-style token presented to the grading service
///
/// The token is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a token, rejecting an empty one
    ///
    /// # Errors
    ///
    /// Returns `GraderError::InvalidArgument` if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, GraderError> {
        let token = Zeroizing::new(token.into());
        crate::validate::validate_credential(Some(token.as_str()))?;
        Ok(Credential(token))
    }

    /// The raw token
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
