//! Opaque reference to a user owned by an external identity provider.

use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Foreign key to an externally managed user.
///
/// The value is stored and matched verbatim. Search treats it as the user's
/// display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UserRef(String);

impl UserRef {
    /// Wraps an identity-provider reference.
    ///
    /// # Errors
    /// - `ValidationError::BlankField("user")` for empty or whitespace input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::BlankField("user"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserRef> for String {
    fn from(value: UserRef) -> Self {
        value.0
    }
}

impl Display for UserRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
