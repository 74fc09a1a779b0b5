use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const MAX_USER_ID_LEN: usize = 128;

/// Opaque identifier of the user recommendations are computed for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Trim and validate a caller-supplied id.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId("user id must not be blank".to_string()));
        }
        if trimmed.len() > MAX_USER_ID_LEN {
            return Err(DomainError::InvalidUserId(format!(
                "user id must be at most {MAX_USER_ID_LEN} bytes"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::InvalidUserId(
                "user id must not contain control characters".to_string(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
