use shared::types::RoleClass;
use thiserror::Error;

use crate::storage::StorageError;
use crate::transport::TransportError;

/// Everything a call through [`crate::AuthClient`] can fail with.
///
/// Pages branch on the variant: `AuthRequired` means "send the user to a
/// login screen", `Http` carries the backend's own message, `Network` means
/// the request never completed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The session could not be refreshed; local credentials are gone.
    #[error("authentication required")]
    AuthRequired,

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("could not parse response: {0}")]
    Parse(String),

    /// Login succeeded at the HTTP level but the token is for another kind
    /// of account. The token was not stored.
    #[error("{}", .expected.mismatch_message())]
    RoleMismatch { expected: RoleClass },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::RoleMismatch { .. } => "ROLE_MISMATCH",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Text suitable for showing to the user as-is.
    pub fn to_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Please check your connection.".to_string()
            }
            Self::AuthRequired => "Your session has expired. Please sign in again.".to_string(),
            Self::Http { message, .. } => message.clone(),
            Self::Parse(_) => "The server sent an unexpected response.".to_string(),
            Self::RoleMismatch { expected } => expected.mismatch_message().to_string(),
            Self::InvalidRequest(_) => "The request could not be sent.".to_string(),
            Self::Storage(_) => "Could not access the saved session.".to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let errors = [
            ApiError::Network(TransportError::Connect("refused".into())),
            ApiError::AuthRequired,
            ApiError::Http {
                status: 500,
                message: "boom".into(),
            },
            ApiError::Parse("eof".into()),
            ApiError::RoleMismatch {
                expected: RoleClass::User,
            },
            ApiError::InvalidRequest("bad uri".into()),
            ApiError::Storage(StorageError::Poisoned),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.to_code()).collect();
        assert_eq!(codes.len(), errors.len());
        for e in &errors {
            assert!(!e.to_message().is_empty());
        }
    }

    #[test]
    fn http_error_shows_backend_message() {
        let err = ApiError::Http {
            status: 409,
            message: "Email already exists".into(),
        };
        assert_eq!(err.to_message(), "Email already exists");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn role_mismatch_names_the_other_form() {
        let err = ApiError::RoleMismatch {
            expected: RoleClass::Employer,
        };
        assert!(err.to_string().contains("job seeker"));
    }
}
