use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
///
/// Some screens collect a user name instead of an email; the backend accepts
/// either in the `email` field.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(alias = "userName", alias = "username")]
    pub email: String,
    pub password: String,
}

impl LoginData {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Password stays out of logs and panics.
impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
