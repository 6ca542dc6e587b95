//! The authenticated call wrapper and the backend services built on it.

pub mod account;
pub mod client;
pub mod profile;

pub use self::client::{AuthClient, AuthMode, CallOptions};

// Backend routes, relative to the configured base URL. Login, refresh and
// logout come from `AuthConfig` instead.
pub const REGISTER_USER_PATH: &str = "/api/v1/users/register";
pub const REGISTER_EMPLOYER_PATH: &str = "/api/v1/employers/register";
pub const FORGOT_PASSWORD_PATH: &str = "/api/v1/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/api/v1/auth/reset-password";
pub const VERIFY_EMAIL_PATH: &str = "/api/v1/users/verify-email";
pub const CHANGE_PASSWORD_PATH: &str = "/api/v1/users/change-password";
pub const MY_PROFILE_PATH: &str = "/api/v1/users/my-info";
pub const USERS_PATH: &str = "/api/v1/users";
