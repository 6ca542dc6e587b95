pub mod client_config;
pub mod envelope;
pub mod jwt;
pub mod login;
pub mod profile;
pub mod register;
pub mod settings;

pub use self::client_config::{ApiConfig, AuthConfig, ClientConfig, ConfigError, StorageConfig};
pub use self::envelope::{ApiEnvelope, TokenResponse};
pub use self::jwt::{RoleClass, TokenClaims};
pub use self::login::LoginData;
pub use self::profile::{UserProfile, UserUpdateData};
pub use self::register::{CompanyRegistrationData, RegistrationData, RegistrationResponse};
pub use self::settings::{ChangePasswordData, ForgotPasswordData, ResetPasswordData, VerifyOtpData};
