use serde::{Deserialize, Serialize};

/// Change password request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordData {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordData {
    pub email: String,
}

/// Completes a forgot-password round with the OTP the user received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordData {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Email verification after registration; `key_redis_token` comes from
/// [`super::RegistrationResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpData {
    pub key_redis_token: String,
    pub otp: String,
}
