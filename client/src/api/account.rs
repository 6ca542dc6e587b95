use serde_json::Value;
use shared::types::{
    ApiEnvelope, ChangePasswordData, CompanyRegistrationData, ForgotPasswordData, LoginData,
    RegistrationData, RegistrationResponse, ResetPasswordData, RoleClass, TokenResponse,
    VerifyOtpData,
};
use tracing::{info, warn};

use super::client::{AuthClient, CallOptions};
use super::{
    CHANGE_PASSWORD_PATH, FORGOT_PASSWORD_PATH, REGISTER_EMPLOYER_PATH, REGISTER_USER_PATH,
    RESET_PASSWORD_PATH, VERIFY_EMAIL_PATH,
};
use crate::auth::validate_role;
use crate::error::ApiError;
use crate::events::{LogoutReason, SessionEvent};
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Sign in / sign out
// ---------------------------------------------------------------------------

impl<T: Transport> AuthClient<T> {
    /// Sign in through the login flow for `expected`.
    ///
    /// The token is stored only if its role claim matches `expected`;
    /// otherwise it is dropped and [`ApiError::RoleMismatch`] is returned so
    /// the form can point the user at the right sign-in page.
    pub async fn login(&self, credentials: &LoginData, expected: RoleClass) -> Result<String, ApiError> {
        let options = CallOptions::post().anonymous().json(credentials)?;
        let login_path = self.config().auth.login_path.clone();

        let envelope: ApiEnvelope<TokenResponse> =
            match self.call_envelope(&login_path, options).await {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!("Login failed for {}: {}", credentials.email, e);
                    return Err(e);
                }
            };

        let token = envelope
            .result
            .and_then(TokenResponse::into_token)
            .ok_or_else(|| ApiError::Parse("login response carried no token".into()))?;

        if !validate_role(&token, expected) {
            warn!(
                "Login for {} rejected: token is not for a {} account",
                credentials.email, expected
            );
            return Err(ApiError::RoleMismatch { expected });
        }

        self.store().save(&token, expected)?;
        info!("{} signed in as {}", credentials.email, expected);
        self.events().emit(SessionEvent::LoggedIn { role: expected });

        Ok(token)
    }

    pub async fn login_user(&self, credentials: &LoginData) -> Result<String, ApiError> {
        self.login(credentials, RoleClass::User).await
    }

    pub async fn login_employer(&self, credentials: &LoginData) -> Result<String, ApiError> {
        self.login(credentials, RoleClass::Employer).await
    }

    pub async fn login_admin(&self, credentials: &LoginData) -> Result<String, ApiError> {
        self.login(credentials, RoleClass::Admin).await
    }

    /// Tell the backend to revoke the session, then forget it locally.
    ///
    /// The backend call is best-effort: its failure is logged and the local
    /// session is cleared regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = self.url(&self.config().auth.logout_path);
        let token = self.store().read().unwrap_or_else(|e| {
            warn!("Could not read session token for logout: {}", e);
            None
        });

        match self.send(&url, &CallOptions::post(), token.as_deref()).await {
            Ok(response) if response.is_success() => info!("Backend session revoked"),
            Ok(response) => warn!("Logout endpoint returned {}", response.status),
            Err(e) => warn!("Logout request failed: {}", e),
        }

        self.store().clear()?;
        info!("Signed out");
        self.events().emit(SessionEvent::LoggedOut {
            reason: LogoutReason::UserInitiated,
        });

        Ok(())
    }

    /// A token is stored (it may still be expired).
    pub fn is_authenticated(&self) -> bool {
        self.store().is_present()
    }

    /// True when a live token is available, refreshing at most once.
    pub async fn ensure_valid_token(&self) -> Result<bool, ApiError> {
        Ok(self.get_valid_token().await?.is_some())
    }

    /// Role claim of the stored token, trimmed.
    pub fn current_role(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store().stored_role()?)
    }

    /// Which login flow produced the stored session.
    pub fn current_role_class(&self) -> Result<Option<RoleClass>, ApiError> {
        Ok(self.store().role_class()?)
    }
}

// ---------------------------------------------------------------------------
// Registration and password management
// ---------------------------------------------------------------------------

impl<T: Transport> AuthClient<T> {
    /// Register a job seeker account. The role is always `USER`.
    pub async fn register_user(&self, data: &RegistrationData) -> Result<RegistrationResponse, ApiError> {
        let mut data = data.clone();
        data.role = Some(RoleClass::User.claim().to_string());

        let options = CallOptions::post().anonymous().json(&data)?;
        let response: RegistrationResponse = self.call_result(REGISTER_USER_PATH, options).await?;
        info!("Registered job seeker account {}", response.email);
        Ok(response)
    }

    /// Register an employer account from the company sign-up form.
    pub async fn register_employer(
        &self,
        company: &CompanyRegistrationData,
    ) -> Result<RegistrationResponse, ApiError> {
        let data = company.to_registration_now();

        let options = CallOptions::post().anonymous().json(&data)?;
        let response: RegistrationResponse = self.call_result(REGISTER_EMPLOYER_PATH, options).await?;
        info!("Registered employer account {}", response.email);
        Ok(response)
    }

    /// Request a password reset OTP. Returns the backend's confirmation text.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let body = ForgotPasswordData {
            email: email.to_string(),
        };
        let options = CallOptions::post().anonymous().json(&body)?;
        self.confirmation(FORGOT_PASSWORD_PATH, options).await
    }

    pub async fn reset_password(&self, data: &ResetPasswordData) -> Result<String, ApiError> {
        let options = CallOptions::post().anonymous().json(data)?;
        self.confirmation(RESET_PASSWORD_PATH, options).await
    }

    pub async fn verify_email(&self, data: &VerifyOtpData) -> Result<Value, ApiError> {
        let options = CallOptions::post().anonymous().json(data)?;
        let envelope: ApiEnvelope<Value> = self.call_envelope(VERIFY_EMAIL_PATH, options).await?;
        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Change the signed-in account's password.
    pub async fn change_password(&self, data: &ChangePasswordData) -> Result<String, ApiError> {
        let options = CallOptions::post().json(data)?;
        self.confirmation(CHANGE_PASSWORD_PATH, options).await
    }

    async fn confirmation(&self, endpoint: &str, options: CallOptions) -> Result<String, ApiError> {
        let envelope: ApiEnvelope<String> = self.call_envelope(endpoint, options).await?;
        Ok(envelope.result.or(envelope.message).unwrap_or_default())
    }
}
