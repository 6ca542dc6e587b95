use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Body of `POST /users/register` and `POST /employers/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub fullname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Company sign-up form. The backend has no separate company account type at
/// registration time, so this is converted into a [`RegistrationData`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRegistrationData {
    pub company_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CompanyRegistrationData {
    /// Build the account payload. The user name is the company name,
    /// lowercased with all whitespace removed, suffixed with `millis`.
    /// The employer endpoint assigns the role itself.
    pub fn to_registration(&self, millis: u128) -> RegistrationData {
        let slug: String = self
            .company_name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        RegistrationData {
            user_name: format!("{}{}", slug, millis),
            email: self.email.clone(),
            password: self.password.clone(),
            fullname: self.company_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            dob: None,
            role: None,
        }
    }

    /// [`Self::to_registration`] stamped with the current wall-clock time.
    pub fn to_registration_now(&self) -> RegistrationData {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.to_registration(millis)
    }
}

/// `result` of a successful registration: the account id plus the key the
/// OTP verification step must echo back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub key_redis_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
