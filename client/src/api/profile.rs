use shared::types::{UserProfile, UserUpdateData};

use super::client::{AuthClient, CallOptions};
use super::{MY_PROFILE_PATH, USERS_PATH};
use crate::error::ApiError;
use crate::transport::Transport;

impl<T: Transport> AuthClient<T> {
    pub async fn my_profile(&self) -> Result<UserProfile, ApiError> {
        self.call_result(MY_PROFILE_PATH, CallOptions::get()).await
    }

    pub async fn update_my_profile(&self, update: &UserUpdateData) -> Result<UserProfile, ApiError> {
        let options = CallOptions::put().json(update)?;
        self.call_result(MY_PROFILE_PATH, options).await
    }

    pub async fn user_by_id(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        let id = user_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ApiError::InvalidRequest(format!("invalid user id {:?}", user_id)));
        }
        self.call_result(&format!("{}/{}", USERS_PATH, id), CallOptions::get()).await
    }
}
