//! User profile model and DTOs.

use ecom_core::auth::ports::NewUserProfile;
use ecom_core::types::{DbId, OwnerId, Timestamp};
use sqlx::FromRow;

/// Full row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub auth_id: OwnerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub del_flg: bool,
}

/// DTO for creating a user profile.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub auth_id: OwnerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: String,
}

impl From<&NewUserProfile> for CreateUser {
    fn from(profile: &NewUserProfile) -> Self {
        Self {
            auth_id: profile.auth_id,
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone_number: profile.phone_number.clone(),
            role: profile.role.clone(),
        }
    }
}
