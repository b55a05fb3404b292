use async_trait::async_trait;
use chrono::Utc;
use ecom_core::auth::ports::{
    AccountMetadata, CredentialProvider, Principal, ProviderError, TokenGrant,
};
use ecom_core::types::OwnerId;

use crate::client::{GoTrueClient, GoTrueError, TokenResponse};

/// Error codes GoTrue uses for a signup against a registered email.
const ALREADY_EXISTS_CODES: &[&str] = &["user_already_exists", "email_exists"];

impl From<GoTrueError> for ProviderError {
    fn from(err: GoTrueError) -> Self {
        match err {
            GoTrueError::Api { status, .. } if status >= 500 => {
                ProviderError::Unavailable(err.to_string())
            }
            GoTrueError::Api {
                code: Some(ref code),
                ..
            } if ALREADY_EXISTS_CODES.contains(&code.as_str()) => ProviderError::AlreadyExists,
            GoTrueError::Api {
                status,
                code,
                message,
            } => ProviderError::Rejected {
                status,
                code,
                message,
            },
            GoTrueError::Request(_)
            | GoTrueError::MissingServiceRoleKey
            | GoTrueError::InvalidResponse(_) => ProviderError::Unavailable(err.to_string()),
        }
    }
}

fn grant(token: TokenResponse) -> TokenGrant {
    let expires_at = token.expiry(Utc::now());
    TokenGrant {
        owner_id: token.user.id,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
    }
}

#[async_trait]
impl CredentialProvider for GoTrueClient {
    async fn token_by_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, ProviderError> {
        Ok(grant(self.password_grant(email, password).await?))
    }

    async fn validate(&self, access_token: &str) -> Result<Principal, ProviderError> {
        let user = self.get_user(access_token).await?;
        Ok(Principal {
            owner_id: user.id,
            email: user.email,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        Ok(grant(self.refresh_grant(refresh_token).await?))
    }

    async fn invalidate(&self, access_token: &str) -> Result<(), ProviderError> {
        self.logout(access_token).await?;
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: &AccountMetadata,
    ) -> Result<OwnerId, ProviderError> {
        Ok(self.signup(email, password, metadata).await?)
    }

    async fn admin_delete_account(&self, owner_id: OwnerId) -> Result<(), ProviderError> {
        self.admin_delete_user(owner_id).await?;
        Ok(())
    }

    async fn send_password_recovery(&self, email: &str) -> Result<(), ProviderError> {
        self.recover(email).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        GoTrueClient::update_password(self, access_token, new_password).await?;
        Ok(())
    }
}
