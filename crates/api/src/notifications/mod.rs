//! Signup notification delivery.
//!
//! [`EmailNotifier`] sends a welcome mail over SMTP when `SMTP_HOST` is
//! configured; otherwise [`LogNotifier`] records the signup in the log only.
//! Either runs detached from the signup request.

pub mod email;

use async_trait::async_trait;
use ecom_core::auth::ports::{NewUserProfile, NotifyError, SignupNotifier};

pub use email::{EmailConfig, EmailError, EmailNotifier};

/// Notifier used when no mail transport is configured.
pub struct LogNotifier;

#[async_trait]
impl SignupNotifier for LogNotifier {
    async fn account_created(&self, profile: &NewUserProfile) -> Result<(), NotifyError> {
        tracing::info!(
            owner_id = %profile.auth_id,
            role = %profile.role,
            "Account created, no mail transport configured"
        );
        Ok(())
    }
}
