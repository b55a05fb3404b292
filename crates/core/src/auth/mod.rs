//! Authentication session lifecycle.
//!
//! - [`ports`] -- traits for the identity provider, session ledger, user store
//!   and signup notifier, plus the values exchanged with them.
//! - [`manager`] -- [`SessionManager`], which sequences login, validation,
//!   refresh rotation, logout and signup across those collaborators.
//! - [`error`] -- the [`AuthError`] taxonomy surfaced to callers.

pub mod error;
pub mod manager;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod ports;

pub use error::AuthError;
pub use manager::{NewAccount, Session, SessionManager, SessionSettings};
