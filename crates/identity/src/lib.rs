//! Client for the Supabase Auth (GoTrue) HTTP API.
//!
//! [`GoTrueClient`] speaks the wire protocol; its
//! [`CredentialProvider`](ecom_core::auth::ports::CredentialProvider) impl
//! translates responses into the session manager's terms.

pub mod client;
pub mod config;
mod provider;

pub use client::{GoTrueClient, GoTrueError};
pub use config::GoTrueConfig;
