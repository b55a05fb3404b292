//! Domain core for the e-commerce backend.
//!
//! Holds the shared types, the error taxonomy, request validation rules and
//! the session lifecycle manager. Nothing here touches the database or the
//! network directly; those live behind the traits in [`auth::ports`].

pub mod auth;
pub mod error;
pub mod roles;
pub mod types;
pub mod validation;
