//! HTTP-side session plumbing.

pub mod cookie;
