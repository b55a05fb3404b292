/// Errors raised outside the session lifecycle, before a request reaches
/// [`SessionManager`](crate::auth::SessionManager).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
