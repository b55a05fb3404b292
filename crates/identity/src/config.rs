/// Connection settings for the identity provider.
#[derive(Debug, Clone)]
pub struct GoTrueConfig {
    /// Base URL of the auth API, e.g. `https://<ref>.supabase.co/auth/v1`.
    pub base_url: String,
    /// Public (anon) API key sent as `apikey` on every request.
    pub api_key: String,
    /// Service-role key for admin endpoints. Without it compensating
    /// account deletion is impossible and is reported as a failure.
    pub service_role_key: Option<String>,
    /// Where password recovery links send the user.
    pub recovery_redirect_url: Option<String>,
}

impl GoTrueConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Required | Notes                                     |
    /// |------------------------------|----------|-------------------------------------------|
    /// | `AUTH_BASE_URL`              | one of   | full base URL, takes precedence           |
    /// | `PROJECT_REFERENCE`          | one of   | → `https://<ref>.supabase.co/auth/v1`     |
    /// | `SUPABASE_API_KEY`           | yes      |                                           |
    /// | `SUPABASE_SERVICE_ROLE_KEY`  | no       | needed for admin deletes                  |
    /// | `AUTH_RECOVERY_REDIRECT_URL` | no       |                                           |
    pub fn from_env() -> Self {
        let base_url = match std::env::var("AUTH_BASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let reference = std::env::var("PROJECT_REFERENCE")
                    .expect("AUTH_BASE_URL or PROJECT_REFERENCE must be set");
                project_base_url(&reference)
            }
        };

        let api_key =
            std::env::var("SUPABASE_API_KEY").expect("SUPABASE_API_KEY must be set");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            recovery_redirect_url: std::env::var("AUTH_RECOVERY_REDIRECT_URL").ok(),
        }
    }
}

/// Hosted Supabase auth endpoint for a project reference.
pub fn project_base_url(reference: &str) -> String {
    format!("https://{reference}.supabase.co/auth/v1")
}
