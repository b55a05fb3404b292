//! Handlers for the `/auth` resource.
//!
//! Login and refresh put the refresh token in the `refresh_token` cookie and
//! return only the access token and its expiry in the body.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use ecom_core::auth::{NewAccount, Session};
use ecom_core::types::{OwnerId, Timestamp};
use ecom_core::validation::{
    required, validate_email, validate_password, validate_phone_number, validate_role,
    PASSWORDS_DO_NOT_MATCH,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::auth::cookie::{clear_refresh_cookie, read_refresh_token, refresh_cookie};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, BearerToken};
use crate::response::{DataResponse, MessageBody};
use crate::state::AppState;

/// Link type GoTrue puts in password recovery redirects.
const RECOVERY_LINK_TYPE: &str = "recovery";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
///
/// Missing fields deserialize as empty so validation reports them by name.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_first_name"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_last_name"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,
    /// Empty or absent means the default role.
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,
}

/// Request body for `POST /auth/reset-password`, built from the recovery link.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(rename = "type", default)]
    pub link_type: String,
}

/// Body returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: Timestamp,
}

/// Body returned by `GET /auth/validate`.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

/// Body returned by a successful signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: OwnerId,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(required(field).into()));
    }
    Ok(())
}

fn validate_first_name(value: &str) -> Result<(), ValidationError> {
    non_empty(value, "First Name")
}

fn validate_last_name(value: &str) -> Result<(), ValidationError> {
    non_empty(value, "Last Name")
}

impl SignupRequest {
    /// Field rules plus the confirm-password presence and match checks.
    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.confirm_password.is_empty() {
            errors.add(
                "confirm_password",
                ValidationError::new("required").with_message(required("Confirm Password").into()),
            );
        } else if self.confirm_password != self.password {
            errors.add(
                "confirm_password",
                ValidationError::new("must_match").with_message(PASSWORDS_DO_NOT_MATCH.into()),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn token_response(
    jar: CookieJar,
    session: Session,
    secure: bool,
) -> (CookieJar, Json<TokenResponse>) {
    let jar = jar.add(refresh_cookie(
        session.refresh_token,
        session.expires_at,
        secure,
    ));
    (
        jar,
        Json(TokenResponse {
            access_token: session.access_token,
            expires_at: session.expires_at,
        }),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/login
///
/// Authenticate with email + password. The refresh token is set as a cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    input.validate()?;

    let session = state.sessions.login(&input.email, &input.password).await?;

    Ok(token_response(jar, session, state.config.refresh_cookie_secure))
}

/// POST /auth/refresh
///
/// Rotate the refresh token carried in the cookie.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let presented = read_refresh_token(&jar);

    let session = state.sessions.refresh_session(&presented).await?;

    Ok(token_response(jar, session, state.config.refresh_cookie_secure))
}

/// GET /auth/validate
///
/// 200 when the bearer token is accepted by the identity provider.
pub async fn validate(user: AuthUser) -> Json<DataResponse<ValidateResponse>> {
    tracing::debug!(owner_id = %user.owner_id, "Access token validated");
    Json(DataResponse {
        data: ValidateResponse { valid: true },
    })
}

/// POST /auth/logout
///
/// Ends the session behind the bearer token. The refresh cookie is cleared
/// whatever the outcome.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Result<BearerToken, AppError>,
) -> (CookieJar, AppResult<Json<DataResponse<MessageBody>>>) {
    let jar = clear_refresh_cookie(jar, state.config.refresh_cookie_secure);

    let result = match bearer {
        Ok(BearerToken(token)) => state.sessions.logout(&token).await.map_err(AppError::from),
        Err(rejection) => Err(rejection),
    };

    (
        jar,
        result.map(|()| {
            Json(DataResponse {
                data: MessageBody {
                    message: "Logged out successfully",
                },
            })
        }),
    )
}

/// POST /auth/signup
///
/// Create an account. Returns 201 with the new account id.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SignupResponse>>)> {
    input.check()?;

    let user_id = state
        .sessions
        .signup(NewAccount {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email,
            password: input.password,
            phone_number: input.phone_number,
            role: input.role.filter(|role| !role.is_empty()),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SignupResponse {
                message: "Sign up successful, Check your email for verification link",
                user_id,
            },
        }),
    ))
}

/// POST /auth/forgot-password
///
/// Ask the identity provider to mail a recovery link.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<DataResponse<MessageBody>>> {
    input.validate()?;

    state.sessions.request_password_recovery(&input.email).await?;

    Ok(Json(DataResponse {
        data: MessageBody {
            message: "Password recovery email sent",
        },
    }))
}

/// POST /auth/reset-password
///
/// Set a new password with the access token from a recovery link. Every
/// session issued before the reset is revoked.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<DataResponse<MessageBody>>> {
    if input.link_type != RECOVERY_LINK_TYPE {
        return Err(AppError::BadRequest(format!(
            "Unsupported link type '{}', expected '{RECOVERY_LINK_TYPE}'",
            input.link_type
        )));
    }
    input.validate()?;

    state
        .sessions
        .reset_password(&input.access_token, &input.password)
        .await?;

    Ok(Json(DataResponse {
        data: MessageBody {
            message: "Password updated successfully",
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request() -> SignupRequest {
        SignupRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            phone_number: "+44 207 946 0958".into(),
            role: None,
        }
    }

    fn messages(errors: &ValidationErrors, field: &str) -> Vec<String> {
        ecom_core::validation::field_messages(errors)
            .remove(field)
            .unwrap_or_default()
    }

    #[test]
    fn valid_signup_passes() {
        assert!(signup_request().check().is_ok());
    }

    #[test]
    fn mismatched_confirmation_is_reported_once() {
        let mut req = signup_request();
        req.confirm_password = "secret124".into();

        let errors = req.check().unwrap_err();
        assert_eq!(
            messages(&errors, "confirm_password"),
            vec![PASSWORDS_DO_NOT_MATCH.to_string()]
        );
    }

    #[test]
    fn missing_confirmation_is_required() {
        let mut req = signup_request();
        req.confirm_password = String::new();

        let errors = req.check().unwrap_err();
        assert_eq!(
            messages(&errors, "confirm_password"),
            vec!["Confirm Password not provided".to_string()]
        );
    }

    #[test]
    fn blank_names_and_unknown_role() {
        let mut req = signup_request();
        req.first_name = "  ".into();
        req.role = Some("root".into());

        let errors = req.check().unwrap_err();
        assert_eq!(
            messages(&errors, "first_name"),
            vec!["First Name not provided".to_string()]
        );
        assert_eq!(messages(&errors, "role"), vec!["Role has invalid value".to_string()]);
    }

    #[test]
    fn blank_role_passes_validation() {
        let mut req = signup_request();
        req.role = Some(String::new());

        assert!(req.check().is_ok());
    }

    #[test]
    fn login_missing_fields_deserialize_then_fail_validation() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        let errors = req.validate().unwrap_err();

        assert_eq!(messages(&errors, "email"), vec!["Email not provided".to_string()]);
        assert_eq!(
            messages(&errors, "password"),
            vec!["Password not provided".to_string()]
        );
    }
}
