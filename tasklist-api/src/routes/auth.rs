/// Identity endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register with email + password
/// - `POST /auth/login` - Password login
/// - `POST /auth/external` - Login with an external identity token
/// - `GET /auth/me` - Current authenticated user
///
/// Successful register/login responses carry a signed bearer token plus the
/// public user projection. Login failures are deliberately uniform: an
/// unknown email and a wrong password produce the same 401 message.

use crate::{
    app::{AppState, AuthUser},
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tasklist_shared::{
    auth::password,
    models::user::{CreateUser, PublicUser, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (stored as an Argon2id hash)
    pub password: String,

    /// Display name
    pub name: String,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// External-identity login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExternalLoginRequest {
    /// Raw ID token from the external identity provider
    pub token: String,
}

/// Token + user response for register/login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Signed bearer token encoding the user id
    pub token: String,

    /// The authenticated user
    pub user: PublicUser,
}

/// Current-user response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The authenticated user
    pub user: PublicUser,
}

/// First human-readable message out of a validator error set
fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Validation failed".to_string())
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret",
///   "name": "John Doe"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, invalid email, or email already taken
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(ApiError::BadRequest(
            "Email, password, and name are required".to_string(),
        ));
    }

    req.validate()
        .map_err(|e| ApiError::BadRequest(validation_message(&e)))?;

    let password_hash = password::hash_password(&req.password)?;

    // Duplicate emails surface through the unique constraint, not a
    // pre-check; two racing registrations can't both win.
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            name: req.name,
            password_hash: Some(password_hash),
            external_id: None,
        },
    )
    .await?;

    let token = state.issue_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Password login
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field
/// - `401 Unauthorized`: Invalid credentials (uniform message — unknown
///   email and wrong password are indistinguishable)
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    // External-identity-only accounts have no password to check
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;

    if !password::verify_password(&req.password, hash)? {
        return Err(invalid());
    }

    let token = state.issue_token(user.id)?;

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Login with an external identity token
///
/// Verifies the provider token (signature, expiry, trusted issuer,
/// audience), then resolves it onto exactly one account:
///
/// 1. a user with the provider's subject id exists — reuse it
/// 2. else a user with the same email exists — link the subject id to it
/// 3. else — create a new user with no password hash
///
/// The resolution runs inside one transaction, so repeated logins with the
/// same subject id are idempotent.
///
/// # Endpoint
///
/// ```text
/// POST /auth/external
/// Content-Type: application/json
///
/// {
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing, malformed, unsigned, or untrusted token;
///   or external login not configured
/// - `500 Internal Server Error`: Server error
pub async fn external_login(
    State(state): State<AppState>,
    Json(req): Json<ExternalLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.token.is_empty() {
        return Err(ApiError::BadRequest("Token is required".to_string()));
    }

    let verifier = state.google.as_ref().ok_or_else(|| {
        ApiError::BadRequest("External identity login is not configured".to_string())
    })?;

    let claims = verifier.verify(&req.token).await?;
    let name = claims.name.unwrap_or_else(|| claims.email.clone());

    let mut tx = state.db.begin().await?;

    let user = if let Some(existing) = User::find_by_external_id(&mut *tx, &claims.sub).await? {
        existing
    } else if let Some(by_email) = User::find_by_email(&mut *tx, &claims.email).await? {
        User::link_external_id(&mut *tx, by_email.id, &claims.sub)
            .await?
            .ok_or_else(|| {
                ApiError::InternalError("User disappeared while linking identity".to_string())
            })?
    } else {
        User::create(
            &mut *tx,
            CreateUser {
                email: claims.email,
                name,
                password_hash: None,
                external_id: Some(claims.sub),
            },
        )
        .await?
    };

    tx.commit().await?;

    let token = state.issue_token(user.id)?;

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Current authenticated user
///
/// # Endpoint
///
/// ```text
/// GET /auth/me
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Token subject no longer resolves to a user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        user: PublicUser::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_defaults_missing_fields() {
        let req: RegisterRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert!(req.password.is_empty());
        assert!(req.name.is_empty());
    }

    #[test]
    fn test_register_request_email_format() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
            name: "Test".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            email: "user@example.com".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validation_message_picks_a_message() {
        let req = RegisterRequest {
            email: "nope".to_string(),
            password: "secret".to_string(),
            name: "Test".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Invalid email format");
    }
}
