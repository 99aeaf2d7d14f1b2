/// Authentication Routes
///
/// Account creation, login, session refresh, refresh token revocation and
/// current user information. Every authentication failure leaves here as
/// the same generic 401.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext, StoreError};
use crate::middleware::AuthenticatedUser;
use crate::startup::AppState;
use crate::store::UserRecord;
use crate::telemetry::spawn_blocking_with_tracing;
use crate::validators::{is_valid_email, is_valid_password};

/// Account creation request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested session lifetime; capped by the server
    pub expires_in_seconds: Option<i64>,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login response: the user plus a session token and a refresh token
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Session lifetime for a login request
///
/// Absent, zero or negative requests get the maximum; larger requests are
/// capped to it.
pub fn clamp_session_ttl(requested_seconds: Option<i64>, max: Duration) -> Duration {
    match requested_seconds {
        Some(seconds) if seconds > 0 && seconds <= max.num_seconds() => Duration::seconds(seconds),
        _ => max,
    }
}

fn blocking_task_failed(e: tokio::task::JoinError) -> AppError {
    AppError::Internal(format!("Password hashing task failed: {}", e))
}

/// POST /api/users
///
/// Create an account from an email and password.
///
/// # Errors
/// - 400: invalid email or password outside the policy
/// - 409: email already registered
/// - 500: hashing or storage failure
pub async fn create_user(
    body: web::Json<CreateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_user");
    let CreateUserRequest { email, password } = body.into_inner();

    let email = is_valid_email(&email)?;
    is_valid_password(&password)?;

    let hasher = state.hasher;
    let password_hash = spawn_blocking_with_tracing(move || hasher.hash(&password))
        .await
        .map_err(blocking_task_failed)??;

    let now = state.clock.now();
    let user = UserRecord {
        id: Uuid::new_v4(),
        email,
        password_hash,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(&user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => AppError::Database(DatabaseError::UniqueConstraintViolation(
            "email already registered".to_string(),
        )),
        other => other.into(),
    })?;

    tracing::info!(
        request_id = %context.request_id,
        operation = context.operation,
        user_id = %user.id,
        "User created"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// POST /api/login
///
/// Verify email and password, then issue a session token and a refresh
/// token.
///
/// # Security Notes
/// - Malformed email, unknown email and wrong password produce the same
///   response
/// - Every attempt runs exactly one bcrypt verification, against a dummy
///   hash when there is no matching user
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let LoginRequest {
        email,
        password,
        expires_in_seconds,
    } = body.into_inner();

    let user = match is_valid_email(&email) {
        Ok(email) => state.users.find_by_email(&email).await?,
        Err(_) => None,
    };

    let stored_hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.dummy_password_hash.clone(),
    };
    let hasher = state.hasher;
    let verified = spawn_blocking_with_tracing(move || hasher.verify(&password, &stored_hash))
        .await
        .map_err(blocking_task_failed)?;

    let user = match (user, verified) {
        (Some(user), Ok(())) => user,
        (None, _) => return Err(AuthError::NotFound.into()),
        (Some(_), Err(e)) => return Err(e.into()),
    };

    let ttl = clamp_session_ttl(expires_in_seconds, state.max_session_ttl);
    let token = state.signer.mint(&user.id, ttl)?;
    let refresh_token = state.refresh_tokens.issue(user.id).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = context.operation,
        user_id = %user.id,
        session_ttl_seconds = ttl.num_seconds(),
        "User logged in"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&user),
        token,
        refresh_token: refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// Exchange a refresh token (`Authorization: Bearer <refresh_token>`) for a
/// new session token. The refresh token stays valid.
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let presented = bearer_token(req.headers())?;
    let user_id = state.refresh_tokens.validate(&presented).await?;
    let token = state.signer.mint(&user_id, state.max_session_ttl)?;

    tracing::info!(
        request_id = %context.request_id,
        operation = context.operation,
        user_id = %user_id,
        "Session token refreshed"
    );

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Revoke a refresh token (`Authorization: Bearer <refresh_token>`).
/// Unknown and already revoked tokens get the same 204.
pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = bearer_token(req.headers())?;

    match state.refresh_tokens.revoke(&presented).await {
        Ok(()) => {}
        Err(AuthError::NotFound) => {
            tracing::debug!("Revoke requested for unknown refresh token");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/me
///
/// **Requires a valid session token**; the identity is injected by
/// `JwtMiddleware`. A token for a user that no longer exists is rejected.
pub async fn get_current_user(
    caller: web::ReqData<AuthenticatedUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .find_by_id(caller.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}
