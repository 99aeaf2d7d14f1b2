use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::startup::AppState;

/// POST /admin/reset
///
/// Deletes every refresh token and every user. Disabled unless
/// `application.admin_reset_enabled` is set.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.admin_reset_enabled {
        return Err(AppError::Forbidden("admin reset is disabled".to_string()));
    }

    let tokens = state.refresh_tokens.reset().await?;
    let users = state.users.delete_all().await?;

    tracing::warn!(users = users, refresh_tokens = tokens, "Administrative reset");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK"))
}
