use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use chrono::Duration;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{Clock, PasswordHasher, RefreshTokenManager, TokenSigner};
use crate::configuration::AuthSettings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_user, get_current_user, health_check, login, refresh, reset, revoke,
};
use crate::store::{RefreshTokenStore, UserStore};

/// Shared, immutable state handed to every handler
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub hasher: PasswordHasher,
    pub signer: Arc<TokenSigner>,
    pub refresh_tokens: RefreshTokenManager,
    pub clock: Arc<dyn Clock>,
    pub max_session_ttl: Duration,
    pub admin_reset_enabled: bool,
    /// Verified against when the email is unknown, so both login failures
    /// cost one bcrypt run.
    pub dummy_password_hash: String,
}

impl AppState {
    /// # Errors
    /// Fails if the settings are out of range or the configured bcrypt cost
    /// is unusable
    pub fn new(
        settings: &AuthSettings,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        settings.validate()?;
        let hasher = PasswordHasher::new(settings.password_cost);
        let dummy_password_hash = hasher.hash("chirpy-login-timing-equaliser")?;

        Ok(Self {
            users,
            hasher,
            signer: Arc::new(TokenSigner::new(settings, clock.clone())),
            refresh_tokens: RefreshTokenManager::new(
                refresh_tokens,
                clock.clone(),
                settings.refresh_token_ttl(),
            ),
            clock,
            max_session_ttl: settings.max_session_ttl(),
            admin_reset_enabled: false,
            dummy_password_hash,
        })
    }

    pub fn with_admin_reset(mut self, enabled: bool) -> Self {
        self.admin_reset_enabled = enabled;
        self
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let signer = state.signer.clone();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(state.clone())
            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(create_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/admin/reset", web::post().to(reset))
            // Protected routes (session token required)
            .service(
                web::resource("/api/users/me")
                    .wrap(JwtMiddleware::new(signer.clone()))
                    .route(web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
