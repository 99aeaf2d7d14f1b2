use chrono::Duration;

use crate::error::ConfigError;

/// Longest accepted refresh token lifetime (ten years).
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;
/// Longest accepted session token lifetime (one day).
pub const MAX_SESSION_TTL_SECONDS: i64 = 86_400;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Allows `POST /admin/reset` to wipe users and refresh tokens.
    #[serde(default)]
    pub admin_reset_enabled: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Authentication settings
///
/// Supplied once at startup and handed by value to the token signer,
/// password hasher and refresh token manager.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// Shared HMAC secret for session tokens.
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// bcrypt work factor.
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    /// Upper bound for session tokens requested at login.
    #[serde(default = "default_max_session_ttl_seconds")]
    pub max_session_ttl_seconds: i64,
}

impl AuthSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: default_issuer(),
            password_cost: default_password_cost(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            max_session_ttl_seconds: default_max_session_ttl_seconds(),
        }
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days)
    }

    pub fn max_session_ttl(&self) -> Duration {
        Duration::seconds(self.max_session_ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::MissingRequired("auth.issuer".to_string()));
        }
        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&self.refresh_token_ttl_days) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.refresh_token_ttl_days must be between 1 and {}",
                MAX_REFRESH_TOKEN_TTL_DAYS
            )));
        }
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&self.max_session_ttl_seconds) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.max_session_ttl_seconds must be between 1 and {}",
                MAX_SESSION_TTL_SECONDS
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_password_cost() -> u32 {
    10
}

fn default_refresh_token_ttl_days() -> i64 {
    60
}

fn default_max_session_ttl_seconds() -> i64 {
    3600
}

/// Loads `configuration.{yaml,toml,json}` if present, then applies
/// `APP__SECTION__KEY` environment overrides (e.g. `APP__AUTH__SECRET`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}
