#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::ManualClock;
use chirpy::configuration::AuthSettings;
use chirpy::startup::{run, AppState};
use chirpy::store::{InMemoryRefreshTokenStore, InMemoryUserStore};
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(false).await
}

pub async fn spawn_app_with(admin_reset_enabled: bool) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut settings = AuthSettings::new("integration-test-secret");
    settings.password_cost = 4;

    let clock = Arc::new(ManualClock::starting_now());
    let state = AppState::new(
        &settings,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryRefreshTokenStore::new()),
        clock.clone(),
    )
    .expect("Failed to build app state")
    .with_admin_reset(admin_reset_enabled);

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        clock,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_me(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(&format!("{}/api/users/me", self.address));
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/api/users", &json!({ "email": email, "password": password }))
            .await
    }

    /// Log in and return the parsed response body
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/api/login", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}
