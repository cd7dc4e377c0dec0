//! Test helpers: an app wired to a mockito server standing in for the
//! identity/storage backend.

#![allow(dead_code)]

use std::collections::HashMap;

use axum_test::TestServer;
use menu_qr::{AppState, app, config::Config};

pub const ACCOUNT_ID: &str = "3f1c9a2e-1b7d-4c1e-9f00-0a1b2c3d4e5f";
pub const ACCESS_TOKEN: &str = "user-access-token";

pub struct TestApp {
    pub server: TestServer,
    pub backend: mockito::ServerGuard,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Direct public URL the backend would serve the account's menu from.
    pub fn public_pdf_url(&self) -> String {
        format!(
            "{}/storage/v1/object/public/menus/{ACCOUNT_ID}/menu.pdf",
            self.backend.url()
        )
    }
}

pub fn config_for(backend_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SUPABASE_URL".to_string(), backend_url.to_string()),
        ("SUPABASE_ANON_KEY".to_string(), "anon-key".to_string()),
        ("SITE_ORIGIN".to_string(), "http://menus.test".to_string()),
        ("UPSTREAM_TIMEOUT_SECS".to_string(), "5".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|name| vars.get(name).cloned()).expect("test config is valid")
}

pub async fn setup_test_app() -> TestApp {
    let backend = mockito::Server::new_async().await;
    let config = config_for(&backend.url(), &[]);
    let state = AppState::new(config).expect("Failed to build app state");
    let server = TestServer::new(app(state)).expect("Failed to create test server");
    TestApp { server, backend }
}

/// Mock a successful password sign-in and `GET /auth/v1/user` for [`ACCOUNT_ID`].
pub async fn mock_signed_in_user(backend: &mut mockito::ServerGuard) {
    backend
        .mock("POST", "/auth/v1/token")
        .match_query(mockito::Matcher::UrlEncoded(
            "grant_type".into(),
            "password".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "bearer",
                "expires_in": 3600,
                "user": {"id": ACCOUNT_ID, "email": "chef@example.com"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    backend
        .mock("GET", "/auth/v1/user")
        .match_header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({"id": ACCOUNT_ID, "email": "chef@example.com"}).to_string(),
        )
        .create_async()
        .await;
}

/// Log in through the app and return the session cookie to send back.
pub async fn log_in(server: &TestServer) -> String {
    let response = server
        .post("/auth/login")
        .json(&serde_json::json!({"email": "chef@example.com", "password": "hunter22"}))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("login sets a session cookie")
        .to_str()
        .expect("cookie is ascii")
        .to_string();
    set_cookie
        .split(';')
        .next()
        .expect("cookie has a name=value pair")
        .to_string()
}
