pub mod backend;
pub mod config;
pub mod error;
pub mod menu;
pub mod proxy;
pub mod qr;
pub mod routes;
pub mod session;
pub mod telemetry;
pub mod upload;
pub mod viewer;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::header,
    routing::{get, post},
};
use reqwest::Client;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer, cookie::SameSite};

use crate::backend::BackendClient;
use crate::backend::storage::{BucketStore, ObjectStore};
use crate::config::Config;
use crate::proxy::AllowList;

const SESSION_COOKIE: &str = "menu_session";

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
    pub backend: BackendClient,
    pub store: Arc<dyn ObjectStore>,
    pub allow_list: Arc<AllowList>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = build_client(config.upstream_timeout)?;
        let backend = BackendClient::new(
            http.clone(),
            config.backend_url.clone(),
            config.backend_anon_key.clone(),
        );
        let store = BucketStore::new(backend.clone(), config.menu_bucket.clone());
        let allow_list = AllowList::from_backend(&config.backend_url);

        Ok(Self {
            config: Arc::new(config),
            http,
            backend,
            store: Arc::new(store),
            allow_list: Arc::new(allow_list),
        })
    }
}

pub fn build_client(read_timeout: Duration) -> anyhow::Result<Client> {
    let client = Client::builder()
        // Avoid macOS system proxy lookup that can panic in sandboxed contexts.
        .no_proxy()
        .user_agent(concat!("menu-qr/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .read_timeout(read_timeout)
        .build()?;
    Ok(client)
}

pub fn app(state: AppState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_same_site(SameSite::Lax)
        .with_secure(state.config.secure_cookies());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::RANGE])
        .expose_headers([
            header::ACCEPT_RANGES,
            header::CONTENT_RANGE,
            header::CONTENT_LENGTH,
        ]);

    Router::new()
        .route("/api/pdf", get(proxy::pdf_proxy))
        .route("/m/{account_id}", get(routes::menu::menu_page))
        .route("/m/{account_id}/pages", get(routes::menu::menu_pages))
        .route("/auth/signup", post(routes::auth::sign_up))
        .route("/auth/login", post(routes::auth::log_in))
        .route("/auth/logout", post(routes::auth::log_out))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route("/dashboard/menu", post(routes::dashboard::upload_menu))
        .route("/dashboard/qr.png", get(routes::dashboard::download_qr))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
