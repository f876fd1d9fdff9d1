use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use locker_store::Store;

use crate::config::ServerConfig;
use crate::notify::Notifier;
use crate::{accounts, groups, messaging, records, sms};

/// Everything a handler needs, built once in `main`.
pub struct AppState<S, N> {
    pub store: S,
    pub notifier: Arc<N>,
    pub config: Arc<ServerConfig>,
}

impl<S: Clone, N> Clone for AppState<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, N> AppState<S, N> {
    pub fn new(store: S, notifier: N, config: ServerConfig) -> Self {
        Self {
            store,
            notifier: Arc::new(notifier),
            config: Arc::new(config),
        }
    }
}

pub fn build_router<S: Store, N: Notifier>(state: AppState<S, N>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/time", get(server_time))
        // Accounts
        .route("/signup", post(accounts::signup::<S, N>))
        .route("/verify-otp", post(accounts::verify_otp::<S, N>))
        .route("/signin", post(accounts::signin::<S, N>))
        // Records
        .route("/postrecord", post(records::post_record::<S, N>))
        .route("/getrecords", get(records::get_records::<S, N>))
        // Direct messages
        .route("/send_message", post(messaging::send_message::<S, N>))
        .route("/get_conversation", get(messaging::get_conversation::<S, N>))
        .route("/mark_as_read", post(messaging::mark_as_read::<S, N>))
        .route(
            "/get_user_conversations",
            get(messaging::get_user_conversations::<S, N>),
        )
        // Groups
        .route("/create_group", post(groups::create_group::<S, N>))
        .route("/add_member", post(groups::add_member::<S, N>))
        .route("/send_group_message", post(groups::send_group_message::<S, N>))
        .route("/get_group_messages", get(groups::get_group_messages::<S, N>))
        .route("/list_groups", get(groups::list_groups::<S, N>))
        // SMS
        .route("/send_sms", post(sms::send_sms::<S, N>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct TimeResponse {
    time: String,
}

/// Body shared by every handler that only reports success.
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
}

impl SuccessResponse {
    pub fn ok(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

async fn home() -> &'static str {
    "Hello from Locker!"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Server wall-clock time in its local zone.
async fn server_time() -> Json<TimeResponse> {
    Json(TimeResponse {
        time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

pub async fn serve<S: Store, N: Notifier>(
    state: AppState<S, N>,
    addr: std::net::SocketAddr,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
