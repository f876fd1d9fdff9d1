//! Shared fixtures for handler tests: an in-memory app, a notifier that
//! records instead of sending, and request helpers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use locker_store::MemoryStore;

use crate::api::{build_router, AppState};
use crate::config::ServerConfig;
use crate::notify::Notifier;

#[derive(Default)]
pub struct RecordingNotifier {
    pub otps: Mutex<Vec<(String, u32)>>,
    pub texts: Mutex<Vec<(Vec<String>, String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn last_otp(&self, email: &str) -> Option<u32> {
        self.otps
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| *code)
    }
}

impl Notifier for RecordingNotifier {
    async fn send_otp_email(&self, email: &str, code: u32) -> bool {
        if self.fail.load(Ordering::SeqCst) {
            return false;
        }
        self.otps.lock().unwrap().push((email.to_string(), code));
        true
    }

    async fn send_sms_via_gateway(&self, numbers: &[String], message: &str, provider: &str) -> bool {
        if self.fail.load(Ordering::SeqCst) {
            return false;
        }
        self.texts.lock().unwrap().push((
            numbers.to_vec(),
            message.to_string(),
            provider.to_string(),
        ));
        true
    }
}

pub struct TestApp {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
            config: Arc::new(ServerConfig::default()),
        })
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        get_json(&self.router(), uri).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        post_json(&self.router(), uri, body).await
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}
