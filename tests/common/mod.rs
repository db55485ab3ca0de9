use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use machining_ledger::{
    config::AppConfig,
    reports::MonthLocale,
    services::LedgerService,
    store::{MemoryRecordStore, RecordStore},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Application router over a record store that lives as long as the test.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub store: Arc<dyn RecordStore>,
}

impl TestApp {
    /// Router backed by a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryRecordStore::new()))
    }

    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;

        let ledger = LedgerService::new(store.clone(), MonthLocale::Es);
        let router = machining_ledger::app(AppState::new(ledger, cfg));
        Self { router, store }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
