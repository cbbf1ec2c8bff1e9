//! Scripted network for tests.
//!
//! Enabled for this crate's own tests and, via the `testing` feature,
//! for dependents that need to drive a worker without real HTTP.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header};

use crate::fetch::{FetchResponse, Network, ResourceRequest};
use axioma_core::Error;

#[derive(Debug, Clone)]
enum Route {
    Respond { status: u16, body: Bytes, content_type: String },
    Fail,
}

/// A `Network` that answers from a table of URL → response and records
/// every call it receives. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and a plain-text `body`.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.respond_with(url, status, body, "text/plain");
    }

    pub fn respond_with(&self, url: &str, status: u16, body: &str, content_type: &str) {
        let route = Route::Respond {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
            content_type: content_type.to_string(),
        };
        self.lock_routes().insert(url.to_string(), route);
    }

    /// Make requests for `url` fail as if the network were unreachable.
    pub fn fail(&self, url: &str) {
        self.lock_routes().insert(url.to_string(), Route::Fail);
    }

    /// Fail every request regardless of its route.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request seen so far, formatted as `METHOD URL`.
    pub fn calls(&self) -> Vec<String> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.lock_calls().iter().filter(|c| c.ends_with(url)).count()
    }

    pub fn reset_calls(&self) {
        self.lock_calls().clear();
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Route>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &ResourceRequest) -> Result<FetchResponse, Error> {
        self.lock_calls().push(request.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let route = self.lock_routes().get(request.url.as_str()).cloned();
        let (status, body, content_type) = match route {
            Some(Route::Respond { status, body, content_type }) => (status, body, content_type),
            Some(Route::Fail) => return Err(Error::Network(format!("connection refused: {}", request.url))),
            None => (404, Bytes::from_static(b"not found"), "text/plain".to_string()),
        };

        let mut headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(&content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }

        Ok(FetchResponse {
            url: request.url.clone(),
            final_url: request.url.clone(),
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: Some(content_type),
            bytes: body,
            headers,
            fetch_ms: 0,
        })
    }
}
