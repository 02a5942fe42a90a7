//! In-process `Transport` doubles shared by the contract tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fetch_core::{HttpRequest, HttpResponse, Transport, TransportError};

pub const BASE_URL: &str = "http://api.test";

/// Answers through a closure that sees the zero-based call index and the
/// request. Records every request it receives.
pub struct FnTransport<F> {
    respond: Arc<F>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl<F> Clone for FnTransport<F> {
    fn clone(&self) -> Self {
        Self {
            respond: self.respond.clone(),
            calls: self.calls.clone(),
            requests: self.requests.clone(),
        }
    }
}

impl<F> FnTransport<F>
where
    F: Fn(usize, &HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond: Arc::new(respond),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(usize, &HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;
        let result = (self.respond)(call, &request);
        self.requests.lock().unwrap().push(request);
        result
    }
}

/// Never answers. Counts how often it was asked.
#[derive(Clone, Default)]
pub struct PendingTransport {
    calls: Arc<AtomicUsize>,
}

impl PendingTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for PendingTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

pub fn json(status: u16, value: serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(&value).unwrap())
}

pub fn post_json(id: u64) -> serde_json::Value {
    serde_json::json!({"userId": 1, "id": id, "title": "title", "body": "body"})
}
