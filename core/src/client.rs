//! Stateless JSON client over an injected `Transport`.
//!
//! # Design
//! `JsonClient` holds only the transport and its `ClientConfig`, both behind
//! `Arc`, so clones are cheap and one instance can serve many concurrent
//! calls. Each call runs the same linear pipeline: build the request from
//! the descriptor, send it, reject non-2xx statuses, decode the body. Every
//! failure is returned to the caller as an `ApiError`.
//!
//! The only suspension point is the transport call. Cancellation and
//! timeouts work by dropping that future, so they apply to any transport.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, trace, Instrument};

use crate::config::ClientConfig;
use crate::descriptor::RequestDescriptor;
use crate::endpoint::{Endpoint, Resource};
use crate::error::{diagnostic_body, ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Executes `RequestDescriptor`s and decodes their JSON responses.
#[derive(Clone)]
pub struct JsonClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for JsonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JsonClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: ClientConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    /// Share one transport between several clients.
    pub fn from_shared(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform the call and decode a 2xx body as JSON into `T`.
    pub async fn perform<T: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<T, ApiError> {
        self.perform_with(descriptor, |body| serde_json::from_slice(body))
            .await
    }

    /// Like `perform`, with an explicit decode function.
    pub async fn perform_with<T, F>(&self, descriptor: &RequestDescriptor, decode: F) -> Result<T, ApiError>
    where
        F: Fn(&[u8]) -> Result<T, serde_json::Error>,
    {
        self.run(descriptor, move |response| match decode(&response.body) {
            Ok(value) => Ok(value),
            Err(source) => Err(ApiError::DecodingFailed {
                source,
                body: diagnostic_body(response.body),
            }),
        })
        .await
    }

    /// Perform a call whose 2xx response carries nothing worth decoding.
    pub async fn perform_no_reply(&self, descriptor: &RequestDescriptor) -> Result<(), ApiError> {
        self.run(descriptor, |_| Ok(())).await
    }

    /// Perform the call and hand back the status-checked raw response.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, ApiError> {
        self.run(descriptor, Ok).await
    }

    pub async fn load<T: DeserializeOwned>(&self, resource: &Resource<T>) -> Result<T, ApiError> {
        self.perform(resource.descriptor()).await
    }

    pub async fn call<T, E>(&self, base_url: &str, endpoint: &E) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        E: Endpoint + ?Sized,
    {
        let descriptor = endpoint.descriptor(base_url)?;
        self.perform(&descriptor).await
    }

    /// Race the call against `cancel`. If `cancel` resolves first the
    /// in-flight request is dropped and `ApiError::Cancelled` returned.
    pub async fn perform_until<T, C>(&self, descriptor: &RequestDescriptor, cancel: C) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                debug!(path = descriptor.path(), "request cancelled by caller");
                Err(ApiError::Cancelled)
            }
            result = self.perform(descriptor) => result,
        }
    }

    /// Run the call on the tokio runtime and return a handle to cancel or
    /// await it. Dropping the handle detaches the request.
    pub fn spawn<T>(&self, descriptor: RequestDescriptor) -> RequestHandle<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let client = self.clone();
        let task = tokio::spawn(async move {
            let cancelled = async move {
                if cancel_rx.await.is_err() {
                    // Handle dropped without cancelling.
                    std::future::pending::<()>().await;
                }
            };
            client.perform_until(&descriptor, cancelled).await
        });
        RequestHandle {
            cancel_tx: Some(cancel_tx),
            task,
        }
    }

    async fn run<T, F>(&self, descriptor: &RequestDescriptor, finish: F) -> Result<T, ApiError>
    where
        F: Fn(HttpResponse) -> Result<T, ApiError>,
    {
        let request = self.prepare(descriptor)?;
        let span = debug_span!("perform", method = %request.method, url = %request.url);
        let attempts = descriptor.retries().saturating_add(1);

        async move {
            let mut attempt = 1;
            loop {
                debug!(attempt, attempts, "sending request");
                let result = match self.send(request.clone()).await {
                    Ok(response) => check_status(response).and_then(&finish),
                    Err(err) => Err(err),
                };
                match result {
                    Ok(value) => return Ok(value),
                    Err(err) if attempt < attempts && is_retryable(&err) => {
                        debug!(attempt, error = %err, "attempt failed, retrying");
                        attempt += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Build the transport request and fill in client-wide defaults.
    fn prepare(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, ApiError> {
        let mut request = descriptor.build()?;
        for (name, value) in &self.config.default_headers {
            if request.header(name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }
        if request.timeout.is_none() {
            request.timeout = self.config.default_timeout;
        }
        Ok(request)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let timeout = request.timeout;
        let call = self.transport.send(request);
        let response = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(TransportError::Timeout))?,
            None => call.await?,
        };
        trace!(status = response.status, bytes = response.body.len(), "transport returned");
        Ok(response)
    }
}

/// Map statuses outside the 2xx band to `UnsuccessfulStatus`.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::UnsuccessfulStatus {
        status: response.status,
        body: diagnostic_body(response.body),
    })
}

fn is_retryable(err: &ApiError) -> bool {
    match err {
        ApiError::TransportFailed(cause) => cause.is_transient(),
        ApiError::UnsuccessfulStatus { .. } | ApiError::DecodingFailed { .. } => true,
        ApiError::InvalidUrl(_) | ApiError::EncodingFailed(_) | ApiError::Cancelled => false,
    }
}

/// A request running on the tokio runtime.
#[derive(Debug)]
pub struct RequestHandle<T> {
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<T, ApiError>>,
}

impl<T> RequestHandle<T> {
    /// Cancel the request.
    ///
    /// Returns `false` if it already finished or was already cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.cancel_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the result. A panic in the request task is re-raised here.
    pub async fn join(self) -> Result<T, ApiError> {
        let RequestHandle {
            cancel_tx: _cancel_tx,
            task,
        } = self;
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(ApiError::Cancelled),
        }
    }
}
