//! Single-request JSON client.
//!
//! # Overview
//! Turns a declarative `RequestDescriptor` into a validated, decoded value
//! or one `ApiError`. The network is reached only through the `Transport`
//! trait; `ReqwestTransport` is the production implementation and tests
//! plug in doubles.
//!
//! # Design
//! - `JsonClient` is stateless apart from its injected transport and
//!   config, so one instance can be cloned and shared across tasks.
//! - A call builds the URL, sends, rejects non-2xx statuses, then decodes.
//!   URL and body-encoding problems fail before any network traffic.
//! - Retries happen only when the descriptor asks for them.
//! - Endpoint enums map API calls to descriptors without doing I/O.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{JsonClient, RequestHandle};
pub use config::ClientConfig;
pub use descriptor::RequestDescriptor;
pub use endpoint::{Endpoint, PostsEndpoint, PurchaseEndpoint, Resource};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{NewPost, Post, Product, PurchaseRequest, PurchaseResponse, User};
