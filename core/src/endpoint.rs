//! Endpoint descriptions: closed sets of calls mapped to descriptors.
//!
//! # Design
//! Each API is modelled as an enum whose variants carry their own
//! parameters. `Endpoint::descriptor` is a pure mapping from a variant to a
//! `RequestDescriptor`; nothing here performs I/O. `Resource<T>` pairs a
//! descriptor with the type its response decodes into, for call sites that
//! want the decode target fixed up front.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::descriptor::RequestDescriptor;
use crate::error::ApiError;
use crate::types::{NewPost, Product, PurchaseRequest};

/// Something that maps to exactly one `RequestDescriptor` under a base URL.
pub trait Endpoint {
    fn descriptor(&self, base_url: &str) -> Result<RequestDescriptor, ApiError>;
}

/// Calls against the `/posts` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsEndpoint {
    /// Decodes to `Vec<Post>`.
    FetchPosts,
    /// Decodes to `Post`.
    FetchOnePost { id: u64 },
    /// Decodes to the created `Post`.
    SendPost(NewPost),
}

impl Endpoint for PostsEndpoint {
    fn descriptor(&self, base_url: &str) -> Result<RequestDescriptor, ApiError> {
        match self {
            PostsEndpoint::FetchPosts => Ok(RequestDescriptor::get(base_url, "/posts")),
            PostsEndpoint::FetchOnePost { id } => Ok(RequestDescriptor::get(base_url, format!("/posts/{id}"))),
            PostsEndpoint::SendPost(post) => RequestDescriptor::post(base_url, "/posts").with_json(post),
        }
    }
}

/// Calls against the purchase service. Every call needs a bearer token,
/// attached with `RequestDescriptor::bearer_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEndpoint {
    /// Decodes to `PurchaseResponse`.
    PurchaseProduct(PurchaseRequest),
    /// Decodes to `Product`.
    GetProduct { product_id: String },
    /// Empty reply; use `JsonClient::perform_no_reply`.
    CancelOrder { order_id: String },
}

impl PurchaseEndpoint {
    pub const TIMEOUT: Duration = Duration::from_secs(20);
}

impl Endpoint for PurchaseEndpoint {
    fn descriptor(&self, base_url: &str) -> Result<RequestDescriptor, ApiError> {
        let descriptor = match self {
            PurchaseEndpoint::PurchaseProduct(request) => {
                RequestDescriptor::post(base_url, "/purchase").with_json(request)?
            }
            PurchaseEndpoint::GetProduct { product_id } => {
                RequestDescriptor::get(base_url, format!("/products/{product_id}"))
            }
            PurchaseEndpoint::CancelOrder { order_id } => {
                RequestDescriptor::post(base_url, format!("/products/{order_id}/cancel"))
            }
        };
        Ok(descriptor.with_timeout(Self::TIMEOUT))
    }
}

/// A descriptor whose response decodes into `T`.
pub struct Resource<T> {
    descriptor: RequestDescriptor,
    _response: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Resource<T> {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            _response: PhantomData,
        }
    }

    /// GET `url`, which already holds the full path.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestDescriptor::get(url, ""))
    }

    pub fn with_query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(self.descriptor.with_query(key, value))
    }
}

impl<T> Resource<T> {
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            _response: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("descriptor", &self.descriptor)
            .field("response", &std::any::type_name::<T>())
            .finish()
    }
}

impl Product {
    pub fn all(base_url: &str) -> Resource<Vec<Product>> {
        Resource::new(RequestDescriptor::get(base_url, "/products"))
    }

    pub fn by_id(base_url: &str, id: u64) -> Resource<Product> {
        Resource::new(RequestDescriptor::get(base_url, format!("/products/{id}")))
    }
}
