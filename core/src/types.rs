//! Domain DTOs exchanged with the JSON APIs the client is pointed at.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! integration tests catch drift between the two crates. Field names follow
//! the remote APIs (`userId`, `productName`) through serde renames.

use serde::{Deserialize, Serialize};

/// A blog post as served by `/posts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// Payload for creating a post; the server assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// A store product. `id` is absent on products that were never saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub products: Vec<String>,
    pub cost: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: u64,
    pub product_name: String,
}
