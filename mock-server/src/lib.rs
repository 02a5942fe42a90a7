use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    pub products: Vec<String>,
    pub cost: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: u64,
    pub product_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct ProductQuery {
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Default)]
pub struct Store {
    posts: BTreeMap<u64, Post>,
    products: Vec<Product>,
    next_id: u64,
}

impl Store {
    /// A store pre-filled with a couple of posts and products.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        for (title, body) in [("first post", "hello"), ("second post", "world")] {
            store.next_id += 1;
            let id = store.next_id;
            store.posts.insert(
                id,
                Post {
                    user_id: 1,
                    id,
                    title: title.to_string(),
                    body: body.to_string(),
                },
            );
        }
        store.products = [
            (1, "Backpack", 109.95, "men's clothing"),
            (2, "Slim Fit T-Shirt", 22.3, "men's clothing"),
            (3, "Gold Bracelet", 695.0, "jewelery"),
        ]
        .into_iter()
        .map(|(id, title, price, category)| Product {
            id,
            title: title.to_string(),
            price,
            description: format!("{title} description"),
            image: format!("https://example.test/img/{id}.jpg"),
            category: category.to_string(),
        })
        .collect();
        store
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/cancel", post(cancel_order))
        .route("/purchase", post(purchase))
        .route("/user", get(current_user))
        .route("/status/{code}", get(status))
        .route("/slow/{millis}", get(slow))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    let store = db.read().await;
    Json(store.posts.values().cloned().collect())
}

async fn create_post(State(db): State<Db>, Json(input): Json<NewPost>) -> (StatusCode, Json<Post>) {
    let mut store = db.write().await;
    store.next_id += 1;
    let post = Post {
        user_id: input.user_id,
        id: store.next_id,
        title: input.title,
        body: input.body,
    };
    store.posts.insert(post.id, post.clone());
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    let store = db.read().await;
    store.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_products(State(db): State<Db>, Query(query): Query<ProductQuery>) -> Json<Vec<Product>> {
    let store = db.read().await;
    let mut products = store.products.clone();
    if query.sort.as_deref() == Some("desc") {
        products.reverse();
    }
    if let Some(limit) = query.limit {
        products.truncate(limit);
    }
    Json(products)
}

async fn get_product(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Product>, StatusCode> {
    let store = db.read().await;
    store
        .products
        .iter()
        .find(|product| product.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn cancel_order(Path(_id): Path<String>) -> StatusCode {
    StatusCode::OK
}

async fn purchase(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), StatusCode> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer ") && value.len() > "Bearer ".len());
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let product_name = input.products.first().cloned().ok_or(StatusCode::BAD_REQUEST)?;
    if input.cost == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut store = db.write().await;
    store.next_id += 1;
    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            id: store.next_id,
            product_name,
        }),
    ))
}

async fn current_user() -> Json<User> {
    Json(User {
        name: "Janet Weaver".to_string(),
        email: "janet.weaver@reqres.in".to_string(),
    })
}

/// Respond with an arbitrary status and a small JSON body naming it.
async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}

async fn slow(Path(millis): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(serde_json::json!({ "slept": millis }))
}
