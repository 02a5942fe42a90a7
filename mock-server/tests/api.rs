use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Post, Product, PurchaseResponse};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- posts ---

#[tokio::test]
async fn list_posts_returns_seeded_posts() {
    let resp = app().oneshot(get_request("/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, 1);
}

#[tokio::test]
async fn get_post_not_found() {
    let resp = app().oneshot(get_request("/posts/999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_post_bad_id_returns_400() {
    let resp = app().oneshot(get_request("/posts/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_post_returns_201() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/posts",
            r#"{"userId":4,"title":"Hello","body":"World"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Post = body_json(resp).await;
    assert_eq!(post.id, 3);
    assert_eq!(post.user_id, 4);
    assert_eq!(post.title, "Hello");
}

#[tokio::test]
async fn create_post_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/posts", r#"{"not_title":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- products ---

#[tokio::test]
async fn list_products_honours_sort_and_limit() {
    let resp = app()
        .oneshot(get_request("/products?sort=desc&limit=2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let products: Vec<Product> = body_json(resp).await;
    let ids: Vec<u64> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 2]);
}

#[tokio::test]
async fn get_product_by_id() {
    let resp = app().oneshot(get_request("/products/1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let product: Product = body_json(resp).await;
    assert_eq!(product.title, "Backpack");
}

#[tokio::test]
async fn cancel_order_returns_empty_200() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products/7/cancel")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- purchase ---

#[tokio::test]
async fn purchase_requires_bearer_token() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/purchase",
            r#"{"products":["chicken"],"cost":20}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purchase_with_token_returns_201() {
    let request = Request::builder()
        .method("POST")
        .uri("/purchase")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "Bearer secret")
        .body(r#"{"products":["chicken","orange juice"],"cost":20}"#.to_string())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let purchase: PurchaseResponse = body_json(resp).await;
    assert_eq!(purchase.product_name, "chicken");
}

// --- diagnostics ---

#[tokio::test]
async fn status_route_echoes_requested_code() {
    let resp = app().oneshot(get_request("/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn slow_route_answers_after_delay() {
    let resp = app().oneshot(get_request("/slow/5")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["slept"], 5);
}

// --- lifecycle ---

#[tokio::test]
async fn create_then_fetch_post() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/posts",
            r#"{"userId":1,"title":"Walk dog","body":"today"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Post = body_json(resp).await;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/posts/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Post = body_json(resp).await;
    assert_eq!(fetched, created);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/posts"))
        .await
        .unwrap();
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts.len(), 3);
}
