//! End-to-end checks of the `/books` HTTP contract, driven through
//! `Server::test_request` against an in-memory SQLite collection.

use bookshelf_core::server::Bytes;
use bookshelf_core::{
    handlers, open_store, DocumentId, HttpResponse, Method, Server, ServerConfig, StoreConfig,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

async fn app() -> Server {
    let config = StoreConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        ..StoreConfig::default()
    };
    let store = Arc::new(open_store(&config).await.unwrap());
    let mut server = Server::new(ServerConfig::default());
    handlers::register(&mut server, store).unwrap();
    server
}

async fn call(server: &Server, method: Method, path: &str, body: Option<Value>) -> HttpResponse {
    let body = body.map(|v| Bytes::from(v.to_string()));
    server.test_request(method, path, HashMap::new(), body).await
}

fn parse(resp: &HttpResponse) -> Value {
    serde_json::from_str(&resp.body).unwrap()
}

fn dune() -> Value {
    json!({ "title": "Dune", "author": "Herbert", "summary": "Desert planet." })
}

async fn create(server: &Server, body: Value) -> Value {
    let resp = call(server, Method::Post, "/books/", Some(body)).await;
    assert_eq!(resp.status, 200, "create failed: {}", resp.body);
    parse(&resp)
}

#[tokio::test]
async fn example_scenario() {
    let server = app().await;

    let created = create(&server, dune()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(
        created,
        json!({ "id": id, "title": "Dune", "author": "Herbert", "summary": "Desert planet." })
    );

    let resp = call(&server, Method::Get, &format!("/books/{id}"), None).await;
    assert_eq!(resp.status, 200);
    assert_eq!(parse(&resp), created);

    let resp = call(&server, Method::Delete, &format!("/books/{id}"), None).await;
    assert_eq!(resp.status, 200);
    assert_eq!(parse(&resp), json!({ "message": "Book deleted successfully" }));

    let resp = call(&server, Method::Get, &format!("/books/{id}"), None).await;
    assert_eq!(resp.status, 404);
    assert_eq!(parse(&resp), json!({ "detail": "Book not found" }));
}

#[tokio::test]
async fn list_reflects_creates() {
    let server = app().await;

    let resp = call(&server, Method::Get, "/books/", None).await;
    assert_eq!(resp.status, 200);
    assert_eq!(parse(&resp), json!([]));

    let mut ids = Vec::new();
    for title in ["Dune", "Emma", "Ulysses"] {
        let created = create(
            &server,
            json!({ "title": title, "author": "Someone", "summary": "A book." }),
        )
        .await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }

    let resp = call(&server, Method::Get, "/books", None).await;
    assert_eq!(resp.status, 200);
    let listed = parse(&resp);
    let listed_ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed_ids.len(), 3);
    for id in &ids {
        assert!(listed_ids.contains(&id.as_str()));
    }
}

#[tokio::test]
async fn update_replaces_fully() {
    let server = app().await;
    let created = create(&server, dune()).await;
    let id = created["id"].as_str().unwrap();

    let replacement = json!({
        "title": "Dune Messiah",
        "author": "Frank Herbert",
        "summary": "Twelve years later.",
        "extra": "dropped"
    });
    let resp = call(&server, Method::Put, &format!("/books/{id}"), Some(replacement)).await;
    assert_eq!(resp.status, 200);

    let expected = json!({
        "id": id,
        "title": "Dune Messiah",
        "author": "Frank Herbert",
        "summary": "Twelve years later."
    });
    assert_eq!(parse(&resp), expected);

    let resp = call(&server, Method::Get, &format!("/books/{id}"), None).await;
    assert_eq!(parse(&resp), expected);
}

#[tokio::test]
async fn noop_update_is_not_reported_missing() {
    let server = app().await;
    let created = create(&server, dune()).await;
    let id = created["id"].as_str().unwrap();

    let resp = call(&server, Method::Put, &format!("/books/{id}"), Some(dune())).await;
    assert_eq!(resp.status, 200);
    assert_eq!(parse(&resp), created);
}

#[tokio::test]
async fn never_issued_id_is_not_found_everywhere() {
    let server = app().await;
    let path = format!("/books/{}", DocumentId::generate());

    assert_eq!(call(&server, Method::Get, &path, None).await.status, 404);
    assert_eq!(call(&server, Method::Put, &path, Some(dune())).await.status, 404);
    assert_eq!(call(&server, Method::Delete, &path, None).await.status, 404);
}

#[tokio::test]
async fn malformed_id_is_client_error() {
    let server = app().await;

    for method in [Method::Get, Method::Delete] {
        let resp = call(&server, method, "/books/not-an-id", None).await;
        assert_eq!(resp.status, 400);
        assert!(parse(&resp)["detail"].as_str().unwrap().contains("not-an-id"));
    }

    let resp = call(&server, Method::Put, "/books/not-an-id", Some(dune())).await;
    assert_eq!(resp.status, 400);
}

#[tokio::test]
async fn schema_mismatch_is_unprocessable() {
    let server = app().await;

    let resp = call(
        &server,
        Method::Post,
        "/books/",
        Some(json!({ "title": "Dune", "author": 1984 })),
    )
    .await;
    assert_eq!(resp.status, 422);
    let detail = parse(&resp)["detail"].clone();
    let fields: Vec<&str> = detail
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["author", "summary"]);

    let resp = server
        .test_request(
            Method::Post,
            "/books/",
            HashMap::new(),
            Some(Bytes::from_static(b"{broken")),
        )
        .await;
    assert_eq!(resp.status, 422);

    let resp = call(&server, Method::Post, "/books/", None).await;
    assert_eq!(resp.status, 422);

    let created = create(&server, dune()).await;
    let id = created["id"].as_str().unwrap();
    let resp = call(
        &server,
        Method::Put,
        &format!("/books/{id}"),
        Some(json!({ "title": "", "author": "Herbert", "summary": "x" })),
    )
    .await;
    assert_eq!(resp.status, 422);

    let resp = call(&server, Method::Get, &format!("/books/{id}"), None).await;
    assert_eq!(parse(&resp), created);
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let server = app().await;

    let resp = call(&server, Method::Get, "/authors/", None).await;
    assert_eq!(resp.status, 404);
    assert_eq!(parse(&resp), json!({ "detail": "Not Found" }));

    let resp = call(&server, Method::Patch, "/books/", None).await;
    assert_eq!(resp.status, 405);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let server = app().await;
    let mut headers = HashMap::new();
    headers.insert("x-request-id".to_string(), "trace-7".to_string());

    let resp = server
        .test_request(Method::Get, "/books/", headers, None)
        .await;
    assert_eq!(resp.header("x-request-id"), Some("trace-7"));
    assert_eq!(resp.content_type, "application/json");
}

#[tokio::test]
async fn deleted_id_is_never_reissued() {
    let server = app().await;
    let first = create(&server, dune()).await;
    let old_id = first["id"].as_str().unwrap().to_string();

    let resp = call(&server, Method::Delete, &format!("/books/{old_id}"), None).await;
    assert_eq!(resp.status, 200);

    let second = create(&server, dune()).await;
    assert_ne!(second["id"].as_str().unwrap(), old_id);

    let resp = call(&server, Method::Get, &format!("/books/{old_id}"), None).await;
    assert_eq!(resp.status, 404);
    let resp = call(&server, Method::Delete, &format!("/books/{old_id}"), None).await;
    assert_eq!(resp.status, 404);
}
