//! `HttpKeySet` against a local JWKS endpoint.

mod common;

use std::{net::SocketAddr, time::Duration};

use axum::{Json, Router, http::StatusCode, response::Redirect, routing::get};
use serde_json::json;
use task_api::services::auth::key_set::{HttpKeySet, KeySetError, KeySetSource};
use tokio::net::TcpListener;

use common::K1;

async fn spawn_provider() -> SocketAddr {
    let app = Router::new()
        .route(
            "/certs",
            get(|| async { Json(json!({ "keys": [K1.jwk("k1")] })) }),
        )
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "<html>login</html>" }))
        .route("/moved", get(|| async { Redirect::temporary("/certs") }))
        .route(
            "/huge",
            get(|| async { "x".repeat(2 * 1024 * 1024) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!({ "keys": [] }))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn source(addr: SocketAddr, path: &str) -> HttpKeySet {
    HttpKeySet::new(&format!("http://{addr}{path}"), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn fetches_and_parses_key_set() {
    let addr = spawn_provider().await;

    let set = source(addr, "/certs").fetch().await.unwrap();

    assert_eq!(set.keys.len(), 1);
    assert!(set.find("k1").is_some());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let addr = spawn_provider().await;

    let err = source(addr, "/broken").fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::Status(500)));
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let addr = spawn_provider().await;

    let err = source(addr, "/moved").fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::Status(307)));
}

#[tokio::test]
async fn non_json_body_is_a_parse_error() {
    let addr = spawn_provider().await;

    let err = source(addr, "/garbage").fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::Parse(_)));
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let addr = spawn_provider().await;

    let err = source(addr, "/huge").fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::TooLarge(_)));
}

#[tokio::test]
async fn client_timeout_applies() {
    let addr = spawn_provider().await;

    let source = HttpKeySet::new(&format!("http://{addr}/slow"), Duration::from_millis(100)).unwrap();
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, KeySetError::Request(_)));
}
