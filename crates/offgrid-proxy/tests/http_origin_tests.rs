//! HttpOrigin and the proxy against a real HTTP server.

use bytes::Bytes;
use http::header::{ETAG, IF_NONE_MATCH};
use http::{HeaderValue, Method, StatusCode};
use offgrid_cache::MemoryStore;
use offgrid_core::ports::{CacheStore, Origin};
use offgrid_core::{AssetRequest, CacheGeneration, ResponseSource};
use offgrid_proxy::{AssetCacheProxy, HttpOrigin, ProxyConfig};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn asset_url(server: &MockServer, p: &str) -> Url {
    Url::parse(&server.uri()).unwrap().join(p).unwrap()
}

/// An address nothing is listening on.
fn dead_url(p: &str) -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}", addr)).unwrap().join(p).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"e1\"")
                .set_body_string("body { margin: 0 }"),
        )
        .mount(&server)
        .await;

    let origin = HttpOrigin::new();
    let resp = origin
        .fetch(&AssetRequest::get(asset_url(&server, "/style.css")))
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.etag(), Some("\"e1\""));
    assert_eq!(resp.body, Bytes::from_static(b"body { margin: 0 }"));
}

#[tokio::test]
async fn test_fetch_forwards_conditional_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .and(header("If-None-Match", "\"e1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let request = AssetRequest::get(asset_url(&server, "/style.css"))
        .with_header(IF_NONE_MATCH, HeaderValue::from_static("\"e1\""));
    let resp = HttpOrigin::new().fetch(&request).await.unwrap();

    assert!(resp.is_not_modified());
}

#[tokio::test]
async fn test_fetch_sends_method_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scores"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request =
        AssetRequest::new(Method::POST, asset_url(&server, "/scores")).with_body("[]");
    let resp = HttpOrigin::new().fetch(&request).await.unwrap();

    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_origin_is_transport_error() {
    let err = HttpOrigin::new()
        .fetch(&AssetRequest::get(dead_url("/style.css")))
        .await
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_proxy_revalidates_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wasm.js"))
        .and(header("If-None-Match", "\"e1\""))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wasm.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"e1\"")
                .set_body_string("B1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let config = ProxyConfig {
        detach_writes: false,
        ..ProxyConfig::default()
    };
    let proxy = AssetCacheProxy::new(config, store.clone(), Arc::new(HttpOrigin::new()));

    let first = proxy
        .handle(AssetRequest::get(asset_url(&server, "/wasm.js")))
        .await;
    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(first.body, Bytes::from_static(b"B1"));

    let second = proxy
        .handle(AssetRequest::get(asset_url(&server, "/wasm.js")))
        .await;
    assert_eq!(second.source, ResponseSource::Revalidated);
    assert_eq!(second.body, Bytes::from_static(b"B1"));
    assert_eq!(second.headers.get(ETAG).unwrap(), "\"e1\"");

    assert_eq!(store.stats().writes, 1);
}

#[tokio::test]
async fn test_proxy_serves_cache_when_origin_is_down() {
    let store = Arc::new(MemoryStore::new());
    let url = dead_url("/index.html");

    let seeded = offgrid_core::StoredResponse {
        status: StatusCode::OK,
        headers: Default::default(),
        body: Bytes::from_static(b"<html></html>"),
        stored_at: chrono::Utc::now(),
    };
    store
        .put(
            &CacheGeneration::default(),
            &AssetRequest::get(url.clone()).cache_key(),
            &seeded,
        )
        .await
        .unwrap();

    let proxy = AssetCacheProxy::new(
        ProxyConfig::default(),
        store.clone(),
        Arc::new(HttpOrigin::new()),
    );
    let resp = proxy.handle(AssetRequest::get(url)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.source, ResponseSource::Stale);
    assert_eq!(resp.body, Bytes::from_static(b"<html></html>"));
}
