//! HTTP router.
//!
//! Maps each endpoint to its implementation in [`crate::routes`] and wraps
//! the whole surface in permissive CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{self, preflight};
use crate::service::PreviewService;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PreviewService>,
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::OPTIONS]).allow_headers(Any)
}

/// Build the application router.
pub fn create_router(service: Arc<PreviewService>) -> Router {
    Router::new()
        .route("/preview", get(routes::preview::single).options(preflight))
        .route("/previews", get(routes::preview::batch).options(preflight))
        .route("/proxy-image", get(routes::image::proxy).options(preflight))
        .route("/health", get(routes::status::health).options(preflight))
        .route("/metrics", get(routes::status::metrics).options(preflight))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubUpstream, test_config};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;
    use unfurl_client::PageMeta;
    use unfurl_core::Error;

    fn app(stub: StubUpstream) -> (Router, Arc<StubUpstream>) {
        let stub = Arc::new(stub);
        let service = Arc::new(PreviewService::new(test_config(), stub.clone()));
        (create_router(service), stub)
    }

    async fn send(router: &Router, method: Method, uri: &str) -> Response {
        let request =
            Request::builder().method(method).uri(uri).header(header::ORIGIN, "https://app.test").body(Body::empty());
        router.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_preview_endpoint() {
        let meta = PageMeta { title: Some("Hello &amp; welcome".into()), ..Default::default() };
        let (router, _) = app(StubUpstream::new().with_page("https://a.test/post", meta));

        let response = send(&router, Method::GET, "/preview?url=https%3A%2F%2Fa.test%2Fpost").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CACHE_CONTROL), Some("public, max-age=3600"));
        assert_eq!(header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert!(header_str(&response, header::CONTENT_TYPE).is_some_and(|ct| ct.starts_with("application/json")));

        let json = body_json(response).await;
        assert_eq!(json["url"], "https://a.test/post");
        assert_eq!(json["title"], "Hello & welcome");
        assert_eq!(json["domain"], "a.test");
        assert_eq!(json["favicon"], "https://a.test/favicon.ico");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_preview_failure_still_200() {
        let err = Error::HttpStatus { status: 404, reason: "Not Found".into() };
        let (router, _) = app(StubUpstream::new().with_page_error("https://gone.test/", err));

        let response = send(&router, Method::GET, "/preview?url=https://gone.test/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["error"], "HTTP 404 Not Found");

        let response = send(&router, Method::GET, "/preview?url=bad-url").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["error"], "Invalid URL");
    }

    #[tokio::test]
    async fn test_preview_missing_url() {
        let (router, stub) = app(StubUpstream::new());

        for uri in ["/preview", "/preview?url=", "/previews", "/proxy-image"] {
            let response = send(&router, Method::GET, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_json(response).await["error"], "Missing url parameter", "{uri}");
        }
        assert_eq!(stub.meta_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_endpoint_order() {
        let (router, stub) = app(StubUpstream::new());

        let uri = "/previews?url=https://a.test/one&url=bad-url&url=https://b.test/two";
        let response = send(&router, Method::GET, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CACHE_CONTROL), Some("public, max-age=3600"));

        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["title"], "Title of /one");
        assert_eq!(items[1]["url"], "bad-url");
        assert_eq!(items[1]["error"], "Invalid URL");
        assert_eq!(items[2]["title"], "Title of /two");
        assert_eq!(stub.meta_calls(), 2);
    }

    #[tokio::test]
    async fn test_batch_too_many_urls() {
        let (router, stub) = app(StubUpstream::new());

        let query: Vec<String> = (0..21).map(|i| format!("url=https://a.test/{i}")).collect();
        let response = send(&router, Method::GET, &format!("/previews?{}", query.join("&"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Maximum 20 URLs per request");
        assert_eq!(stub.meta_calls(), 0);
    }

    #[tokio::test]
    async fn test_proxy_image_endpoint() {
        let (router, stub) = app(StubUpstream::new().with_image("https://img.test/a.png", 2_048, "image/png"));

        let first = send(&router, Method::GET, "/proxy-image?url=https://img.test/a.png").await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(header_str(&first, header::CONTENT_TYPE), Some("image/png"));
        assert_eq!(header_str(&first, header::CACHE_CONTROL), Some("public, max-age=300"));
        let first_body = body_bytes(first).await;
        assert_eq!(first_body.len(), 2_048);

        let second = send(&router, Method::GET, "/proxy-image?url=https://img.test/a.png").await;
        assert_eq!(body_bytes(second).await, first_body);
        assert_eq!(stub.image_calls(), 1);
    }

    #[tokio::test]
    async fn test_proxy_image_errors() {
        let err = Error::FetchFailed("refused".into());
        let stub = StubUpstream::new().with_image_error("https://img.test/down.png", err);
        let (router, _) = app(stub);

        let response = send(&router, Method::GET, "/proxy-image?url=https://img.test/missing.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&router, Method::GET, "/proxy-image?url=https://img.test/down.png").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = send(&router, Method::GET, "/proxy-image?url=ftp://img.test/a.png").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_options_requests() {
        let (router, stub) = app(StubUpstream::new());

        for uri in ["/preview", "/previews", "/proxy-image"] {
            let response = send(&router, Method::OPTIONS, uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
            assert!(body_bytes(response).await.is_empty());
        }

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/preview")
            .header(header::ORIGIN, "https://app.test")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert!(header_str(&response, header::ACCESS_CONTROL_ALLOW_METHODS).is_some_and(|m| m.contains("GET")));

        assert_eq!(stub.meta_calls(), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app(StubUpstream::new());
        let response = send(&router, Method::GET, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_metrics_reflect_traffic() {
        let (router, _) = app(StubUpstream::new());

        send(&router, Method::GET, "/preview?url=https://a.test/").await;
        send(&router, Method::GET, "/preview?url=https://a.test/").await;

        let response = send(&router, Method::GET, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["preview_hits"], 1);
        assert_eq!(json["preview_misses"], 1);
        assert_eq!(json["preview_cache_size"], 1);
        assert_eq!(json["image_cache_size"], 0);
        assert_eq!(json["in_flight"], 0);
        assert!(json["memory_usage_mb"].is_u64());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (router, _) = app(StubUpstream::new());
        let response = send(&router, Method::GET, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
