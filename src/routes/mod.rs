mod device;
mod system;

use crate::middlewares::trace_id::{TraceId, TraceIdLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tracing::Span;

pub fn build() -> Router<AppState> {
    Router::new()
        // ======== device protocol ========
        .route("/register", post(device::register))
        .route("/checkin", post(device::checkin))
        // ======== diagnostics ========
        .route("/api/health", get(system::health))
        .route("/api/version", get(system::version))
        .route("/api/devices", get(device::list))
        .route("/api/devices/{mac}", get(device::get_by_mac))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let trace_id = request
                        .extensions()
                        .get::<TraceId>()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    tracing::debug_span!("request", trace_id = %trace_id)
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::trace!(
                        method = %req.method(),
                        uri = %req.uri(),
                        version = %format!("{:?}", req.version()),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::trace!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(TraceIdLayer)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ReturnCodeCatalog;
    use crate::registry::DeviceRegistry;
    use crate::services::DeviceService;
    use crate::services::device::tests::memory_pool;
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn app() -> (Router, AppState) {
        let (state, _writer) = AppState::build(
            DeviceRegistry::default(),
            ReturnCodeCatalog::bundled().unwrap(),
            DeviceService::new(memory_pool().await),
        )
        .await
        .unwrap();
        (build().with_state(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, "/register", &body.to_string()).await
    }

    #[tokio::test]
    async fn register_and_check_in() {
        let (app, state) = app().await;
        let (status, body) = register(
            &app,
            json!({"name": "sensor-1", "mac": "00:11:22:33:44:55"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1001);
        assert_eq!(body["code_string"], "RegisterOK");
        assert_eq!(body["mac"], "00:11:22:33:44:55");
        let key = body["key"].as_str().unwrap().to_string();
        assert_eq!(state.registry.find_by_key(&key), Some(0));

        let checkin = json!({ "key": key }).to_string();
        let (status, body) = send(&app, Method::POST, "/checkin", &checkin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code_string"], "CheckinOK");
        let first = body["last_checkin"].as_str().unwrap().to_string();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let (_, body) = send(&app, Method::POST, "/checkin", &checkin).await;
        let second = body["last_checkin"].as_str().unwrap().to_string();
        let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).unwrap();
        assert!(parse(&second) > parse(&first));
    }

    #[tokio::test]
    async fn registration_rejections_carry_catalog_entries() {
        let (app, state) = app().await;
        let device = json!({"name": "sensor-1", "mac": "00:11:22:33:44:55"});
        assert_eq!(register(&app, device.clone()).await.0, StatusCode::OK);

        let cases = [
            (device.to_string(), "AlreadyRegistered", 1005),
            (json!({"name": "", "mac": "aa:bb:cc:dd:ee:ff"}).to_string(), "MissingInformation", 1002),
            (json!({"name": "x", "mac": ""}).to_string(), "MissingInformation", 1002),
            (json!({"name": "x"}).to_string(), "MissingInformation", 1002),
            (json!({"name": "x", "mac": "00:011::03:04:5"}).to_string(), "BadDeviceMac", 1004),
            (
                r#"{"name":"Sample name", "mac":"00:00:00:00:00:00}"#.to_string(),
                "BadJSON",
                1003,
            ),
        ];
        for (body, code_string, code) in cases {
            let (status, body) = send(&app, Method::POST, "/register", &body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code_string"], code_string);
            assert_eq!(body["code"], code);
            assert!(body["comment"].is_string());
        }
        assert_eq!(state.registry.len(), 1);
    }

    #[tokio::test]
    async fn check_in_rejections() {
        let (app, _) = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/checkin",
            &json!({"key": "nonexistent-key"}).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code_string"], "BadKey");

        for malformed in ["{\"key\": ", "{}", "{\"key\": 5}", "{\"key\": \"\"}"] {
            let (status, body) = send(&app, Method::POST, "/checkin", malformed).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code_string"], "MalformedCheckin");
        }
    }

    #[tokio::test]
    async fn array_bodies_are_rejected() {
        let (app, state) = app().await;
        for body in [r#"["sensor-1","00:11:22:33:44:55"]"#, "[]", r#""sensor-1""#] {
            let (status, body) = send(&app, Method::POST, "/register", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code_string"], "BadJSON");
        }
        assert_eq!(state.registry.len(), 0);

        let (_, body) = register(&app, json!({"name": "sensor-1", "mac": "00:11:22:33:44:55"})).await;
        let key = body["key"].as_str().unwrap().to_string();
        let (status, body) = send(&app, Method::POST, "/checkin", &json!([key]).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code_string"], "MalformedCheckin");
        assert_eq!(state.registry.get(0).unwrap().last_checkin, None);
    }

    #[tokio::test]
    async fn diagnostics_hide_keys() {
        let (app, _) = app().await;
        register(&app, json!({"name": "sensor-1", "mac": "00:11:22:33:44:55"})).await;

        let (status, body) = send(&app, Method::GET, "/api/devices", "").await;
        assert_eq!(status, StatusCode::OK);
        let devices = body.as_array().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0]["name"], "sensor-1");
        assert!(devices[0].get("key").is_none());
        assert!(devices[0].get("last_checkin").is_none());

        let (status, body) = send(&app, Method::GET, "/api/devices/00:11:22:33:44:55", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mac"], "00:11:22:33:44:55");

        let (status, _) = send(&app, Method::GET, "/api/devices/00:11:22:33:44:66", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_version() {
        let (app, _) = app().await;
        let (status, _) = send(&app, Method::GET, "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, "/api/version", "").await;
        assert_eq!(status, StatusCode::OK);
    }
}
