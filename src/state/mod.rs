use crate::catalog::{Outcome, ReturnCodeCatalog};
use crate::errors::ApiError;
use crate::registry::DeviceRegistry;
use crate::services::{DeviceService, PersistQueue};
use std::sync::Arc;
use tokio::task::JoinHandle;

const PERSIST_QUEUE_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub catalog: Arc<ReturnCodeCatalog>,
    pub persist: PersistQueue,
}

impl AppState {
    /// Hydrates `registry` from the store and starts the persistence writer.
    pub async fn build(
        registry: DeviceRegistry,
        catalog: ReturnCodeCatalog,
        device_service: DeviceService,
    ) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let stored = device_service.load_all().await?;
        let total = stored.len();
        let loaded = registry.hydrate(stored);
        tracing::info!("Loaded {loaded} of {total} stored devices");
        let (persist, handle) =
            PersistQueue::spawn(Arc::new(device_service), PERSIST_QUEUE_CAPACITY);
        Ok((
            Self {
                registry: Arc::new(registry),
                catalog: Arc::new(catalog),
                persist,
            },
            handle,
        ))
    }

    pub fn reject(&self, outcome: Outcome) -> ApiError {
        ApiError::Rejected(outcome, self.catalog.get(outcome).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceCandidate;
    use crate::services::device::tests::memory_pool;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn restart_serves_stored_devices() {
        let pool = memory_pool().await;
        // a previous run registered this device and exited
        let stored = DeviceRegistry::default()
            .register(&DeviceCandidate::new("sensor-1", "00:11:22:33:44:55"))
            .unwrap();
        DeviceService::new(pool.clone()).persist(&stored).await.unwrap();

        let (state, writer) = AppState::build(
            DeviceRegistry::default(),
            ReturnCodeCatalog::bundled().unwrap(),
            DeviceService::new(pool.clone()),
        )
        .await
        .unwrap();
        assert_eq!(state.registry.len(), 1);
        let app = crate::routes::build().with_state(state);

        let (status, body) = post(&app, "/checkin", json!({ "key": stored.key })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code_string"], "CheckinOK");

        let device = json!({"name": "sensor-1", "mac": "00:11:22:33:44:55"});
        let (status, body) = post(&app, "/register", device).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code_string"], "AlreadyRegistered");

        // dropping the last state handle closes the queue and drains the writer
        drop(app);
        writer.await.unwrap();
        let reloaded = DeviceService::new(pool).load_all().await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded[0].last_checkin.is_some());
    }
}
