use crate::catalog::Outcome;
use crate::errors::{ApiError, ApiResult};
use crate::models::DeviceCandidate;
use crate::models::dtos::decode_object;
use crate::models::dtos::device::{
    CheckinBodyDto, CheckinResponseDto, DeviceSummaryDto, RegisterBodyDto, RegisterResponseDto,
};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

/// Registers a device and answers with its key.
///
/// The body is decoded by hand instead of through `Json` so that devices omitting
/// the content type are still served and bad bodies, arrays included, map to `BadJSON`.
pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let body: RegisterBodyDto = decode_object(&body).map_err(|err| {
        tracing::warn!("Received bad registration body: {err}");
        state.reject(Outcome::BadJson)
    })?;
    let candidate = DeviceCandidate::from(body);
    let device = state.registry.register(&candidate).map_err(|err| {
        tracing::warn!("Registration of '{}' refused: {err}", candidate.name);
        match err.outcome() {
            Some(outcome) => state.reject(outcome),
            None => ApiError::Internal(err.into()),
        }
    })?;
    let response = RegisterResponseDto {
        code: state.catalog.get(Outcome::RegisterOk).clone(),
        key: device.key.clone(),
        mac: device.mac.clone(),
    };
    state.persist.registered(device);
    Ok(Json(response))
}

pub async fn checkin(State(state): State<AppState>, body: Bytes) -> ApiResult<impl IntoResponse> {
    let body: CheckinBodyDto = decode_object(&body).map_err(|err| {
        tracing::warn!("Received malformed check-in: {err}");
        state.reject(Outcome::MalformedCheckin)
    })?;
    let at = state.registry.check_in(&body.key).map_err(|err| {
        tracing::warn!("Check-in refused: {err}");
        state.reject(err.outcome())
    })?;
    state.persist.checked_in(body.key, at);
    Ok(Json(CheckinResponseDto {
        code: state.catalog.get(Outcome::CheckinOk).clone(),
        last_checkin: at,
    }))
}

/// Dumps every known device in registration order.
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(
        state
            .registry
            .snapshot()
            .into_iter()
            .map(DeviceSummaryDto::from)
            .collect::<Vec<_>>(),
    )
}

pub async fn get_by_mac(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let device = state
        .registry
        .find_by_mac(&mac)
        .and_then(|slot| state.registry.get(slot))
        .ok_or(ApiError::ResourceNotFound)?;
    Ok(Json(DeviceSummaryDto::from(device)))
}
