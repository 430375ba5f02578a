use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use log::{debug, warn};

use super::error::ApiError;
use crate::service::PredictionService;
use crate::types::{PredictionRequest, PredictionResponse};

/// Shared by every handler. The service is read-only, so no locking is needed.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// `POST /predict`
///
/// The body is taken as a `Result` so that syntax, type and content-type rejections are
/// reported through [`ApiError`] like every other failure.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected prediction request body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    match state.service.predict(&request) {
        Ok(prediction) => {
            debug!("Prediction served: {prediction}");
            Ok(Json(PredictionResponse { prediction }))
        }
        Err(err) => {
            warn!("Prediction failed: {err}");
            Err(err.into())
        }
    }
}
