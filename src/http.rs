//! HTTP handlers for the form page and its JSON API.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::catalog::FormCatalog;
use crate::encoder::named;
use crate::types::{CarDescription, PredictionOut};
use crate::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

type ApiError = (StatusCode, Json<serde_json::Value>);

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Send the browser to the external analytics dashboard.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.dashboard_url)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model": state.model.describe(),
        "in_dim": state.index.len(),
    }))
}

pub async fn catalog(State(state): State<Arc<AppState>>) -> Json<FormCatalog> {
    Json(state.catalog.clone())
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(car): Json<CarDescription>,
) -> Result<Json<PredictionOut>, ApiError> {
    state.predict(car).map(Json).map_err(|e| {
        tracing::error!("prediction failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

#[derive(Debug, Serialize)]
pub struct EncodedSlot {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Serialize)]
pub struct EncodeOut {
    pub features: Vec<EncodedSlot>,
    pub vector: Vec<f32>,
}

/// The encoded vector for a car, without running the model.
pub async fn encode(
    State(state): State<Arc<AppState>>,
    Json(car): Json<CarDescription>,
) -> Json<EncodeOut> {
    let car = car.clamped(&state.catalog.bounds);
    let vector = state.encode(&car);
    let features = named(&state.index, &vector)
        .map(|(name, value)| EncodedSlot {
            name: name.to_string(),
            value,
        })
        .collect();
    Json(EncodeOut { features, vector })
}
