//! The backend the dashboard talks to: three JSON endpoints that proxy the
//! public climate, fire and oil slick APIs.

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{
    client::EndpointId,
    config::ServerConfig,
    model::{Envelope, FireRecord, SlickRecord},
    upstream::{
        UpstreamError, Upstreams,
        cerulean::SlickRequest,
        firms::{self, FireRequest},
    },
};

type Params = Query<HashMap<String, String>>;

/// JSON error body: `{"error": ..., "details": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: Option<String>,
}

impl ApiError {
    fn bad_request(error: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
            details: None,
        }
    }

    /// Maps an upstream failure to the endpoint's 500 response.
    fn upstream(fetch_error: &'static str, err: UpstreamError) -> Self {
        let error = match err {
            UpstreamError::Processing(_) => "Data processing error",
            UpstreamError::Request(_) | UpstreamError::NotConfigured(_) => fetch_error,
        };
        error!(%err, kind = error, "upstream request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
            details: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn router(upstreams: Arc<Upstreams>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(EndpointId::Climate.path(), get(climate_data))
        .route(EndpointId::Fire.path(), get(fire_data))
        .route(EndpointId::Slick.path(), get(spill_data_oil))
        .layer(cors)
        .with_state(upstreams)
}

pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let upstreams = Arc::new(Upstreams::from_config(config));
    let app = router(upstreams);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Backend running at http://{addr}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// A present but blank value counts as missing.
fn required<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Absent -> `default`; present but blank -> `None`.
fn defaulted<'a>(
    params: &'a HashMap<String, String>,
    key: &str,
    default: &'a str,
) -> Option<&'a str> {
    match params.get(key) {
        None => Some(default),
        Some(v) if v.is_empty() => None,
        Some(v) => Some(v.as_str()),
    }
}

async fn climate_data(
    State(upstreams): State<Arc<Upstreams>>,
    Query(params): Params,
) -> Result<Json<Envelope<Value>>, ApiError> {
    let (Some(latitude), Some(longitude)) =
        (required(&params, "latitude"), required(&params, "longitude"))
    else {
        return Err(ApiError::bad_request("Missing required query parameters"));
    };

    let forecast = upstreams
        .climate(latitude, longitude)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch climate data from Open-Meteo API", e))?;

    Ok(Json(Envelope::new("Climate data fetched successfully", forecast)))
}

fn fire_request(params: &HashMap<String, String>) -> Result<FireRequest, ApiError> {
    let (Some(country), Some(source), Some(day_range)) = (
        defaulted(params, "country", firms::DEFAULT_COUNTRY),
        defaulted(params, "source", firms::DEFAULT_SOURCE),
        defaulted(params, "day_range", firms::DEFAULT_DAY_RANGE),
    ) else {
        return Err(ApiError::bad_request("Missing required parameters"));
    };

    let display_number = match params.get("display_number").map(|v| v.trim()) {
        None | Some("") => firms::DEFAULT_DISPLAY_NUMBER,
        Some(v) => v
            .parse()
            .map_err(|_| ApiError::bad_request("display_number must be a whole number"))?,
    };

    Ok(FireRequest {
        country: country.to_string(),
        source: source.to_string(),
        day_range: day_range.to_string(),
        display_number,
    })
}

async fn fire_data(
    State(upstreams): State<Arc<Upstreams>>,
    Query(params): Params,
) -> Result<Json<Envelope<Vec<FireRecord>>>, ApiError> {
    let request = fire_request(&params)?;

    let fires = upstreams
        .fires(&request)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch fire data", e))?;

    Ok(Json(Envelope::new("Global fire data fetched successfully", fires)))
}

async fn spill_data_oil(
    State(upstreams): State<Arc<Upstreams>>,
    Query(params): Params,
) -> Result<Json<Envelope<Vec<SlickRecord>>>, ApiError> {
    let Some(bbox) = params.get("bbox") else {
        return Err(ApiError::bad_request("Missing required query parameters"));
    };
    let field = |key: &str| params.get(key).cloned().unwrap_or_default();

    let request = SlickRequest {
        bbox: bbox.clone(),
        start_date: field("start_date"),
        end_date: field("end_date"),
        min_confidence: field("min_confidence"),
        limit: field("limit"),
    };

    let batch = upstreams
        .slicks(&request)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch slick data", e))?;

    let mut envelope = Envelope::new("Slick data fetched successfully", batch.slicks);
    envelope.number_matched = batch.number_matched;
    envelope.number_returned = batch.number_returned;
    Ok(Json(envelope))
}
