use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use urlencoding::encode;

use super::UpstreamError;

pub const FORECAST_DAYS: u8 = 16;
pub const TIMEZONE: &str = "Europe/London";
const TIMEOUT: Duration = Duration::from_secs(10);

pub fn forecast_url(base: &str, latitude: &str, longitude: &str) -> String {
    format!(
        "{base}/v1/forecast?latitude={}&longitude={}&forecast_days={FORECAST_DAYS}\
         &daily=temperature_2m_max,temperature_2m_min&timezone={TIMEZONE}",
        encode(latitude),
        encode(longitude),
    )
}

/// Daily max/min temperature forecast, returned verbatim.
pub async fn fetch_forecast(
    http: &Client,
    base: &str,
    latitude: &str,
    longitude: &str,
) -> Result<Value, UpstreamError> {
    let url = forecast_url(base, latitude, longitude);
    debug!(%url, "constructed Open-Meteo URL");

    let forecast: Value = http
        .get(&url)
        .timeout(TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    info!(latitude, longitude, "climate data fetched");
    Ok(forecast)
}
