//! NASA FIRMS active fire detections, fetched as CSV per country.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use urlencoding::encode;

use super::UpstreamError;
use crate::model::FireRecord;

pub const DEFAULT_COUNTRY: &str = "USA";
pub const DEFAULT_SOURCE: &str = "VIIRS_SNPP_NRT";
pub const DEFAULT_DAY_RANGE: &str = "1";
pub const DEFAULT_DISPLAY_NUMBER: usize = 25;
const TIMEOUT: Duration = Duration::from_secs(40);

// Column positions in the FIRMS country CSV.
const LATITUDE: usize = 1;
const LONGITUDE: usize = 2;
const BRIGHT_TI4: usize = 3;
const ACQ_DATE: usize = 6;
const FRP: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireRequest {
    pub country: String,
    pub source: String,
    pub day_range: String,
    pub display_number: usize,
}

impl Default for FireRequest {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            day_range: DEFAULT_DAY_RANGE.to_string(),
            display_number: DEFAULT_DISPLAY_NUMBER,
        }
    }
}

pub type FireBatch = Vec<FireRecord>;

fn country_path(key: &str, query: &FireRequest) -> String {
    format!(
        "/api/country/csv/{}/{}/{}/{}",
        encode(key),
        encode(&query.source),
        encode(&query.country),
        encode(&query.day_range)
    )
}

pub fn country_url(base: &str, key: &str, query: &FireRequest) -> String {
    format!("{base}{}", country_path(key, query))
}

/// First `limit` data rows of a FIRMS CSV, reduced to the displayed columns.
/// Values stay as the text FIRMS sent.
pub fn parse_csv(text: &str, limit: usize) -> Result<FireBatch, UpstreamError> {
    text.trim()
        .split('\n')
        .skip(1)
        .take(limit)
        .enumerate()
        .map(|(i, line)| {
            let row: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
            if row.len() <= FRP {
                return Err(UpstreamError::Processing(format!(
                    "row {} has {} columns, expected at least {}",
                    i + 1,
                    row.len(),
                    FRP + 1
                )));
            }
            Ok(FireRecord {
                latitude: row[LATITUDE].into(),
                longitude: row[LONGITUDE].into(),
                bright_ti4: row[BRIGHT_TI4].into(),
                acq_date: row[ACQ_DATE].into(),
                frp: row[FRP].into(),
            })
        })
        .collect()
}

pub async fn fetch_fires(
    http: &Client,
    base: &str,
    key: &str,
    query: &FireRequest,
) -> Result<FireBatch, UpstreamError> {
    let url = country_url(base, key, query);
    // The map key is part of the path; keep it out of the logs.
    debug!(
        source = %query.source,
        country = %query.country,
        day_range = %query.day_range,
        "requesting FIRMS country CSV"
    );

    let text = http
        .get(&url)
        .timeout(TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let fires = parse_csv(&text, query.display_number)?;
    info!(count = fires.len(), "fire data fetched");
    Ok(fires)
}
