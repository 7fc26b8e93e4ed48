//! SkyTruth Cerulean oil slick detections (OGC API Features).

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use urlencoding::encode;

use super::UpstreamError;
use crate::model::{Scalar, SlickRecord};

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlickRequest {
    pub bbox: String,
    pub start_date: String,
    pub end_date: String,
    pub min_confidence: String,
    pub limit: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlickBatch {
    pub slicks: Vec<SlickRecord>,
    pub number_matched: Option<u64>,
    pub number_returned: Option<u64>,
}

/// Items query sorted by descending confidence and filtered to at least
/// `min_confidence`. Spaces in the bounding box are dropped.
pub fn items_url(base: &str, query: &SlickRequest) -> String {
    let bbox: String = query.bbox.chars().filter(|c| *c != ' ').collect();
    let filter = format!("machine_confidence GTE {}", query.min_confidence);

    format!(
        "{base}/collections/public.slick_plus/items?limit={}&bbox={}&datetime={}/{}\
         &sortby=-machine_confidence&filter={}",
        encode(&query.limit),
        encode(&bbox),
        encode(&query.start_date),
        encode(&query.end_date),
        encode(&filter),
    )
}

fn property(properties: &Value, key: &str) -> Scalar {
    properties.get(key).cloned().unwrap_or(Value::Null).into()
}

/// Pull the displayed properties out of a feature collection.
pub fn parse_features(collection: &Value) -> Result<SlickBatch, UpstreamError> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| UpstreamError::Processing("response has no features list".to_string()))?;

    let slicks = features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let props = feature
                .get("properties")
                .filter(|p| p.is_object())
                .ok_or_else(|| {
                    UpstreamError::Processing(format!("feature {i} has no properties"))
                })?;
            Ok(SlickRecord {
                id: property(props, "id"),
                area: property(props, "area"),
                machine_confidence: property(props, "machine_confidence"),
                slick_timestamp: property(props, "slick_timestamp"),
                classification: property(props, "cls_long_name"),
            })
        })
        .collect::<Result<Vec<_>, UpstreamError>>()?;

    Ok(SlickBatch {
        slicks,
        number_matched: collection.get("numberMatched").and_then(Value::as_u64),
        number_returned: collection.get("numberReturned").and_then(Value::as_u64),
    })
}

pub async fn fetch_slicks(
    http: &Client,
    base: &str,
    query: &SlickRequest,
) -> Result<SlickBatch, UpstreamError> {
    let url = items_url(base, query);
    debug!(%url, "constructed Cerulean URL");

    let collection: Value = http
        .get(&url)
        .timeout(TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let batch = parse_features(&collection)?;
    info!(
        count = batch.slicks.len(),
        matched = ?batch.number_matched,
        "slick data fetched"
    );
    Ok(batch)
}
