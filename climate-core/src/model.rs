use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::render::js_number;

/// JSON envelope returned by every backend endpoint. `data` is the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,
}

impl<T> Envelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data,
            number_matched: None,
            number_returned: None,
        }
    }
}

/// Any JSON scalar, shown the way a browser would stringify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Scalar(pub Value);

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar(Value::String(value.to_string()))
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        Scalar(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => write!(f, "{i}"),
                (_, Some(u), _) => write!(f, "{u}"),
                (_, _, Some(x)) => f.write_str(&js_number(x)),
                _ => write!(f, "{n}"),
            },
            Value::Null => f.write_str("null"),
            other => write!(f, "{other}"),
        }
    }
}

/// Open-Meteo daily forecast as relayed by `/climate_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateForecast {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub timezone: String,
    pub daily: DailySeries,
    pub daily_units: DailyUnits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    /// `None` where the upstream has no value for that day.
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUnits {
    pub temperature_2m_max: String,
    pub temperature_2m_min: String,
}

/// One satellite fire detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireRecord {
    pub latitude: Scalar,
    pub longitude: Scalar,
    pub bright_ti4: Scalar,
    pub acq_date: Scalar,
    pub frp: Scalar,
}

/// One oil slick detection. `area` and `machine_confidence` must be numeric
/// for the record to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlickRecord {
    pub id: Scalar,
    pub area: Scalar,
    pub machine_confidence: Scalar,
    pub slick_timestamp: Scalar,
    pub classification: Scalar,
}
