//! Named form inputs and the per-operation queries built from them.
//!
//! Values are only trimmed and defaulted here. Nothing is parsed as a number
//! or a date; the backend receives exactly what the user typed.

use std::collections::BTreeMap;

use crate::error::InputError;

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

pub const COUNTRY: &str = "country";
pub const SOURCE: &str = "source";
pub const DAY_RANGE: &str = "dayRange";
pub const DISPLAY_NUMBER: &str = "displayNumber";

pub const BBOX: &str = "bbox";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const MIN_CONFIDENCE: &str = "min_confidence";
pub const LIMIT: &str = "limit";

pub const DEFAULT_COUNTRY: &str = "USA";
pub const DEFAULT_SOURCE: &str = "VIIRS_SNPP_NRT";
pub const DEFAULT_DAY_RANGE: &str = "10";

/// Raw values of the page's input elements, keyed by element id.
/// A field that was never filled in reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    values: BTreeMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Set `name` only when a value was supplied.
    pub fn set_opt(&mut self, name: &str, value: Option<String>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn trimmed(&self, name: &str) -> &str {
        self.get(name).trim()
    }

    pub fn or_default<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.trimmed(name) {
            "" => default,
            value => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimateQuery {
    pub latitude: String,
    pub longitude: String,
}

impl ClimateQuery {
    pub fn from_form(form: &FormFields) -> Result<Self, InputError> {
        let latitude = form.trimmed(LATITUDE);
        let longitude = form.trimmed(LONGITUDE);

        if latitude.is_empty() || longitude.is_empty() {
            return Err(InputError::AllFieldsRequired);
        }

        Ok(Self {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        })
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        vec![("latitude", &self.latitude), ("longitude", &self.longitude)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireQuery {
    pub country: String,
    pub source: String,
    pub day_range: String,
    /// Sent as typed, possibly empty.
    pub display_number: String,
}

impl FireQuery {
    /// Every fire field has a fallback, so this never rejects input.
    pub fn from_form(form: &FormFields) -> Self {
        Self {
            country: form.or_default(COUNTRY, DEFAULT_COUNTRY).to_string(),
            source: form.or_default(SOURCE, DEFAULT_SOURCE).to_string(),
            day_range: form.or_default(DAY_RANGE, DEFAULT_DAY_RANGE).to_string(),
            display_number: form.trimmed(DISPLAY_NUMBER).to_string(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("country", &self.country),
            ("source", &self.source),
            ("day_range", &self.day_range),
            ("display_number", &self.display_number),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlickQuery {
    pub bbox: String,
    pub start_date: String,
    pub end_date: String,
    pub min_confidence: String,
    pub limit: String,
}

/// Required slick fields and the labels used when they are missing.
const SLICK_REQUIRED: [(&str, &str); 4] = [
    (BBOX, "Bounding Box"),
    (START_DATE, "Start Date"),
    (END_DATE, "End Date"),
    (MIN_CONFIDENCE, "Min Confidence"),
];

impl SlickQuery {
    pub fn from_form(form: &FormFields) -> Result<Self, InputError> {
        let missing: Vec<&'static str> = SLICK_REQUIRED
            .iter()
            .filter(|(field, _)| form.trimmed(field).is_empty())
            .map(|(_, label)| *label)
            .collect();

        if !missing.is_empty() {
            return Err(InputError::MissingFields(missing));
        }

        Ok(Self {
            bbox: form.trimmed(BBOX).to_string(),
            start_date: form.trimmed(START_DATE).to_string(),
            end_date: form.trimmed(END_DATE).to_string(),
            min_confidence: form.trimmed(MIN_CONFIDENCE).to_string(),
            limit: form.trimmed(LIMIT).to_string(),
        })
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("bbox", &self.bbox),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("min_confidence", &self.min_confidence),
            ("limit", &self.limit),
        ]
    }
}
