use reqwest::StatusCode;
use thiserror::Error;

/// Required form input was absent. Detected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("All fields are required.")]
    AllFieldsRequired,

    /// Carries the display labels of the empty fields, in form order.
    #[error("Please fill in the following fields: {}.", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// A request to the backend did not produce a usable payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint} request failed with status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("{endpoint} request could not be sent: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} response was not the expected JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A decoded payload that still cannot be shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("record {index}: `{field}` is not a number")]
    NotANumber { field: &'static str, index: usize },
}
