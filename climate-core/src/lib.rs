//! Core library for the `climate` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - Form input, payload models and HTML rendering for the three data views
//!   (climate forecast, wildfire detections, oil slick detections)
//! - The backend client and the dashboard adapter that drives the display regions
//! - The backend proxy server in front of Open-Meteo, NASA FIRMS and Cerulean
//!
//! It is used by `climate-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod form;
pub mod model;
pub mod render;
pub mod server;
pub mod upstream;

pub use client::{BackendClient, DataSource, EndpointId};
pub use config::Config;
pub use dashboard::{Dashboard, Outcome, WritePolicy};
pub use error::{FetchError, InputError, RenderError};
pub use form::FormFields;
pub use model::{ClimateForecast, Envelope, FireRecord, Scalar, SlickRecord};
