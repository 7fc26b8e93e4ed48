//! The request/render adapter: one operation per page action.
//!
//! Each operation shows a "Fetching..." notice, checks its inputs, makes one
//! backend request and replaces the notice with a table or a fixed error
//! text. Failures are logged and end there; nothing is returned as an error.

use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    client::DataSource,
    display::{DisplaySlot, SlotSnapshot, SlotWriter},
    error::InputError,
    form::{ClimateQuery, FireQuery, FormFields, SlickQuery},
    render::{self, render_climate, render_fires, render_page, render_slicks},
};

pub const CLIMATE_REGION: &str = "externalDataDisplay";
pub const FIRE_REGION: &str = "fireDataDisplay";
pub const SLICK_REGION: &str = "slickDataDisplay";

/// How overlapping invocations on the same region are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Invocations run independently; whichever response resolves last is
    /// what the region ends up showing.
    #[default]
    LastResolved,
    /// An invocation owns its region from the first notice to the final
    /// render, so invocations complete in the order they claimed it.
    Exclusive,
}

/// Result of one operation, for callers that care. The region already shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Rendered { rows: usize },
    InvalidInput(InputError),
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    policy: WritePolicy,
    climate: DisplaySlot,
    fire: DisplaySlot,
    slick: DisplaySlot,
}

impl Dashboard {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_policy(source, WritePolicy::default())
    }

    pub fn with_policy(source: Arc<dyn DataSource>, policy: WritePolicy) -> Self {
        Self {
            source,
            policy,
            climate: DisplaySlot::new(),
            fire: DisplaySlot::new(),
            slick: DisplaySlot::new(),
        }
    }

    async fn writer(&self, slot: &DisplaySlot) -> SlotWriter {
        match self.policy {
            WritePolicy::LastResolved => slot.shared_writer(),
            WritePolicy::Exclusive => slot.exclusive_writer().await,
        }
    }

    pub async fn fetch_climate(&self, form: &FormFields) -> Outcome {
        let mut out = self.writer(&self.climate).await;
        out.show_text(render::FETCHING_CLIMATE).await;

        let query = match ClimateQuery::from_form(form) {
            Ok(query) => query,
            Err(err) => return reject(&mut out, err).await,
        };

        match self.source.climate(&query).await {
            Ok(envelope) => {
                let rows = envelope.data.daily.time.len();
                out.show_html(render_climate(&envelope.data)).await;
                Outcome::Rendered { rows }
            }
            Err(err) => fail(&mut out, "climate", render::ERROR_CLIMATE, err).await,
        }
    }

    pub async fn fetch_fires(&self, form: &FormFields) -> Outcome {
        let mut out = self.writer(&self.fire).await;
        out.show_text(render::FETCHING_FIRE).await;

        let query = FireQuery::from_form(form);

        match self.source.fires(&query).await {
            Ok(envelope) => {
                let rows = envelope.data.len();
                out.show_html(render_fires(&envelope)).await;
                Outcome::Rendered { rows }
            }
            Err(err) => fail(&mut out, "fire", render::ERROR_FIRE, err).await,
        }
    }

    pub async fn fetch_slicks(&self, form: &FormFields) -> Outcome {
        let mut out = self.writer(&self.slick).await;
        out.show_text(render::FETCHING_SLICK).await;

        let query = match SlickQuery::from_form(form) {
            Ok(query) => query,
            Err(err) => return reject(&mut out, err).await,
        };

        let rendered = match self.source.slicks(&query).await {
            Ok(envelope) => render_slicks(&envelope).map(|html| (html, envelope.data.len())),
            Err(err) => return fail(&mut out, "slick", render::ERROR_SLICK, err).await,
        };

        match rendered {
            Ok((html, rows)) => {
                out.show_html(html).await;
                Outcome::Rendered { rows }
            }
            Err(err) => fail(&mut out, "slick", render::ERROR_SLICK, err).await,
        }
    }

    pub async fn climate_region(&self) -> SlotSnapshot {
        self.climate.snapshot().await
    }

    pub async fn fire_region(&self) -> SlotSnapshot {
        self.fire.snapshot().await
    }

    pub async fn slick_region(&self) -> SlotSnapshot {
        self.slick.snapshot().await
    }

    /// The whole page with its three regions.
    pub async fn page(&self) -> String {
        render_page(&[
            (CLIMATE_REGION, self.climate_region().await),
            (FIRE_REGION, self.fire_region().await),
            (SLICK_REGION, self.slick_region().await),
        ])
    }
}

async fn reject(out: &mut SlotWriter, err: InputError) -> Outcome {
    warn!(%err, "request not sent");
    out.show_text(&err.to_string()).await;
    Outcome::InvalidInput(err)
}

async fn fail(
    out: &mut SlotWriter,
    endpoint: &str,
    text: &str,
    err: impl std::error::Error,
) -> Outcome {
    error!(endpoint, error = %err, "fetch failed");
    out.show_text(text).await;
    Outcome::Failed {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::BackendClient, form};
    use serde_json::{Value, json};
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{any, path, query_param},
    };

    fn climate_body(lat: f64, days: usize) -> Value {
        json!({
            "message": "Climate data fetched successfully",
            "data": {
                "latitude": lat, "longitude": -0.12, "elevation": 23.0,
                "timezone": "Europe/London",
                "daily": {
                    "time": (1..=days).map(|d| format!("2024-10-{d:02}")).collect::<Vec<_>>(),
                    "temperature_2m_max": vec![15.5; days],
                    "temperature_2m_min": vec![7.25; days]
                },
                "daily_units": { "temperature_2m_max": "°C", "temperature_2m_min": "°C" }
            }
        })
    }

    fn dashboard(server: &MockServer, policy: WritePolicy) -> Dashboard {
        Dashboard::with_policy(Arc::new(BackendClient::new(server.uri())), policy)
    }

    fn full_slick_form() -> FormFields {
        FormFields::new()
            .with(form::BBOX, "10.9,42.3,19.7,36.1")
            .with(form::START_DATE, "2024-09-01T00:00:00Z")
            .with(form::END_DATE, "2024-10-01T00:00:00Z")
            .with(form::MIN_CONFIDENCE, "0.95")
            .with(form::LIMIT, "10")
    }

    #[tokio::test]
    async fn climate_renders_one_row_per_day() {
        let server = MockServer::start().await;
        Mock::given(path("/climate_data"))
            .and(query_param("latitude", "51.5"))
            .and(query_param("longitude", "-0.12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(climate_body(51.5, 16)))
            .expect(1)
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::LastResolved);
        let form = FormFields::new()
            .with(form::LATITUDE, " 51.5 ")
            .with(form::LONGITUDE, "-0.12");

        assert_eq!(dash.fetch_climate(&form).await, Outcome::Rendered { rows: 16 });

        let region = dash.climate_region().await;
        assert!(region.visible);
        assert_eq!(region.html.matches("<td>15.5 °C</td><td>7.25 °C</td>").count(), 16);
    }

    #[tokio::test]
    async fn missing_input_skips_the_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::LastResolved);

        let outcome = dash.fetch_slicks(&FormFields::new().with(form::LIMIT, "5")).await;
        assert!(matches!(outcome, Outcome::InvalidInput(_)));
        assert_eq!(
            dash.slick_region().await.html,
            "Please fill in the following fields: Bounding Box, Start Date, End Date, Min Confidence."
        );

        let outcome = dash.fetch_climate(&FormFields::new()).await;
        assert_eq!(outcome, Outcome::InvalidInput(InputError::AllFieldsRequired));
        assert_eq!(dash.climate_region().await.html, "All fields are required.");
    }

    #[tokio::test]
    async fn non_ok_response_shows_fixed_error_text() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::LastResolved);
        let climate = FormFields::new()
            .with(form::LATITUDE, "1")
            .with(form::LONGITUDE, "2");

        assert!(matches!(dash.fetch_climate(&climate).await, Outcome::Failed { .. }));
        assert!(matches!(dash.fetch_fires(&FormFields::new()).await, Outcome::Failed { .. }));
        assert!(matches!(dash.fetch_slicks(&full_slick_form()).await, Outcome::Failed { .. }));

        assert_eq!(dash.climate_region().await.html, "Error fetching climate data.");
        assert_eq!(dash.fire_region().await.html, "Error fetching fire data.");
        assert_eq!(dash.slick_region().await.html, "Error fetching oil slick data.");
        assert!(!dash.page().await.contains("<table"));
    }

    #[tokio::test]
    async fn fires_render_one_row_per_record() {
        let server = MockServer::start().await;
        let record = json!({ "latitude": "34.1", "longitude": "-118.2", "bright_ti4": "330.5",
                             "acq_date": "2024-10-01", "frp": "4.2" });
        Mock::given(path("/fire_data"))
            .and(query_param("country", "CAN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Global fire data fetched successfully",
                "data": [record.clone(), record.clone(), record]
            })))
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::LastResolved);
        let outcome = dash
            .fetch_fires(&FormFields::new().with(form::COUNTRY, "CAN"))
            .await;

        assert_eq!(outcome, Outcome::Rendered { rows: 3 });
        let html = dash.fire_region().await.html;
        assert_eq!(
            html.matches("<tr><td>34.1</td><td>-118.2</td><td>330.5</td><td>2024-10-01</td><td>4.2</td></tr>")
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn malformed_slick_record_shows_error_text() {
        let server = MockServer::start().await;
        Mock::given(path("/spill_data_oil"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 1, "area": "big", "machine_confidence": 0.9,
                           "slick_timestamp": "t", "classification": "c" }]
            })))
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::LastResolved);
        let outcome = dash.fetch_slicks(&full_slick_form()).await;

        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert_eq!(dash.slick_region().await.html, "Error fetching oil slick data.");
    }

    /// Request A is slow, request B (issued later) answers at once.
    async fn race(policy: WritePolicy) -> String {
        let server = MockServer::start().await;
        Mock::given(path("/climate_data"))
            .and(query_param("latitude", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(climate_body(1.0, 2))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(path("/climate_data"))
            .and(query_param("latitude", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(climate_body(2.0, 2)))
            .mount(&server)
            .await;

        let dash = dashboard(&server, policy);
        let form_a = FormFields::new().with(form::LATITUDE, "1").with(form::LONGITUDE, "0");
        let form_b = FormFields::new().with(form::LATITUDE, "2").with(form::LONGITUDE, "0");

        let first = {
            let dash = dash.clone();
            tokio::spawn(async move { dash.fetch_climate(&form_a).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let dash = dash.clone();
            tokio::spawn(async move { dash.fetch_climate(&form_b).await })
        };

        first.await.unwrap();
        second.await.unwrap();
        dash.climate_region().await.html
    }

    #[tokio::test]
    async fn last_resolved_response_wins_the_region() {
        // Current behaviour: the stale, slower response overwrites the newer one.
        let html = race(WritePolicy::LastResolved).await;
        assert!(html.contains("Climate Forecast for (1, -0.12)"));
    }

    #[tokio::test]
    async fn exclusive_policy_keeps_invocation_order() {
        let html = race(WritePolicy::Exclusive).await;
        assert!(html.contains("Climate Forecast for (2, -0.12)"));
    }

    #[tokio::test]
    async fn page_is_readable_during_exclusive_fetch() {
        let server = MockServer::start().await;
        Mock::given(path("/climate_data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(climate_body(1.0, 2))
                    .set_delay(Duration::from_millis(1000)),
            )
            .mount(&server)
            .await;

        let dash = dashboard(&server, WritePolicy::Exclusive);
        let pending = {
            let dash = dash.clone();
            let form = FormFields::new().with(form::LATITUDE, "1").with(form::LONGITUDE, "0");
            tokio::spawn(async move { dash.fetch_climate(&form).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let page = tokio::time::timeout(Duration::from_millis(300), dash.page())
            .await
            .expect("page should render while the fetch is in flight");
        assert!(page.contains("Fetching climate data..."));
        assert!(!pending.is_finished());

        assert!(matches!(pending.await.unwrap(), Outcome::Rendered { rows: 2 }));
    }

    #[tokio::test]
    async fn page_contains_all_regions() {
        let server = MockServer::start().await;
        let dash = dashboard(&server, WritePolicy::LastResolved);
        dash.fetch_climate(&FormFields::new()).await;

        let page = dash.page().await;
        assert!(page.contains("<div id=\"externalDataDisplay\">\nAll fields are required.\n</div>"));
        assert!(page.contains("<div id=\"fireDataDisplay\" style=\"display:none\">"));
        assert!(page.contains("<div id=\"slickDataDisplay\" style=\"display:none\">"));
    }
}
