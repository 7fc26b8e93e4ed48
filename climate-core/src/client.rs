use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::{
    config::BackendConfig,
    error::FetchError,
    form::{ClimateQuery, FireQuery, SlickQuery},
    model::{ClimateForecast, Envelope, FireRecord, SlickRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointId {
    Climate,
    Fire,
    Slick,
}

impl EndpointId {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointId::Climate => "climate",
            EndpointId::Fire => "fire",
            EndpointId::Slick => "slick",
        }
    }

    /// Route on the backend.
    pub fn path(&self) -> &'static str {
        match self {
            EndpointId::Climate => "/climate_data",
            EndpointId::Fire => "/fire_data",
            EndpointId::Slick => "/spill_data_oil",
        }
    }

    pub const fn all() -> &'static [EndpointId] {
        &[EndpointId::Climate, EndpointId::Fire, EndpointId::Slick]
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EndpointId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "climate" => Ok(EndpointId::Climate),
            "fire" => Ok(EndpointId::Fire),
            "slick" => Ok(EndpointId::Slick),
            _ => Err(anyhow::anyhow!(
                "Unknown endpoint '{value}'. Supported endpoints: climate, fire, slick."
            )),
        }
    }
}

/// Source of the three payloads. The dashboard only talks to this trait.
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    async fn climate(&self, query: &ClimateQuery) -> Result<Envelope<ClimateForecast>, FetchError>;

    async fn fires(&self, query: &FireQuery) -> Result<Envelope<Vec<FireRecord>>, FetchError>;

    async fn slicks(&self, query: &SlickQuery) -> Result<Envelope<Vec<SlickRecord>>, FetchError>;
}

/// HTTP client for the backend's JSON endpoints. One GET per call, no retry.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: EndpointId,
        pairs: &[(&'static str, &str)],
    ) -> Result<Envelope<T>, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(%endpoint, %url, ?pairs, "sending request");

        let transport = |source| FetchError::Transport {
            endpoint: endpoint.as_str(),
            source,
        };

        let res = self.http.get(&url).query(pairs).send().await.map_err(transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.as_str(),
                status,
            });
        }

        let body = res.bytes().await.map_err(transport)?;
        let envelope = serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            endpoint: endpoint.as_str(),
            source,
        })?;

        info!(%endpoint, bytes = body.len(), "response received");
        Ok(envelope)
    }
}

#[async_trait]
impl DataSource for BackendClient {
    async fn climate(&self, query: &ClimateQuery) -> Result<Envelope<ClimateForecast>, FetchError> {
        self.get(EndpointId::Climate, &query.query_pairs()).await
    }

    async fn fires(&self, query: &FireQuery) -> Result<Envelope<Vec<FireRecord>>, FetchError> {
        self.get(EndpointId::Fire, &query.query_pairs()).await
    }

    async fn slicks(&self, query: &SlickQuery) -> Result<Envelope<Vec<SlickRecord>>, FetchError> {
        self.get(EndpointId::Slick, &query.query_pairs()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{self, FormFields};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[test]
    fn endpoint_id_as_str_roundtrip() {
        for id in EndpointId::all() {
            let parsed = EndpointId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_endpoint_error() {
        let err = EndpointId::try_from("weather").unwrap_err();
        assert!(err.to_string().contains("Unknown endpoint"));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let client = BackendClient::new("http://127.0.0.1:5000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
    }

    #[tokio::test]
    async fn fires_sends_every_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fire_data"))
            .and(query_param("country", "USA"))
            .and(query_param("source", "VIIRS_SNPP_NRT"))
            .and(query_param("day_range", "10"))
            .and(query_param("display_number", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Global fire data fetched successfully",
                "data": [{ "latitude": "1", "longitude": "2", "bright_ti4": "3",
                           "acq_date": "2024-10-01", "frp": "4" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let query = FireQuery::from_form(&FormFields::new());
        let env = client.fires(&query).await.unwrap();

        assert_eq!(env.data.len(), 1);
        assert_eq!(env.message.as_deref(), Some("Global fire data fetched successfully"));
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/climate_data"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let query = ClimateQuery::from_form(
            &FormFields::new().with(form::LATITUDE, "1").with(form::LONGITUDE, "2"),
        )
        .unwrap();

        let err = client.climate(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { endpoint: "climate", status } if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/spill_data_oil"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "nope" })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri());
        let query = SlickQuery::from_form(
            &FormFields::new()
                .with(form::BBOX, "1,2,3,4")
                .with(form::START_DATE, "a")
                .with(form::END_DATE, "b")
                .with(form::MIN_CONFIDENCE, "0.9"),
        )
        .unwrap();

        let err = client.slicks(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { endpoint: "slick", .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = BackendClient::new(format!("http://127.0.0.1:{port}"));
        let query = FireQuery::from_form(&FormFields::new());

        let err = client.fires(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { endpoint: "fire", .. }));
    }
}
