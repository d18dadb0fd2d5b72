//! Store client for the hosted database's REST query interface

use async_trait::async_trait;
use hyper::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use log::debug;
use reqwest::{Client, Response, Url};

use super::{SENSOR_TABLE, SensorReading, SensorRecord, SensorStore, StoreError};
use crate::config::{ConfigurationError, StoreConfig, StoreCredentials};

/// Header the access key is provided through
const API_KEY_HEADER: &str = "apikey";
/// Header for asking the store not to echo back inserted rows
const PREFER_HEADER: &str = "prefer";

/// Store client talking to the REST endpoint of the sensor table
pub struct PostgrestStore {
    client: Client,
    /// Full URL of the table endpoint
    endpoint: Url,
}

impl PostgrestStore {
    pub fn new(
        credentials: &StoreCredentials,
        config: &StoreConfig,
    ) -> Result<Self, ConfigurationError> {
        let endpoint = table_endpoint(&credentials.url, SENSOR_TABLE)?;

        let mut api_key = HeaderValue::from_str(&credentials.key)
            .map_err(|_| ConfigurationError::InvalidStoreKey)?;
        api_key.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.key))
            .map_err(|_| ConfigurationError::InvalidStoreKey)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }
}

/// Creates the REST endpoint URL for `table` relative to the store URL,
/// any path on the store URL is kept
fn table_endpoint(base: &Url, table: &str) -> Result<Url, ConfigurationError> {
    let base = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/rest/v1/{table}"))
        .map_err(|err| ConfigurationError::InvalidStoreUrl(err.to_string()))
}

/// Converts non success responses into [StoreError::Rejected]
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected { status, body })
}

#[async_trait]
impl SensorStore for PostgrestStore {
    async fn insert(&self, reading: &SensorReading) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(PREFER_HEADER, "return=minimal")
            .json(reading)
            .send()
            .await?;

        let response = check_status(response).await?;
        debug!("Store accepted reading ({})", response.status());
        Ok(())
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<SensorRecord>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        let records: Vec<SensorRecord> = serde_json::from_slice(&bytes)?;
        Ok(records)
    }
}
