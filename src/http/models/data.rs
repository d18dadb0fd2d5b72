use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;
use validator::Validate;

use crate::{
    http::models::HttpError,
    store::{Measurement, SensorReading, SensorRecord, StoreError},
};

/// Payload received on the ingest endpoint. Only presence of the
/// measurements is checked, their values are passed through as-is.
/// A `null` measurement counts as missing.
#[skip_serializing_none]
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ReadingPayload {
    #[validate(required)]
    pub temperature: Option<Measurement>,
    #[validate(required)]
    pub humidity: Option<Measurement>,
    #[validate(required)]
    pub dew_point: Option<Measurement>,
    #[validate(required)]
    pub wet_bulb: Option<Measurement>,
    /// Any other fields sent by the device, echoed back but never stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReadingPayload {
    /// Creates the reading to store from the payload, extra
    /// fields are dropped
    pub fn reading(&self) -> Option<SensorReading> {
        Some(SensorReading {
            temperature: self.temperature.clone()?,
            humidity: self.humidity.clone()?,
            dew_point: self.dew_point.clone()?,
            wet_bulb: self.wet_bulb.clone()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    /// The payload as it was received
    pub received_data: ReadingPayload,
}

/// Response for the query endpoint, an empty store is reported
/// with a message rather than an empty list
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DataResponse {
    Records { data: Vec<SensorRecord> },
    Empty { message: &'static str },
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub endpoints: &'static [EndpointInfo],
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Failures from the store while serving the data endpoints
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to save data")]
    Save(#[source] StoreError),
    #[error("Failed to fetch data")]
    Fetch(#[source] StoreError),
}

impl DataError {
    fn store_error(&self) -> &StoreError {
        match self {
            DataError::Save(err) | DataError::Fetch(err) => err,
        }
    }
}

impl HttpError for DataError {
    fn log(&self) {
        let err = self.store_error();
        match err {
            StoreError::Rejected { status, .. } if status.is_client_error() => {
                warn!("{self}: {err}")
            }
            _ => error!("{self}: {err}"),
        }
    }

    fn details(&self) -> Option<String> {
        Some(self.store_error().describe().to_string())
    }
}
