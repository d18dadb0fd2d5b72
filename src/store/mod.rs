//! Store client abstraction over the hosted database that owns the
//! persisted sensor readings

use std::sync::Arc;

use async_trait::async_trait;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod postgrest;

/// Name of the table readings are persisted into
pub const SENSOR_TABLE: &str = "sensor_data";

/// Measurements are forwarded as received, the store owns their
/// column types
pub type Measurement = Value;

/// Shared handle to the store client, safe for concurrent use
/// across requests
pub type SharedStore = Arc<dyn SensorStore>;

/// The four measurements that make up a single reading, this is exactly
/// what gets written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: Measurement,
    pub humidity: Measurement,
    pub dew_point: Measurement,
    pub wet_bulb: Measurement,
}

/// Row as returned by the store, every column is passed through
/// untouched since ordering is done by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(flatten)]
    pub reading: SensorReading,
    /// Assigned by the store on insert, kept in the store's format
    pub created_at: Value,
    /// Remaining columns such as `id`
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

/// Operations the relay needs from the store
#[async_trait]
pub trait SensorStore: Send + Sync + 'static {
    /// Inserts a single reading
    async fn insert(&self, reading: &SensorReading) -> Result<(), StoreError>;

    /// Obtains at most `limit` records ordered by `created_at`
    /// newest first
    async fn query_recent(&self, limit: usize) -> Result<Vec<SensorRecord>, StoreError>;
}

/// Errors from calls against the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request couldn't be completed (connect failure, timeout, ...)
    #[error("Store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store responded with a non success status
    #[error("Store responded with {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    /// Response body didn't match the expected row format
    #[error("Store response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// Description of the failure that is safe to show to callers,
    /// the full error is only ever logged
    pub fn describe(&self) -> &'static str {
        match self {
            StoreError::Request(err) if err.is_timeout() => "Store request timed out",
            StoreError::Request(err) if err.is_connect() => "Store unreachable",
            StoreError::Request(err) if err.is_decode() => "Store returned an unexpected response",
            StoreError::Request(_) => "Store request failed",
            StoreError::Rejected { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
            {
                "Store rejected the credentials"
            }
            StoreError::Rejected { status, .. } if status.is_client_error() => {
                "Store rejected the request"
            }
            StoreError::Rejected { .. } => "Store encountered an internal error",
            StoreError::Decode(_) => "Store returned an unexpected response",
        }
    }
}

#[cfg(test)]
mod test {
    use hyper::StatusCode;
    use serde_json::json;

    use super::{SensorRecord, StoreError};

    #[test]
    fn test_record_from_row() {
        let row = json!({
            "id": 7,
            "temperature": 25.5,
            "humidity": 60,
            "dew_point": 17.2,
            "wet_bulb": 19.8,
            "created_at": "2024-05-01T12:30:00.123456+00:00"
        });

        let record: SensorRecord = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(record.columns["id"], json!(7));
        assert_eq!(record.reading.humidity, json!(60));
        assert_eq!(record.reading.temperature, json!(25.5));

        // Timestamp is not reformatted
        assert_eq!(serde_json::to_value(&record).unwrap(), row);
    }

    /// Tables with UUID keys, naive timestamps and extra columns
    #[test]
    fn test_record_other_layouts() {
        let row = json!({
            "id": "3f1c2a9e-5b7d-4c1e-9a0f-2d8e6b4c1a77",
            "temperature": 1,
            "humidity": 2,
            "dew_point": 3,
            "wet_bulb": 4,
            "created_at": "2024-05-01T12:30:00.123456",
            "device": "porch"
        });

        let record: SensorRecord = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(record.created_at, json!("2024-05-01T12:30:00.123456"));
        assert_eq!(record.columns["device"], json!("porch"));
        assert!(!record.columns.contains_key("temperature"));
        assert_eq!(serde_json::to_value(&record).unwrap(), row);
    }

    /// Rejections must not leak the store's own error text
    #[test]
    fn test_rejection_descriptions() {
        let secret = "relation \"sensor_data\" does not exist, key=abc".to_string();

        let auth = StoreError::Rejected {
            status: StatusCode::UNAUTHORIZED,
            body: secret.clone(),
        };
        assert_eq!(auth.describe(), "Store rejected the credentials");

        let bad = StoreError::Rejected {
            status: StatusCode::BAD_REQUEST,
            body: secret.clone(),
        };
        assert_eq!(bad.describe(), "Store rejected the request");

        let internal = StoreError::Rejected {
            status: StatusCode::BAD_GATEWAY,
            body: secret.clone(),
        };
        assert_eq!(internal.describe(), "Store encountered an internal error");

        for err in [auth, bad, internal] {
            assert!(!err.describe().contains(&secret));
        }
    }

    #[test]
    fn test_decode_description() {
        let err = serde_json::from_str::<SensorRecord>("[]").unwrap_err();
        assert_eq!(
            StoreError::Decode(err).describe(),
            "Store returned an unexpected response"
        );
    }
}
