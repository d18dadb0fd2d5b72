//! In-memory store used in place of the hosted store by tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hyper::StatusCode;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use super::{SensorReading, SensorRecord, SensorStore, StoreError};

/// Row held by the store along with the values it orders by
struct StoredRow {
    id: i64,
    created_at: DateTime<Utc>,
    reading: SensorReading,
}

impl StoredRow {
    fn record(&self) -> SensorRecord {
        let mut columns = Map::new();
        columns.insert("id".to_string(), json!(self.id));

        SensorRecord {
            reading: self.reading.clone(),
            created_at: Value::String(
                self.created_at
                    .to_rfc3339_opts(SecondsFormat::Micros, false),
            ),
            columns,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredRow>>,
    /// Every reading passed to insert, including failed ones
    inserts: Mutex<Vec<SensorReading>>,
    /// Status to reject all calls with
    failure: Option<StatusCode>,
}

impl MemoryStore {
    /// Store that rejects every call with `status`
    pub fn failing(status: StatusCode) -> Self {
        Self {
            failure: Some(status),
            ..Default::default()
        }
    }

    /// Seeds rows directly, `created_at` is offset by the given
    /// number of seconds from now so ordering can be controlled
    pub fn seed(&self, readings: impl IntoIterator<Item = (i64, SensorReading)>) {
        let mut rows = self.rows.lock();
        let now = Utc::now();
        for (offset, reading) in readings {
            let id = rows.len() as i64 + 1;
            rows.push(StoredRow {
                id,
                created_at: now + Duration::seconds(offset),
                reading,
            });
        }
    }

    pub fn inserts(&self) -> Vec<SensorReading> {
        self.inserts.lock().clone()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure {
            Some(status) => Err(StoreError::Rejected {
                status,
                body: "permission denied for table sensor_data".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn insert(&self, reading: &SensorReading) -> Result<(), StoreError> {
        self.inserts.lock().push(reading.clone());
        self.check_failure()?;

        let mut rows = self.rows.lock();
        let id = rows.len() as i64 + 1;
        rows.push(StoredRow {
            id,
            created_at: Utc::now(),
            reading: reading.clone(),
        });
        Ok(())
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<SensorRecord>, StoreError> {
        self.check_failure()?;

        let rows = self.rows.lock();
        let mut ordered: Vec<&StoredRow> = rows.iter().collect();
        // Newest first, insertion order breaks timestamp ties
        ordered.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(ordered
            .into_iter()
            .take(limit)
            .map(StoredRow::record)
            .collect())
    }
}

/// Store that ignores the requested limit and returns every row,
/// newest first
pub struct UnboundedStore {
    pub rows: Vec<SensorRecord>,
}

#[async_trait]
impl SensorStore for UnboundedStore {
    async fn insert(&self, _reading: &SensorReading) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query_recent(&self, _limit: usize) -> Result<Vec<SensorRecord>, StoreError> {
        Ok(self.rows.clone())
    }
}
