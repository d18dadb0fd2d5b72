use axum::{Extension, Json};
use log::{debug, info, warn};
use validator::ValidationErrors;

use crate::{
    http::{
        middleware::{
            json_validated::{JsonValidated, ValidationError},
            source_addr::SourceAddr,
        },
        models::{
            DynHttpError, HttpResult,
            data::{DataError, DataResponse, IngestResponse, ReadingPayload},
        },
    },
    store::SharedStore,
};

/// Number of readings returned by [get_data]
pub const RECENT_LIMIT: usize = 100;

/// POST /data
///
/// Stores a single reading sent by a sensor device, the received
/// payload is echoed back on success
pub async fn ingest(
    Extension(store): Extension<SharedStore>,
    SourceAddr(addr): SourceAddr,
    payload: Result<JsonValidated<ReadingPayload>, DynHttpError>,
) -> HttpResult<IngestResponse> {
    let JsonValidated(payload) =
        payload.inspect_err(|_| warn!("Rejected reading from {addr}"))?;

    info!("Received reading from {addr}");
    debug!(
        "Reading from {addr}: {}",
        serde_json::to_string(&payload).unwrap_or_default()
    );

    let reading = payload
        .reading()
        .ok_or_else(|| ValidationError::MissingFields(ValidationErrors::new()))?;

    if let Err(err) = store.insert(&reading).await {
        warn!("Failed to save reading from {addr}");
        return Err(DataError::Save(err).into());
    }

    info!("Saved reading from {addr}");

    Ok(Json(IngestResponse {
        message: "Data saved successfully",
        received_data: payload,
    }))
}

/// GET /data
///
/// Obtains the most recent readings in chronological order (oldest first)
pub async fn get_data(Extension(store): Extension<SharedStore>) -> HttpResult<DataResponse> {
    let mut records = store
        .query_recent(RECENT_LIMIT)
        .await
        .map_err(DataError::Fetch)?;

    if records.is_empty() {
        return Ok(Json(DataResponse::Empty {
            message: "No data available",
        }));
    }

    // Store provides newest first
    records.truncate(RECENT_LIMIT);
    records.reverse();

    Ok(Json(DataResponse::Records { data: records }))
}
