use axum::Json;

use crate::http::models::data::{EndpointInfo, IndexResponse};

static ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo {
        method: "POST",
        path: "/data",
        description: "Submit a sensor reading (temperature, humidity, dew_point, wet_bulb)",
    },
    EndpointInfo {
        method: "GET",
        path: "/data",
        description: "Most recent readings, oldest first",
    },
];

/// GET /
///
/// Describes the service and the endpoints it provides
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Sensor data relay is running",
        endpoints: ENDPOINTS,
    })
}
