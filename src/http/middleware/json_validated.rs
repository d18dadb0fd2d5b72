//! JSON extractor that validates the underlying value
//! is valid using [validator::Validate]

use axum::extract::{FromRequest, Request};
use bytes::Bytes;
use hyper::StatusCode;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::http::models::{DynHttpError, HttpError};

/// [axum::Json] extractor alternative that rejects empty payloads and
/// validates the deserialized value. The content type header is not
/// checked as devices frequently omit it
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValidated<T: Validate>(pub T);

/// Error types that could be returned on rejection
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Unable to load the content
    #[error("Failed to read request body")]
    BadContent,

    /// Body was missing, `null` or an empty object
    #[error("No data received")]
    Empty,

    /// Failed to deserialize
    #[error("Invalid JSON payload")]
    InvalidJson(serde_path_to_error::Error<serde_json::Error>),

    /// Failed validation
    #[error("Missing required fields")]
    MissingFields(validator::ValidationErrors),
}

impl HttpError for ValidationError {
    fn log(&self) {
        match self {
            ValidationError::InvalidJson(err) => warn!("{self}: {err}"),
            ValidationError::MissingFields(err) => warn!("{self}: {err}"),
            _ => warn!("{self}"),
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl<T, S> FromRequest<S> for JsonValidated<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = DynHttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Get request bytes
        let bytes = Bytes::from_request(req, state).await.map_err(|err| {
            error!("Failed to get request bytes: {}", err);
            ValidationError::BadContent
        })?;

        if bytes.trim_ascii().is_empty() {
            return Err(ValidationError::Empty.into());
        }

        debug!("Incoming JSON: {:?}", bytes);

        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        let value: Value =
            serde_path_to_error::deserialize(deserializer).map_err(ValidationError::InvalidJson)?;

        match &value {
            Value::Null => return Err(ValidationError::Empty.into()),
            Value::Object(map) if map.is_empty() => return Err(ValidationError::Empty.into()),
            _ => {}
        }

        // Deserialize value
        let value: T =
            serde_path_to_error::deserialize(value).map_err(ValidationError::InvalidJson)?;

        // Validate deserialized value
        value.validate().map_err(ValidationError::MissingFields)?;

        Ok(JsonValidated(value))
    }
}
