use hyper::{Method, header::HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{ConfigurationError, CorsConfig};

pub mod middleware;
pub mod models;
pub mod routes;

/// Creates the cross-origin layer from the config, all origins
/// are allowed when no origins are configured
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigurationError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|_| ConfigurationError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
