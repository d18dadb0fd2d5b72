use axum::{
    Extension, Router,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{http::middleware::source_addr::ReverseProxy, store::SharedStore};

mod data;
mod index;

/// Creates the API router, the store handle is shared across
/// all requests
pub fn router(store: SharedStore, cors: CorsLayer, reverse_proxy: bool) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/data", get(data::get_data).post(data::ingest))
        .layer(Extension(store))
        .layer(Extension(ReverseProxy(reverse_proxy)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
