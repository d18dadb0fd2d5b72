//! Extractor for the address of the client that sent a request

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use hyper::HeaderMap;
use thiserror::Error;

use crate::http::models::{DynHttpError, HttpError};

/// Header set by proxies containing the chain of client addresses
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// Header set by proxies containing the client address
const REAL_IP_HEADER: &str = "x-real-ip";

/// Extension marking whether forwarding headers from a reverse
/// proxy should be trusted
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseProxy(pub bool);

/// Address of the client, taken from the forwarding headers when behind
/// a reverse proxy otherwise from the connection
pub struct SourceAddr(pub IpAddr);

#[derive(Debug, Error)]
#[error("Unable to determine client address")]
pub struct SourceAddrError;

impl HttpError for SourceAddrError {}

impl<S> FromRequestParts<S> for SourceAddr
where
    S: Send + Sync,
{
    type Rejection = DynHttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let reverse_proxy = parts
            .extensions
            .get::<ReverseProxy>()
            .is_some_and(|value| value.0);

        if reverse_proxy && let Some(addr) = forwarded_addr(&parts.headers) {
            return Ok(Self(addr));
        }

        let ConnectInfo(addr) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|_| SourceAddrError)?;

        Ok(Self(addr.ip()))
    }
}

/// Finds the original client address from the proxy headers, the first
/// entry of `X-Forwarded-For` is the client
fn forwarded_addr(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded: Option<IpAddr> = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse().ok());

    forwarded.or_else(|| {
        headers
            .get(REAL_IP_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    })
}
