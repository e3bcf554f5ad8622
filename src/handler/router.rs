//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route matching,
//! access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, LOCATION, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::redirect::{RequestContext, DEFAULT_REDIRECT_URL};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Only the head is needed; no route reads a body
    let (parts, _) = req.into_parts();
    let is_head = parts.method == Method::HEAD;

    let response = match check_http_method(&parts.method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => route_request(&parts, &state, is_head).await,
    };
    let response = http::with_server_name(response, &state.config.http.server_name);

    if state.config.logging.access_log {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path and configuration
async fn route_request(
    req: &Parts,
    state: &AppState,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let path = req.uri.path();
    let health = &state.config.health;

    // Health check endpoints (highest priority, always fast)
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return http::build_health_response("ok");
    }

    if path == state.config.redirect.path {
        return serve_login_redirect(req, state, is_head).await;
    }

    http::build_404_response()
}

/// Resolve the post-login redirect and answer with 302
async fn serve_login_redirect(
    req: &Parts,
    state: &AppState,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let ctx = RequestContext::from_parts(&req.uri, &req.headers);
    let target = state.resolver.resolve(&ctx).await;

    // Decoded query values may carry bytes a header cannot hold
    if HeaderValue::from_str(&target).is_err() {
        logger::log_warning(&format!(
            "Resolved redirect {target:?} is not a valid Location, using {DEFAULT_REDIRECT_URL}"
        ));
        return http::build_redirect_response(DEFAULT_REDIRECT_URL, is_head);
    }

    http::build_redirect_response(&target, is_head)
}

fn header_string(req: &Parts, name: hyper::header::HeaderName) -> Option<String> {
    req.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = match req.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.referer = header_string(req, REFERER);
    entry.user_agent = header_string(req, USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
