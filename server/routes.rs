use std::io::Cursor;
use std::time::Instant;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> Response<Cursor<Vec<u8>>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            log::error!("failed to serialize response body: {}", e);
            (500, br#"{"error":"internal server error"}"#.to_vec())
        }
    };
    let mut response = Response::from_data(bytes).with_status_code(StatusCode(status));
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    response
}

pub fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    json_response(status, &ErrorBody { error: message })
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    error_response(404, "not found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and writes the response back on the same connection.
pub fn dispatch(mut request: Request, state: SharedState) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("");

    let response = match (method.clone(), path) {
        (Method::Post, "/detect-color") => handlers::detect::handle(&mut request, &state),
        (Method::Get, "/health") => handlers::health::handle(&state),
        _ => not_found(),
    };

    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status_code().0,
        started.elapsed().as_millis()
    );
    if let Err(e) = request.respond(response) {
        log::warn!("failed to send response for {} {}: {}", method, path, e);
    }
}
