use std::io::{self, Cursor, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageError;
use serde::{Deserialize, Serialize};
use tiny_http::{Request, Response};

use swatch_nn::{Detection, Error};

use crate::routes::{error_response, json_response};
use crate::state::SharedState;

#[derive(Deserialize)]
struct DetectRequest {
    /// Base64 image bytes, optionally wrapped in a `data:` URL.
    image: String,
}

#[derive(Serialize)]
struct DetectResponse {
    hex: String,
    r: f64,
    g: f64,
    b: f64,
}

impl From<Detection> for DetectResponse {
    fn from(detection: Detection) -> Self {
        DetectResponse { hex: detection.hex, r: detection.r, g: detection.g, b: detection.b }
    }
}

/// Failures that end a `/detect-color` request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Detection(#[from] Error),
    #[error("detection did not finish within {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("all {0} detection threads are busy")]
    Busy(usize),
    #[error("{0}")]
    Internal(String),
}

impl RequestError {
    pub fn status(&self) -> u16 {
        match self {
            RequestError::BodyTooLarge(_) => 413,
            RequestError::BadRequest(_) => 400,
            RequestError::Detection(Error::Decode(ImageError::Limits(_))) => 413,
            RequestError::Detection(Error::Decode(_)) => 400,
            RequestError::Detection(Error::ModelNotLoaded) => 503,
            RequestError::Detection(_) => 500,
            RequestError::Timeout(_) => 504,
            RequestError::Busy(_) => 503,
            RequestError::Internal(_) => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /detect-color
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    match detect(request, state) {
        Ok(detection) => json_response(200, &DetectResponse::from(detection)),
        Err(e) => {
            let status = e.status();
            if status >= 500 {
                log::error!("detect-color failed: {}", e);
            } else {
                log::warn!("detect-color rejected: {}", e);
            }
            error_response(status, &e.to_string())
        }
    }
}

fn detect(request: &mut Request, state: &SharedState) -> Result<Detection, RequestError> {
    let body = read_body(request, state.max_body_bytes)?;
    let image = decode_image_field(&body)?;
    log::debug!("decoded {} image bytes from a {} byte body", image.len(), body.len());
    detect_with_timeout(state, image)
}

/// Bytes of an oversized body still read so the client gets the 413
/// rather than a connection reset.
const DRAIN_LIMIT: u64 = 64 * 1024;

/// Reads at most `limit` bytes, rejecting declared or actual overflow.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, RequestError> {
    if request.body_length().map_or(false, |len| len > limit) {
        return Err(reject_oversized(request, limit));
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| RequestError::BadRequest(format!("could not read request body: {}", e)))?;
    if body.len() > limit {
        return Err(reject_oversized(request, limit));
    }
    Ok(body)
}

fn reject_oversized(request: &mut Request, limit: usize) -> RequestError {
    let _ = io::copy(&mut request.as_reader().take(DRAIN_LIMIT), &mut io::sink());
    RequestError::BodyTooLarge(limit)
}

/// Parses `{"image": "<base64>"}` and returns the decoded image bytes.
fn decode_image_field(body: &[u8]) -> Result<Vec<u8>, RequestError> {
    let parsed: DetectRequest = serde_json::from_slice(body)
        .map_err(|e| RequestError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let encoded = strip_data_url(parsed.image.trim());
    if encoded.is_empty() {
        return Err(RequestError::BadRequest("field 'image' is empty".to_owned()));
    }
    STANDARD
        .decode(encoded)
        .map_err(|e| RequestError::BadRequest(format!("field 'image' is not valid base64: {}", e)))
}

/// `data:image/png;base64,AAAA` -> `AAAA`; anything else is returned as is.
fn strip_data_url(value: &str) -> &str {
    if !value.starts_with("data:") {
        return value;
    }
    match value.find(";base64,") {
        Some(pos) => &value[pos + ";base64,".len()..],
        None => value,
    }
}

/// Runs the detector on the bounded detection pool and waits at most
/// `state.timeout`. Requests arriving while every detection thread is taken
/// are refused; a job still queued when its deadline passes is skipped.
fn detect_with_timeout(state: &SharedState, image: Vec<u8>) -> Result<Detection, RequestError> {
    let pool = state
        .detect_pool
        .lock()
        .map_err(|_| RequestError::Internal("detection pool is unavailable".to_owned()))?
        .clone();
    if pool.active_count() + pool.queued_count() >= pool.max_count() {
        return Err(RequestError::Busy(pool.max_count()));
    }

    let deadline = Instant::now() + state.timeout;
    let (tx, rx) = mpsc::channel();
    let detector = state.detector.clone();
    pool.execute(move || {
        if Instant::now() >= deadline {
            log::debug!("dropping detection queued past its deadline");
            return;
        }
        let _ = tx.send(detector.detect(&image));
    });

    match rx.recv_timeout(state.timeout) {
        Ok(result) => Ok(result?),
        Err(RecvTimeoutError::Timeout) => Err(RequestError::Timeout(state.timeout)),
        Err(RecvTimeoutError::Disconnected) if Instant::now() >= deadline => {
            Err(RequestError::Timeout(state.timeout))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(RequestError::Internal("detection worker exited without a result".to_owned()))
        }
    }
}
