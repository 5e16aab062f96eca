use std::io::Cursor;

use serde::Serialize;
use tiny_http::Response;

use crate::routes::json_response;
use crate::state::SharedState;

#[derive(Serialize)]
struct Health<'a> {
    status: &'a str,
    model: String,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub fn handle(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let status = if state.detector.is_loaded() { "ok" } else { "unavailable" };
    let code = if state.detector.is_loaded() { 200 } else { 503 };
    json_response(
        code,
        &Health { status, model: state.model_path.display().to_string() },
    )
}
