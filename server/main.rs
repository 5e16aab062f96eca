/// swatch-server
///
/// Serves `POST /detect-color` over a synchronous tiny_http listener. The
/// model is loaded before the socket opens; requests are handled on a fixed
/// worker pool sharing one immutable detector.
///
/// Run with:
///   cargo run --bin swatch-server --release -- --model model/model.json

mod config;
mod handlers;
mod routes;
mod state;

use std::env::args_os;
use std::process::ExitCode;
use std::sync::Arc;

use threadpool::ThreadPool;
use tiny_http::Server;

use swatch_nn::{logger, ColorDetector};

use config::ServerConfig;
use state::ServerState;

fn main() -> ExitCode {
    let config = ServerConfig::from_args(args_os());
    if let Err(e) = logger::init(config.log_level) {
        eprintln!("{}", e);
    }

    let detector = match ColorDetector::load(&config.model) {
        Ok(detector) => detector,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::http(&config.address) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to bind {}: {}", config.address, e);
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(ServerState::new(detector, &config));
    let pool = ThreadPool::new(config.threads);
    log::info!(
        "listening on http://{} with {} workers, {} detection threads (timeout {} ms, body limit {} bytes)",
        config.address,
        config.threads,
        config.detect_threads,
        config.timeout.as_millis(),
        config.max_body_bytes
    );

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.execute(move || routes::dispatch(request, state));
    }
    pool.join();
    ExitCode::SUCCESS
}
