use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use threadpool::ThreadPool;

use swatch_nn::{ColorDetector, DecodeLimits};

use crate::config::ServerConfig;

/// Everything a request handler needs. Built once before the listener opens;
/// only the detection pool is shared mutably.
#[derive(Debug)]
pub struct ServerState {
    pub detector: ColorDetector,
    pub model_path: PathBuf,
    pub timeout: Duration,
    pub max_body_bytes: usize,
    /// Bounded pool running decode + inference off the request threads.
    pub detect_pool: Mutex<ThreadPool>,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(detector: ColorDetector, config: &ServerConfig) -> ServerState {
        ServerState {
            detector: detector.with_limits(DecodeLimits::square(config.max_image_side)),
            model_path: config.model.clone(),
            timeout: config.timeout,
            max_body_bytes: config.max_body_bytes,
            detect_pool: Mutex::new(
                threadpool::Builder::new()
                    .num_threads(config.detect_threads)
                    .thread_name("detect".to_owned())
                    .build(),
            ),
        }
    }
}
