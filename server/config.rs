use std::ffi::OsString;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{crate_version, value_parser, Arg, ArgMatches, Command};
use log::LevelFilter;

use swatch_nn::cli::DEFAULT_MODEL_PATH;
use swatch_nn::features::DEFAULT_MAX_SIDE;
use swatch_nn::logger;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings for `swatch-server`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub address: String,
    pub model: PathBuf,
    /// Worker threads handling requests.
    pub threads: usize,
    /// Threads running decode + inference; requests beyond them get 503.
    pub detect_threads: usize,
    /// Upper bound on decode + inference per request.
    pub timeout: Duration,
    pub max_body_bytes: usize,
    /// Largest accepted image width or height, checked before decoding.
    pub max_image_side: u32,
    pub log_level: LevelFilter,
}

impl ServerConfig {
    /// Parses `itr`, printing usage and exiting on invalid input.
    pub fn from_args<I, T>(itr: I) -> ServerConfig
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_from_args(itr).unwrap_or_else(|e| e.exit())
    }

    pub fn try_from_args<I, T>(itr: I) -> Result<ServerConfig, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = create_command().try_get_matches_from(itr)?;
        Ok(extract(&matches))
    }
}

fn create_command() -> Command {
    Command::new("swatch-server")
        .version(crate_version!())
        .about("Serves dominant-color detection over HTTP")
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("HOST:PORT")
                .help("Listen address")
                .default_value(DEFAULT_ADDRESS),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("PATH")
                .help("Trained model file, loaded before the listener opens")
                .default_value(DEFAULT_MODEL_PATH)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("THREADS")
                .help("Number of request worker threads")
                .default_value(default_threads().to_string())
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("detect_threads")
                .long("detect-threads")
                .value_name("THREADS")
                .help("Number of threads running detection")
                .default_value(default_threads().to_string())
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("timeout_ms")
                .long("timeout-ms")
                .value_name("MILLIS")
                .help("Per-request detection timeout")
                .default_value(DEFAULT_TIMEOUT_MS.to_string())
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("max_body_bytes")
                .long("max-body-bytes")
                .value_name("BYTES")
                .help("Largest accepted request body")
                .default_value(DEFAULT_MAX_BODY_BYTES.to_string())
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("max_image_side")
                .long("max-image-side")
                .value_name("PIXELS")
                .help("Largest accepted image width or height")
                .default_value(DEFAULT_MAX_SIDE.to_string())
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log verbosity")
                .default_value("info")
                .value_parser(["off", "error", "warn", "info", "debug", "trace"]),
        )
}

fn extract(matches: &ArgMatches) -> ServerConfig {
    ServerConfig {
        address: required::<String>(matches, "address"),
        model: required(matches, "model"),
        threads: required::<u64>(matches, "threads") as usize,
        detect_threads: required::<u64>(matches, "detect_threads") as usize,
        timeout: Duration::from_millis(required(matches, "timeout_ms")),
        max_body_bytes: required::<u64>(matches, "max_body_bytes") as usize,
        max_image_side: required(matches, "max_image_side"),
        log_level: matches
            .get_one::<String>("log_level")
            .and_then(|name| logger::parse_level(name))
            .unwrap_or(LevelFilter::Info),
    }
}

fn required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> T {
    matches
        .get_one::<T>(id)
        .unwrap_or_else(|| panic!("argument '{}' has a default and must be present", id))
        .clone()
}

fn default_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
