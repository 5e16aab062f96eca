use std::path::Path;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::{Error, Result};

/// File consulted before falling back to the built-in console configuration.
pub const CONFIG_FILE: &str = "log4rs.yaml";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Installs the global logger.
///
/// A `log4rs.yaml` in the working directory wins; otherwise stderr gets a
/// timestamped console appender filtered at `level`.
pub fn init(level: LevelFilter) -> Result<()> {
    if Path::new(CONFIG_FILE).is_file() {
        return log4rs::init_file(CONFIG_FILE, Default::default())
            .map_err(|e| Error::Logging(e.to_string()));
    }
    let config = console_config(level)?;
    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| Error::Logging(e.to_string()))
}

fn console_config(level: LevelFilter) -> Result<Config> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Parses the `--log-level` values accepted by both binaries.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
