use std::ffi::OsString;
use std::path::PathBuf;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgMatches,
    Command as ClapCommand,
};
use log::LevelFilter;

use crate::generate::DEFAULT_SIZE;
use crate::logger;
use crate::train::TrainConfig;

pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_MODEL_PATH: &str = "model/model.json";
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// What the `swatch-nn` binary was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write synthetic swatches into `out`.
    Generate { out: PathBuf, size: u32, random: usize, seed: Option<u64> },
    /// Build a dataset from `images`, train, and save to `model`.
    Train { images: PathBuf, model: PathBuf, config: TrainConfig },
    /// Detect the dominant color of one image file.
    Detect { image: PathBuf, model: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    pub log_level: LevelFilter,
    pub command: Command,
}

pub struct CLIParser {
    command: ClapCommand,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command()
            .arg(Self::create_log_level_argument())
            .subcommand(Self::create_generate_command())
            .subcommand(Self::create_train_command())
            .subcommand(Self::create_detect_command());
        CLIParser { command }
    }

    /// Parses `itr`, printing usage and exiting on invalid input.
    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.try_parse(itr).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse<I, T>(&mut self, itr: I) -> Result<Arguments, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.try_get_matches_from_mut(itr)?;
        Ok(Self::extract_arguments(&matches))
    }

    fn create_base_command() -> ClapCommand {
        ClapCommand::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
            .subcommand_required(true)
            .arg_required_else_help(true)
    }

    fn create_log_level_argument() -> Arg {
        Arg::new("log_level")
            .long("log-level")
            .value_name("LEVEL")
            .help("Log verbosity")
            .global(true)
            .default_value("info")
            .value_parser(LOG_LEVELS)
    }

    fn create_generate_command() -> ClapCommand {
        ClapCommand::new("generate")
            .about("Write labeled solid and gradient swatches as PNG files")
            .arg(Self::create_path_argument("out", "Output directory", DEFAULT_IMAGES_DIR))
            .arg(
                Arg::new("size")
                    .long("size")
                    .value_name("PIXELS")
                    .help("Side length of every swatch")
                    .default_value(DEFAULT_SIZE.to_string())
                    .value_parser(value_parser!(u32).range(1..)),
            )
            .arg(
                Arg::new("random")
                    .long("random")
                    .value_name("COUNT")
                    .help("Additional random solid swatches")
                    .default_value("0")
                    .value_parser(value_parser!(usize)),
            )
            .arg(Self::create_seed_argument())
    }

    fn create_train_command() -> ClapCommand {
        let defaults = TrainConfig::default();
        ClapCommand::new("train")
            .about("Train the color regressor on a directory of hex-named images")
            .arg(Self::create_path_argument("images", "Directory of training images", DEFAULT_IMAGES_DIR))
            .arg(Self::create_path_argument("model", "Where to write the model", DEFAULT_MODEL_PATH))
            .arg(
                Arg::new("epochs")
                    .short('e')
                    .long("epochs")
                    .value_name("EPOCHS")
                    .help("Full passes over the dataset")
                    .default_value(defaults.epochs.to_string())
                    .value_parser(value_parser!(u64).range(1..)),
            )
            .arg(
                Arg::new("batch_size")
                    .long("batch-size")
                    .value_name("SAMPLES")
                    .help("Samples per optimizer step")
                    .default_value(defaults.batch_size.to_string())
                    .value_parser(value_parser!(u64).range(1..)),
            )
            .arg(
                Arg::new("learning_rate")
                    .long("learning-rate")
                    .value_name("RATE")
                    .help("Adam learning rate")
                    .default_value(defaults.learning_rate.to_string())
                    .value_parser(value_parser!(f64)),
            )
            .arg(Self::create_seed_argument())
    }

    fn create_detect_command() -> ClapCommand {
        ClapCommand::new("detect")
            .about("Print the dominant color of an image using a trained model")
            .arg(
                Arg::new("image")
                    .help("Image file to analyse")
                    .value_parser(value_parser!(PathBuf))
                    .required(true),
            )
            .arg(Self::create_path_argument("model", "Trained model file", DEFAULT_MODEL_PATH))
    }

    fn create_path_argument(id: &'static str, help: &'static str, default: &'static str) -> Arg {
        Arg::new(id)
            .long(id)
            .value_name("PATH")
            .help(help)
            .default_value(default)
            .value_parser(value_parser!(PathBuf))
    }

    fn create_seed_argument() -> Arg {
        Arg::new("seed")
            .long("seed")
            .value_name("SEED")
            .help("Seed for reproducible runs")
            .value_parser(value_parser!(u64))
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        let command = match matches.subcommand() {
            Some(("generate", sub)) => Command::Generate {
                out: Self::extract_required(sub, "out"),
                size: Self::extract_required(sub, "size"),
                random: Self::extract_required(sub, "random"),
                seed: sub.get_one::<u64>("seed").copied(),
            },
            Some(("train", sub)) => Command::Train {
                images: Self::extract_required(sub, "images"),
                model: Self::extract_required(sub, "model"),
                config: Self::extract_train_config(sub),
            },
            Some(("detect", sub)) => Command::Detect {
                image: Self::extract_required(sub, "image"),
                model: Self::extract_required(sub, "model"),
            },
            _ => unreachable!("subcommand_required is set"),
        };
        Arguments {
            log_level: Self::extract_log_level(matches),
            command,
        }
    }

    fn extract_train_config(matches: &ArgMatches) -> TrainConfig {
        TrainConfig {
            epochs: Self::extract_required::<u64>(matches, "epochs") as usize,
            batch_size: Self::extract_required::<u64>(matches, "batch_size") as usize,
            learning_rate: Self::extract_required(matches, "learning_rate"),
            seed: matches.get_one::<u64>("seed").copied(),
        }
    }

    fn extract_log_level(matches: &ArgMatches) -> LevelFilter {
        matches
            .get_one::<String>("log_level")
            .and_then(|name| logger::parse_level(name))
            .unwrap_or(LevelFilter::Info)
    }

    fn extract_required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> T {
        matches
            .get_one::<T>(id)
            .unwrap_or_else(|| panic!("argument '{}' has a default and must be present", id))
            .clone()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    const PROGRAM_NAME_ARGUMENT: &str = "swatch-nn";

    #[test]
    fn parse_train_defaults() {
        let arguments = CLIParser::default().parse(vec![PROGRAM_NAME_ARGUMENT, "train"]);
        assert_eq!(arguments.log_level, LevelFilter::Info);
        assert_eq!(
            arguments.command,
            Command::Train {
                images: PathBuf::from(DEFAULT_IMAGES_DIR),
                model: PathBuf::from(DEFAULT_MODEL_PATH),
                config: TrainConfig::default(),
            }
        );
    }

    #[test]
    fn parse_train_overrides() {
        let arguments = CLIParser::default().parse(vec![
            PROGRAM_NAME_ARGUMENT,
            "--log-level",
            "debug",
            "train",
            "--images",
            "/data/swatches",
            "-e",
            "120",
            "--batch-size",
            "8",
            "--learning-rate",
            "0.0005",
            "--seed",
            "17",
        ]);
        assert_eq!(arguments.log_level, LevelFilter::Debug);
        match arguments.command {
            Command::Train { images, config, .. } => {
                assert_eq!(images, PathBuf::from("/data/swatches"));
                assert_eq!(config.epochs, 120);
                assert_eq!(config.batch_size, 8);
                assert_eq!(config.learning_rate, 0.0005);
                assert_eq!(config.seed, Some(17));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parse_zero_epochs_is_rejected() {
        let result = CLIParser::default().try_parse(vec![PROGRAM_NAME_ARGUMENT, "train", "--epochs", "0"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn parse_generate_arguments() {
        let arguments = CLIParser::default().parse(vec![
            PROGRAM_NAME_ARGUMENT, "generate", "--out", "swatches", "--random", "20",
        ]);
        assert_eq!(
            arguments.command,
            Command::Generate {
                out: PathBuf::from("swatches"),
                size: DEFAULT_SIZE,
                random: 20,
                seed: None,
            }
        );
    }

    #[test]
    fn parse_detect_requires_image() {
        let result = CLIParser::default().try_parse(vec![PROGRAM_NAME_ARGUMENT, "detect"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::MissingRequiredArgument);

        let arguments = CLIParser::default().parse(vec![PROGRAM_NAME_ARGUMENT, "detect", "673ab7.png"]);
        assert_eq!(
            arguments.command,
            Command::Detect {
                image: PathBuf::from("673ab7.png"),
                model: PathBuf::from(DEFAULT_MODEL_PATH),
            }
        );
    }

    #[test]
    fn parse_unknown_log_level_is_rejected() {
        let result = CLIParser::default().try_parse(vec![PROGRAM_NAME_ARGUMENT, "--log-level", "loud", "train"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidValue);
    }
}
