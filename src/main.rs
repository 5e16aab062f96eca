use std::env::args_os;
use std::path::Path;
use std::process::ExitCode;

use swatch_nn::cli::{Arguments, CLIParser, Command};
use swatch_nn::{generate, logger, ColorDetector, ColorModel, Dataset, Error, Result, TrainConfig};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    if let Err(e) = logger::init(arguments.log_level) {
        eprintln!("{}", e);
    }
    match run(arguments) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(arguments: Arguments) -> Result<()> {
    match arguments.command {
        Command::Generate { out, size, random, seed } => {
            let mut swatches = generate::default_set();
            swatches.extend(generate::random_solids(random, seed));
            generate::write_all(&out, &swatches, size)?;
        }
        Command::Train { images, model, config } => train(&images, &model, &config)?,
        Command::Detect { image, model } => {
            let detector = ColorDetector::load(&model)?;
            let bytes = std::fs::read(&image).map_err(|source| Error::Read { path: image.clone(), source })?;
            let detection = detector.detect(&bytes)?;
            println!("{} {:.6} {:.6} {:.6}", detection.hex, detection.r, detection.g, detection.b);
        }
    }
    Ok(())
}

fn train(images: &Path, model_path: &Path, config: &TrainConfig) -> Result<()> {
    let dataset = Dataset::build(images)?;
    let trained = ColorModel::train(&dataset, config)?;
    trained.model.save(model_path)?;
    match trained.final_loss() {
        Some(loss) => log::info!("model trained and saved (final loss {:.6})", loss),
        None => log::info!("model trained and saved"),
    }
    Ok(())
}
