pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

pub mod cli;
pub mod color;
pub mod dataset;
pub mod error;
pub mod features;
pub mod generate;
pub mod inference;
pub mod logger;
pub mod model;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::metadata::{InputType, ModelMetadata};
pub use network::spec::{LayerSpec, NetworkSpec};
pub use optim::adam::Adam;
pub use train::{train_loop, EpochStats, TrainConfig};

pub use cli::{CLIParser, Command};
pub use color::{hex_to_rgb, rgb_to_hex, Rgb};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use features::{extract, DecodeLimits, FEATURE_LEN};
pub use inference::{ColorDetector, Detection};
pub use model::{ColorModel, TrainedModel};
