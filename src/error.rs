use std::path::PathBuf;

/// Every failure the color pipeline can surface.
///
/// Codec and extractor errors propagate unchanged through the dataset builder
/// and the detector, so the variant seen at the boundary is the one raised at
/// the source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hex color '{0}': expected 6 hexadecimal digits")]
    InvalidFormat(String),
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("file name '{}' does not encode a hex color", .0.display())]
    FilenameFormat(PathBuf),
    #[error("cannot train on an empty dataset")]
    EmptyDataset,
    #[error("expected a vector of length {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("model artifact '{}' is unusable: {reason}", path.display())]
    CorruptModel { path: PathBuf, reason: String },
    #[error("no model has been loaded")]
    ModelNotLoaded,
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error("failed to initialise logging: {0}")]
    Logging(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
