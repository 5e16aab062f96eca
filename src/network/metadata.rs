use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// RGB image resized to width×height, normalized to [0, 1], flattened as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

/// Annotations stored next to the weights.
/// All fields are Option<> so artifacts without them still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Names of the output units, e.g. ["r", "g", "b"].
    pub output_labels: Option<Vec<String>>,
    /// Informational only; loading never depends on it.
    #[serde(default)]
    pub epochs_trained: Option<usize>,
    #[serde(default)]
    pub final_loss: Option<f64>,
}
