use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::features::{FEATURE_LEN, GRID_SIZE};
use crate::network::metadata::{InputType, ModelMetadata};
use crate::network::network::Network;

/// Describes one layer in a network specification.
///
/// - `size`       — number of neurons in this layer
/// - `input_size` — output size of the previous layer, or the raw input
///                  dimension for the first layer
/// - `activation` — applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// A serializable network topology plus the metadata stamped on networks
/// built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    /// Ordered input → output.
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// The dominant-color regressor: 3072 → 128 ReLU → 64 ReLU → 3 Sigmoid.
    pub fn color_regressor() -> NetworkSpec {
        NetworkSpec {
            name: "color-regressor".to_owned(),
            layers: vec![
                LayerSpec { size: 128, input_size: FEATURE_LEN, activation: ActivationFunction::ReLU },
                LayerSpec { size: 64, input_size: 128, activation: ActivationFunction::ReLU },
                LayerSpec { size: 3, input_size: 64, activation: ActivationFunction::Sigmoid },
            ],
            metadata: Some(ModelMetadata {
                description: Some("Dominant color of a 32x32 RGB image as normalized R, G, B".to_owned()),
                input_type: Some(InputType::ImageRgb { width: GRID_SIZE, height: GRID_SIZE }),
                output_labels: Some(vec!["r".to_owned(), "g".to_owned(), "b".to_owned()]),
                epochs_trained: None,
                final_loss: None,
            }),
        }
    }

    /// Checks that `network` has exactly this topology and that every
    /// parameter array has the shape its layer declares.
    pub fn check(&self, network: &Network) -> Result<(), String> {
        if network.layers.len() != self.layers.len() {
            return Err(format!(
                "expected {} layers, found {}",
                self.layers.len(),
                network.layers.len()
            ));
        }
        for (i, (layer, spec)) in network.layers.iter().zip(&self.layers).enumerate() {
            if layer.size != spec.size || layer.input_size != spec.input_size {
                return Err(format!(
                    "layer {} is {}→{}, expected {}→{}",
                    i, layer.input_size, layer.size, spec.input_size, spec.size
                ));
            }
            if layer.activator != spec.activation {
                return Err(format!(
                    "layer {} uses {:?}, expected {:?}",
                    i, layer.activator, spec.activation
                ));
            }
            if !layer.is_well_formed() {
                return Err(format!("layer {} has parameters of the wrong shape", i));
            }
            if layer.weights.data.iter().chain(&layer.biases).any(|v| !v.is_finite()) {
                return Err(format!("layer {} contains non-finite parameters", i));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn regressor_topology_chains() {
        let spec = NetworkSpec::color_regressor();
        assert_eq!(spec.layers.first().unwrap().input_size, FEATURE_LEN);
        assert_eq!(spec.layers.last().unwrap().size, 3);
        for pair in spec.layers.windows(2) {
            assert_eq!(pair[0].size, pair[1].input_size);
        }
    }

    #[test]
    fn check_accepts_own_network_and_rejects_others() {
        let spec = NetworkSpec::color_regressor();
        let mut rng = StdRng::seed_from_u64(5);
        let mut network = Network::from_spec(&spec, &mut rng);
        assert!(spec.check(&network).is_ok());

        network.layers[2].activator = ActivationFunction::ReLU;
        assert!(spec.check(&network).unwrap_err().contains("layer 2"));

        network.layers.pop();
        assert!(spec.check(&network).unwrap_err().contains("expected 3 layers"));
    }
}
