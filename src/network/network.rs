use std::io::Write;
use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::dense::{Layer, LayerTrace};
use crate::network::metadata::ModelMetadata;
use crate::network::spec::NetworkSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a freshly initialized network with the topology in `spec`.
    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Network {
        let layers = spec.layers.iter()
            .map(|l| Layer::new(l.size, l.input_size, l.activation, rng))
            .collect();
        Network { layers, metadata: spec.metadata.clone() }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Inference-only forward pass.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Forward pass that keeps every layer's trace for backprop.
    pub fn forward_trace(&self, input: &[f64]) -> Vec<LayerTrace> {
        let mut traces: Vec<LayerTrace> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let trace = match traces.last() {
                Some(prev) => layer.forward_trace(&prev.output),
                None => layer.forward_trace(input),
            };
            traces.push(trace);
        }
        traces
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &Path) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::error::Error;
    use crate::network::spec::LayerSpec;
    use rand::{rngs::StdRng, SeedableRng};
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("swatch-nn-network-{}-{}", name, std::process::id()))
    }

    fn small_network() -> Network {
        let spec = NetworkSpec {
            name: "small".to_owned(),
            layers: vec![
                LayerSpec { size: 4, input_size: 3, activation: ActivationFunction::ReLU },
                LayerSpec { size: 2, input_size: 4, activation: ActivationFunction::Sigmoid },
            ],
            metadata: None,
        };
        Network::from_spec(&spec, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn json_round_trip_is_exact() {
        let path = scratch_file("round-trip");
        let network = small_network();
        network.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        assert_eq!(loaded, network);
        assert_eq!(loaded.forward(&[0.2, 0.4, 0.9]), network.forward(&[0.2, 0.4, 0.9]));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_json_is_a_serialize_error() {
        let path = scratch_file("malformed");
        std::fs::write(&path, br#"{"layers": [{"size": "four"}]}"#).unwrap();
        assert!(matches!(Network::load_json(&path), Err(Error::Serialize(_))));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = scratch_file("missing").join("model.json");
        assert!(matches!(Network::load_json(&path), Err(Error::Io(_))));
        assert!(matches!(small_network().save_json(&path), Err(Error::Io(_))));
    }
}
