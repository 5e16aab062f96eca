use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::features::FEATURE_LEN;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::{train_loop, EpochStats, TrainConfig};

/// The dominant-color regressor.
///
/// Wraps a `Network` whose topology always matches
/// `NetworkSpec::color_regressor()`. Once built or loaded it is only read,
/// so an `Arc<ColorModel>` can be shared between request threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorModel {
    network: Network,
}

/// A freshly trained model together with its loss history.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: ColorModel,
    pub history: Vec<EpochStats>,
}

impl TrainedModel {
    pub fn final_loss(&self) -> Option<f64> {
        self.history.last().map(|s| s.train_loss)
    }
}

impl ColorModel {
    /// Randomly initialized, untrained model.
    pub fn untrained(rng: &mut StdRng) -> ColorModel {
        ColorModel { network: Network::from_spec(&NetworkSpec::color_regressor(), rng) }
    }

    /// Fits a new model to `dataset`.
    ///
    /// Fails with `EmptyDataset` when there are no samples.
    pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainedModel> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut model = ColorModel::untrained(&mut rng);
        let history = train_loop(&mut model.network, &dataset.inputs, &dataset.labels, config, &mut rng)?;

        if let Some(metadata) = model.network.metadata.as_mut() {
            metadata.epochs_trained = Some(config.epochs);
            metadata.final_loss = history.last().map(|s| s.train_loss);
        }
        Ok(TrainedModel { model, history })
    }

    /// Forward pass. Outputs are sigmoid-bounded to [0, 1].
    pub fn predict(&self, features: &[f64]) -> Result<[f64; 3]> {
        if features.len() != FEATURE_LEN {
            return Err(Error::ShapeMismatch { expected: FEATURE_LEN, actual: features.len() });
        }
        let output = self.network.forward(features);
        match output.as_slice() {
            &[r, g, b] => Ok([r, g, b]),
            other => Err(Error::ShapeMismatch { expected: 3, actual: other.len() }),
        }
    }

    /// Writes architecture, weights and metadata as JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.network.save_json(path)?;
        log::info!("saved model to {}", path.display());
        Ok(())
    }

    /// Reads a model written by `save`.
    ///
    /// Any failure to read, parse, or match the regressor topology is
    /// reported as `CorruptModel`.
    pub fn load(path: &Path) -> Result<ColorModel> {
        let corrupt = |reason: String| Error::CorruptModel { path: path.to_path_buf(), reason };
        let network = Network::load_json(path).map_err(|e| corrupt(e.to_string()))?;
        NetworkSpec::color_regressor().check(&network).map_err(corrupt)?;
        log::info!("loaded model from {}", path.display());
        Ok(ColorModel { network })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("swatch-nn-model-{}", std::process::id()))
            .join(name)
    }

    fn ramp() -> Vec<f64> {
        (0..FEATURE_LEN).map(|i| (i % 256) as f64 / 255.0).collect()
    }

    fn small_dataset() -> Dataset {
        let mut dataset = Dataset::default();
        dataset.push(vec![1.0; FEATURE_LEN], [1.0, 1.0, 1.0], PathBuf::from("ffffff.png"));
        dataset.push(vec![0.0; FEATURE_LEN], [0.0, 0.0, 0.0], PathBuf::from("000000.png"));
        dataset
    }

    #[test]
    fn predict_rejects_wrong_length() {
        let model = ColorModel::untrained(&mut StdRng::seed_from_u64(1));
        match model.predict(&[0.5; 10]) {
            Err(Error::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, FEATURE_LEN);
                assert_eq!(actual, 10);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn predictions_are_bounded_and_deterministic() {
        let model = ColorModel::untrained(&mut StdRng::seed_from_u64(2));
        for input in [vec![0.0; FEATURE_LEN], vec![1.0; FEATURE_LEN], ramp()] {
            let first = model.predict(&input).unwrap();
            assert!(first.iter().all(|v| (0.0..=1.0).contains(v)));
            assert_eq!(first, model.predict(&input).unwrap());
        }
    }

    #[test]
    fn training_on_nothing_fails() {
        let result = ColorModel::train(&Dataset::default(), &TrainConfig::new(3));
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn seeded_training_is_reproducible() {
        let config = TrainConfig::new(3).with_seed(9);
        let a = ColorModel::train(&small_dataset(), &config).unwrap();
        let b = ColorModel::train(&small_dataset(), &config).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.history.len(), 3);
        assert_eq!(a.model.network().metadata.as_ref().unwrap().epochs_trained, Some(3));
    }

    #[test]
    fn save_then_load_preserves_predictions() {
        let trained = ColorModel::train(&small_dataset(), &TrainConfig::new(2).with_seed(4)).unwrap();
        let path = scratch_file("roundtrip/model.json");
        trained.model.save(&path).unwrap();
        let loaded = ColorModel::load(&path).unwrap();

        let input = ramp();
        let before = trained.model.predict(&input).unwrap();
        let after = loaded.predict(&input).unwrap();
        for (b, a) in before.iter().zip(&after) {
            assert_abs_diff_eq!(*b, *a, epsilon = 1e-12);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unreadable_artifacts_are_corrupt() {
        let missing = scratch_file("does-not-exist.json");
        assert!(matches!(ColorModel::load(&missing), Err(Error::CorruptModel { .. })));

        let garbage = scratch_file("garbage.json");
        std::fs::create_dir_all(garbage.parent().unwrap()).unwrap();
        std::fs::write(&garbage, b"{\"layers\": 12").unwrap();
        assert!(matches!(ColorModel::load(&garbage), Err(Error::CorruptModel { .. })));
        std::fs::remove_file(&garbage).unwrap();
    }

    #[test]
    fn incompatible_architecture_is_corrupt() {
        let mut model = ColorModel::untrained(&mut StdRng::seed_from_u64(3));
        model.network.layers.truncate(2);
        let path = scratch_file("truncated.json");
        model.save(&path).unwrap();
        match ColorModel::load(&path) {
            Err(Error::CorruptModel { reason, .. }) => assert!(reason.contains("layers")),
            other => panic!("expected CorruptModel, got {:?}", other.map(|_| ())),
        }
        std::fs::remove_file(&path).unwrap();
    }
}
