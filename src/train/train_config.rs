/// Hyperparameters for a `train_loop` run.
///
/// - `epochs`        — total number of full passes over the training data
/// - `batch_size`    — samples averaged per optimizer step; `1` for online updates
/// - `learning_rate` — fixed Adam step size
/// - `seed`          — seeds weight initialization and per-epoch shuffling;
///                     `None` draws from OS entropy
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Default hyperparameters with a caller-chosen epoch count.
    pub fn new(epochs: usize) -> Self {
        TrainConfig { epochs, ..TrainConfig::default() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.001,
            seed: None,
        }
    }
}
