use serde::{Serialize, Deserialize};

/// One row of a training run's loss history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean per-sample MSE over the epoch, measured before each batch's update.
    pub train_loss: f64,
    /// Adam steps taken during the epoch.
    pub optimizer_steps: usize,
    pub elapsed_ms: u64,
}
