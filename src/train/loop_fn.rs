use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::layers::dense::LayerGradients;
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::optim::adam::Adam;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` in place with mini-batch Adam on MSE loss.
///
/// Runs exactly `config.epochs` epochs; there is no early stopping and no
/// validation split. Sample order is reshuffled every epoch with `rng`.
/// Returns one `EpochStats` per epoch.
///
/// # Errors
/// - `EmptyDataset` if `inputs` is empty
/// - `ShapeMismatch` if the two slices differ in length, or any sample does
///   not match the network's input / output width
pub fn train_loop<X, Y>(
    network: &mut Network,
    inputs: &[X],
    labels: &[Y],
    config: &TrainConfig,
    rng: &mut StdRng,
) -> Result<Vec<EpochStats>>
where
    X: AsRef<[f64]>,
    Y: AsRef<[f64]>,
{
    if inputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if inputs.len() != labels.len() {
        return Err(Error::ShapeMismatch { expected: inputs.len(), actual: labels.len() });
    }
    check_widths(inputs, network.input_size())?;
    check_widths(labels, network.output_size())?;

    let batch_size = config.batch_size.max(1);
    let mut optimizer = Adam::new(config.learning_rate);
    let mut history = Vec::with_capacity(config.epochs);

    log::info!(
        "training on {} samples: {} epochs, batch size {}, learning rate {}",
        inputs.len(), config.epochs, batch_size, config.learning_rate
    );

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        let train_loss = run_one_epoch(network, inputs, labels, &mut optimizer, batch_size, rng);
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            optimizer_steps: inputs.len().div_ceil(batch_size),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        log::info!("epoch {}/{}: loss {:.6} ({} ms)", epoch, config.epochs, train_loss, stats.elapsed_ms);
        history.push(stats);
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_widths<V: AsRef<[f64]>>(samples: &[V], width: usize) -> Result<()> {
    match samples.iter().map(|s| s.as_ref().len()).find(|&len| len != width) {
        Some(actual) => Err(Error::ShapeMismatch { expected: width, actual }),
        None => Ok(()),
    }
}

/// One full pass over the data. Returns the mean per-sample loss.
fn run_one_epoch<X, Y>(
    network: &mut Network,
    inputs: &[X],
    labels: &[Y],
    optimizer: &mut Adam,
    batch_size: usize,
    rng: &mut StdRng,
) -> f64
where
    X: AsRef<[f64]>,
    Y: AsRef<[f64]>,
{
    let n = inputs.len();
    let mut total_loss = 0.0;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut grads: Vec<LayerGradients> = network.layers.iter()
        .map(LayerGradients::zeros_like)
        .collect();

    for batch in indices.chunks(batch_size) {
        grads.iter_mut().for_each(LayerGradients::reset);

        for &idx in batch {
            let input = inputs[idx].as_ref();
            let expected = labels[idx].as_ref();

            let traces = network.forward_trace(input);
            let output = match traces.last() {
                Some(trace) => &trace.output,
                None => continue,
            };
            total_loss += MseLoss::loss(output, expected);

            // Backward pass; the first layer's input gradient is never used.
            let mut grad = MseLoss::derivative(output, expected);
            for i in (0..network.layers.len()).rev() {
                let layer_input: &[f64] = if i == 0 { input } else { &traces[i - 1].output };
                grad = network.layers[i].backward(layer_input, &traces[i], &grad, &mut grads[i], i > 0);
            }
        }

        let inv_batch = 1.0 / batch.len() as f64;
        grads.iter_mut().for_each(|g| g.scale(inv_batch));
        optimizer.step(&mut network.layers, &grads);
    }

    total_loss / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::network::spec::{LayerSpec, NetworkSpec};
    use rand::SeedableRng;

    fn tiny_network(rng: &mut StdRng) -> Network {
        let spec = NetworkSpec {
            name: "tiny".to_owned(),
            layers: vec![
                LayerSpec { size: 8, input_size: 2, activation: ActivationFunction::ReLU },
                LayerSpec { size: 1, input_size: 8, activation: ActivationFunction::Sigmoid },
            ],
            metadata: None,
        };
        Network::from_spec(&spec, rng)
    }

    #[test]
    fn rejects_empty_and_misaligned_data() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut network = tiny_network(&mut rng);
        let config = TrainConfig::new(1);
        let none: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            train_loop(&mut network, &none, &none, &config, &mut rng),
            Err(Error::EmptyDataset)
        ));
        let inputs = vec![vec![0.0, 1.0]];
        let labels: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            train_loop(&mut network, &inputs, &labels, &config, &mut rng),
            Err(Error::ShapeMismatch { expected: 1, actual: 0 })
        ));
        let wide = vec![vec![0.0, 1.0, 2.0]];
        let labels = vec![vec![1.0]];
        assert!(matches!(
            train_loop(&mut network, &wide, &labels, &config, &mut rng),
            Err(Error::ShapeMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn runs_every_epoch_and_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut network = tiny_network(&mut rng);
        // OR gate.
        let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let labels = vec![[0.0], [1.0], [1.0], [1.0]];
        let config = TrainConfig { epochs: 300, batch_size: 2, learning_rate: 0.05, seed: None };

        let history = train_loop(&mut network, &inputs, &labels, &config, &mut rng).unwrap();
        assert_eq!(history.len(), 300);
        assert_eq!(history.last().unwrap().epoch, 300);
        assert_eq!(history[0].optimizer_steps, 2);
        assert!(history.last().unwrap().train_loss < history[0].train_loss);
        assert!(network.forward(&[0.0, 0.0])[0] < 0.5);
        assert!(network.forward(&[1.0, 1.0])[0] > 0.5);
    }
}
