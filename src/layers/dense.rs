use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = f(x · W + b)`.
///
/// The layer holds parameters only. Forward passes take `&self` and hand
/// intermediate values back to the caller, so one layer can serve many
/// threads at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

/// Values from one forward pass that backprop needs.
#[derive(Debug, Clone)]
pub struct LayerTrace {
    /// Pre-activation `z = x · W + b`.
    pub pre_activation: Vec<f64>,
    pub output: Vec<f64>,
}

/// Gradient storage shaped like a layer's parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl LayerGradients {
    pub fn zeros_like(layer: &Layer) -> LayerGradients {
        LayerGradients {
            weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            biases: vec![0.0; layer.biases.len()],
        }
    }

    pub fn reset(&mut self) {
        self.weights.fill(0.0);
        self.biases.iter_mut().for_each(|b| *b = 0.0);
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights.scale(factor);
        self.biases.iter_mut().for_each(|b| *b *= factor);
    }
}

impl Layer {
    /// He-initialized weights for ReLU layers, Xavier otherwise; zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, rng),
            _ => Matrix::xavier(input_size, size, rng),
        };
        Layer {
            size,
            input_size,
            weights,
            biases: vec![0.0; size],
            activator: activation,
        }
    }

    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.pre_activation(input)
            .into_iter()
            .map(|z| self.activator.function(z))
            .collect()
    }

    pub fn forward_trace(&self, input: &[f64]) -> LayerTrace {
        let pre_activation = self.pre_activation(input);
        let output = pre_activation.iter().map(|&z| self.activator.function(z)).collect();
        LayerTrace { pre_activation, output }
    }

    fn pre_activation(&self, input: &[f64]) -> Vec<f64> {
        let mut z = self.weights.vec_mul(input);
        for (zi, b) in z.iter_mut().zip(&self.biases) {
            *zi += b;
        }
        z
    }

    /// Accumulates this layer's gradients for one sample into `grads`.
    ///
    /// `grad_output` is ∂L/∂a for this layer. Returns ∂L/∂x for the previous
    /// layer when `want_input_grad` is set, an empty vector otherwise.
    pub fn backward(
        &self,
        input: &[f64],
        trace: &LayerTrace,
        grad_output: &[f64],
        grads: &mut LayerGradients,
        want_input_grad: bool,
    ) -> Vec<f64> {
        // δ = ∂L/∂a ⊙ f'(z)
        let delta: Vec<f64> = grad_output
            .iter()
            .zip(&trace.pre_activation)
            .map(|(g, &z)| g * self.activator.derivative(z))
            .collect();

        grads.weights.add_outer(input, &delta);
        for (gb, d) in grads.biases.iter_mut().zip(&delta) {
            *gb += d;
        }

        if want_input_grad {
            self.weights.mul_vec(&delta)
        } else {
            Vec::new()
        }
    }

    /// True when weight and bias shapes agree with `size` and `input_size`.
    pub fn is_well_formed(&self) -> bool {
        self.weights.is_consistent()
            && self.weights.rows == self.input_size
            && self.weights.cols == self.size
            && self.biases.len() == self.size
    }
}
