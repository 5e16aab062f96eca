use crate::layers::dense::{Layer, LayerGradients};

/// Adam optimizer (Kingma & Ba) with a fixed learning rate.
///
/// Moment estimates are allocated lazily on the first `step`, one pair per
/// layer, so the same optimizer must keep driving the same network.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: u64,
    moments: Vec<Moments>,
}

struct Moments {
    m_w: Vec<f64>,
    v_w: Vec<f64>,
    m_b: Vec<f64>,
    v_b: Vec<f64>,
}

impl Moments {
    fn zeros_like(layer: &Layer) -> Moments {
        Moments {
            m_w: vec![0.0; layer.weights.data.len()],
            v_w: vec![0.0; layer.weights.data.len()],
            m_b: vec![0.0; layer.biases.len()],
            v_b: vec![0.0; layer.biases.len()],
        }
    }
}

impl Adam {
    /// Standard betas (0.9, 0.999); epsilon 1e-7.
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
            moments: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// Applies one update to every layer from its averaged gradients.
    pub fn step(&mut self, layers: &mut [Layer], grads: &[LayerGradients]) {
        assert_eq!(layers.len(), grads.len(), "one gradient set per layer");
        if self.moments.len() != layers.len() {
            self.moments = layers.iter().map(Moments::zeros_like).collect();
        }
        self.t += 1;
        let t = self.t as i32;
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for ((layer, g), m) in layers.iter_mut().zip(grads).zip(self.moments.iter_mut()) {
            update(&mut layer.weights.data, &g.weights.data, &mut m.m_w, &mut m.v_w,
                   self.beta1, self.beta2, self.epsilon, lr_t);
            update(&mut layer.biases, &g.biases, &mut m.m_b, &mut m.v_b,
                   self.beta1, self.beta2, self.epsilon, lr_t);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update(
    params: &mut [f64],
    grads: &[f64],
    m: &mut [f64],
    v: &mut [f64],
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    lr_t: f64,
) {
    for (((p, &g), m), v) in params.iter_mut().zip(grads).zip(m.iter_mut()).zip(v.iter_mut()) {
        *m = beta1 * *m + (1.0 - beta1) * g;
        *v = beta2 * *v + (1.0 - beta2) * g * g;
        *p -= lr_t * *m / (v.sqrt() + epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::math::matrix::Matrix;

    fn single_weight_layer(w: f64) -> Layer {
        Layer {
            size: 1,
            input_size: 1,
            weights: Matrix { rows: 1, cols: 1, data: vec![w] },
            biases: vec![0.0],
            activator: ActivationFunction::Sigmoid,
        }
    }

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut layers = vec![single_weight_layer(1.0)];
        let mut grads = vec![LayerGradients::zeros_like(&layers[0])];
        grads[0].weights.data[0] = 42.0;
        let mut adam = Adam::new(0.01);
        adam.step(&mut layers, &grads);
        // Bias-corrected first step is ±lr regardless of gradient scale.
        assert!((layers[0].weights.data[0] - 0.99).abs() < 1e-6);
        assert_eq!(layers[0].biases[0], 0.0);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn minimizes_a_quadratic() {
        // L(w) = (w - 3)^2
        let mut layers = vec![single_weight_layer(-2.0)];
        let mut adam = Adam::new(0.1);
        for _ in 0..500 {
            let w = layers[0].weights.data[0];
            let mut grads = vec![LayerGradients::zeros_like(&layers[0])];
            grads[0].weights.data[0] = 2.0 * (w - 3.0);
            adam.step(&mut layers, &grads);
        }
        assert!((layers[0].weights.data[0] - 3.0).abs() < 0.05);
    }
}
