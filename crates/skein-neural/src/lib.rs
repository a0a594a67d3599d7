//! Deterministic feed-forward network used as the evolvable bird brain.
//!
//! The network shares a canonical flat-weight encoding with the genetic
//! representation: per layer, per output neuron, one bias followed by
//! `input_size` weights. [`Network::from_weights`] consumes such a vector
//! strictly in order and [`Network::weights`] flattens back to it, so
//! `from_weights(topology, net.weights())` reconstructs an identical network.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing or driving a network.
///
/// All variants are invalid-argument conditions reported synchronously; no
/// silent truncation or padding ever happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("topology must list at least 2 layer widths, got {layers}")]
    TopologyTooSmall { layers: usize },
    #[error("topology entry {index} has zero width")]
    ZeroWidthLayer { index: usize },
    #[error("weight vector holds {actual} values but the topology requires {expected}")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("expected {expected} inputs, got {actual}")]
    InputWidthMismatch { expected: usize, actual: usize },
}

/// Total parameter count implied by a topology: `Σ (inputs_i + 1) · outputs_i`.
#[must_use]
pub fn parameter_count(topology: &[usize]) -> usize {
    topology
        .windows(2)
        .map(|pair| (pair[0] + 1) * pair[1])
        .sum()
}

fn check_topology(topology: &[usize]) -> Result<(), NetworkError> {
    if topology.len() < 2 {
        return Err(NetworkError::TopologyTooSmall {
            layers: topology.len(),
        });
    }
    for (index, &width) in topology.iter().enumerate() {
        if width == 0 {
            return Err(NetworkError::ZeroWidthLayer { index });
        }
    }
    Ok(())
}

/// One bias plus ordered input weights; immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    bias: f32,
    weights: Vec<f32>,
}

impl Neuron {
    fn new(bias: f32, weights: Vec<f32>) -> Self {
        Self { bias, weights }
    }

    fn random(rng: &mut dyn RngCore, input_size: usize) -> Self {
        let bias = rng.random_range(-1.0..=1.0);
        let weights = (0..input_size)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Self { bias, weights }
    }

    /// Weighted sum plus bias, rectified: `max(0, bias + Σ input·weight)`.
    fn propagate(&self, inputs: &[f32]) -> f32 {
        let sum: f32 = self
            .weights
            .iter()
            .zip(inputs)
            .map(|(weight, input)| weight * input)
            .sum();
        (self.bias + sum).max(0.0)
    }

    /// The neuron's bias.
    #[must_use]
    pub const fn bias(&self) -> f32 {
        self.bias
    }

    /// Copy of the input weights.
    #[must_use]
    pub fn weights(&self) -> Vec<f32> {
        self.weights.clone()
    }
}

/// Fully connected layer; every neuron shares one input width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    neurons: Vec<Neuron>,
}

impl Layer {
    fn random(rng: &mut dyn RngCore, input_size: usize, output_size: usize) -> Self {
        let neurons = (0..output_size)
            .map(|_| Neuron::random(rng, input_size))
            .collect();
        Self { neurons }
    }

    fn from_weights(
        input_size: usize,
        output_size: usize,
        weights: &mut impl Iterator<Item = f32>,
    ) -> Option<Self> {
        let mut neurons = Vec::with_capacity(output_size);
        for _ in 0..output_size {
            let bias = weights.next()?;
            let mut neuron_weights = Vec::with_capacity(input_size);
            for _ in 0..input_size {
                neuron_weights.push(weights.next()?);
            }
            neurons.push(Neuron::new(bias, neuron_weights));
        }
        Some(Self { neurons })
    }

    fn propagate(&self, inputs: &[f32]) -> Vec<f32> {
        self.neurons
            .iter()
            .map(|neuron| neuron.propagate(inputs))
            .collect()
    }

    /// Neurons in output order.
    #[must_use]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }
}

/// Stack of fully connected ReLU layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Builds a network with weights and biases drawn uniformly from
    /// `[-1, 1]`; the topology must list at least two positive widths.
    pub fn random(rng: &mut dyn RngCore, topology: &[usize]) -> Result<Self, NetworkError> {
        check_topology(topology)?;
        let layers = topology
            .windows(2)
            .map(|pair| Layer::random(rng, pair[0], pair[1]))
            .collect();
        Ok(Self { layers })
    }

    /// Reconstructs a network from a flat weight vector.
    ///
    /// The vector is consumed strictly in encoding order and must match the
    /// topology's parameter count exactly.
    pub fn from_weights(topology: &[usize], weights: &[f32]) -> Result<Self, NetworkError> {
        check_topology(topology)?;

        let expected = parameter_count(topology);
        if weights.len() != expected {
            return Err(NetworkError::WeightCountMismatch {
                expected,
                actual: weights.len(),
            });
        }

        let mut cursor = weights.iter().copied();
        let layers = topology
            .windows(2)
            .map(|pair| Layer::from_weights(pair[0], pair[1], &mut cursor))
            .collect::<Option<Vec<_>>>()
            .ok_or(NetworkError::WeightCountMismatch {
                expected,
                actual: weights.len(),
            })?;

        Ok(Self { layers })
    }

    /// Feeds `inputs` through every layer in order.
    pub fn propagate(&self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        let expected = self.input_size();
        if inputs.len() != expected {
            return Err(NetworkError::InputWidthMismatch {
                expected,
                actual: inputs.len(),
            });
        }

        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.propagate(&current);
        }
        Ok(current)
    }

    /// Flattens the network back into its canonical weight vector.
    #[must_use]
    pub fn weights(&self) -> Vec<f32> {
        let mut flat = Vec::new();
        for layer in &self.layers {
            for neuron in &layer.neurons {
                flat.push(neuron.bias);
                flat.extend_from_slice(&neuron.weights);
            }
        }
        flat
    }

    /// Structurally validates layer, neuron, and weight counts against a
    /// topology, e.g. before a foreign network is wrapped as a brain.
    #[must_use]
    pub fn matches_topology(&self, topology: &[usize]) -> bool {
        if topology.len() < 2 || self.layers.len() != topology.len() - 1 {
            return false;
        }
        self.layers.iter().enumerate().all(|(index, layer)| {
            layer.neurons.len() == topology[index + 1]
                && layer
                    .neurons
                    .iter()
                    .all(|neuron| neuron.weights.len() == topology[index])
        })
    }

    /// Input width accepted by the first layer.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers
            .first()
            .and_then(|layer| layer.neurons.first())
            .map_or(0, |neuron| neuron.weights.len())
    }

    /// Layers in propagation order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn parameter_count_follows_topology() {
        assert_eq!(parameter_count(&[9, 9, 2]), (9 + 1) * 9 + (9 + 1) * 2);
        assert_eq!(parameter_count(&[3, 2]), 8);
    }

    #[test]
    fn random_requires_two_layer_widths() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            Network::random(&mut rng, &[4]).unwrap_err(),
            NetworkError::TopologyTooSmall { layers: 1 },
        );
        assert_eq!(
            Network::random(&mut rng, &[4, 0, 2]).unwrap_err(),
            NetworkError::ZeroWidthLayer { index: 1 },
        );
    }

    #[test]
    fn random_draws_parameters_within_unit_range() {
        let mut rng = SmallRng::seed_from_u64(1);
        let network = Network::random(&mut rng, &[5, 4, 3]).expect("network");
        assert_eq!(network.layers().len(), 2);
        for layer in network.layers() {
            for neuron in layer.neurons() {
                assert!(neuron.bias().abs() <= 1.0);
                assert!(neuron.weights().iter().all(|w| w.abs() <= 1.0));
            }
        }
    }

    #[test]
    fn from_weights_rejects_wrong_counts() {
        let too_few = vec![0.0; 7];
        assert_eq!(
            Network::from_weights(&[3, 2], &too_few).unwrap_err(),
            NetworkError::WeightCountMismatch {
                expected: 8,
                actual: 7,
            },
        );
        let too_many = vec![0.0; 9];
        assert_eq!(
            Network::from_weights(&[3, 2], &too_many).unwrap_err(),
            NetworkError::WeightCountMismatch {
                expected: 8,
                actual: 9,
            },
        );
    }

    #[test]
    fn from_weights_consumes_in_declaration_order() {
        // One layer, two neurons over two inputs: bias then weights each.
        let weights = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let network = Network::from_weights(&[2, 2], &weights).expect("network");
        let layer = &network.layers()[0];
        assert_eq!(layer.neurons()[0].bias(), 0.1);
        assert_eq!(layer.neurons()[0].weights(), vec![0.2, 0.3]);
        assert_eq!(layer.neurons()[1].bias(), 0.4);
        assert_eq!(layer.neurons()[1].weights(), vec![0.5, 0.6]);
    }

    #[test]
    fn flat_weight_round_trip_is_exact() {
        let mut rng = SmallRng::seed_from_u64(2);
        let topology = [9, 9, 2];
        let network = Network::random(&mut rng, &topology).expect("network");

        let flat = network.weights();
        assert_eq!(flat.len(), parameter_count(&topology));

        let rebuilt = Network::from_weights(&topology, &flat).expect("rebuilt");
        assert_eq!(rebuilt, network);
        assert_eq!(rebuilt.weights(), flat);
    }

    #[test]
    fn propagate_applies_bias_and_relu() {
        // Single neuron: bias 0.5, weights [-0.3, 0.8].
        let network = Network::from_weights(&[2, 1], &[0.5, -0.3, 0.8]).expect("network");

        let active = network.propagate(&[0.5, 1.0]).expect("propagated");
        assert!((active[0] - (0.5 - 0.15 + 0.8)).abs() < 1e-6);

        // Strongly negative sum rectifies to zero.
        let clamped = network.propagate(&[10.0, -10.0]).expect("propagated");
        assert_eq!(clamped[0], 0.0);
    }

    #[test]
    fn propagate_rejects_wrong_input_width() {
        let mut rng = SmallRng::seed_from_u64(3);
        let network = Network::random(&mut rng, &[4, 2]).expect("network");
        assert_eq!(
            network.propagate(&[1.0, 2.0]).unwrap_err(),
            NetworkError::InputWidthMismatch {
                expected: 4,
                actual: 2,
            },
        );
    }

    #[test]
    fn matches_topology_validates_structure() {
        let mut rng = SmallRng::seed_from_u64(4);
        let network = Network::random(&mut rng, &[9, 9, 2]).expect("network");
        assert!(network.matches_topology(&[9, 9, 2]));
        assert!(!network.matches_topology(&[9, 8, 2]));
        assert!(!network.matches_topology(&[9, 9, 2, 1]));
        assert!(!network.matches_topology(&[9]));
    }
}
