//! The bird agent: angular eye, network-backed brain, per-tick state.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use skein_genetic::{Chromosome, Individual};
use skein_neural::Network;

use crate::{Config, Food, SimulationError, Vec2, wrap_relative_angle, wrap_rotation};

/// Angular sensor summarising nearby food into a fixed-size vision vector.
///
/// The summary is lossy on purpose: each food inside the field of view adds
/// a distance-weighted contribution to exactly one angular bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eye {
    fov_range: f32,
    fov_angle: f32,
    cells: usize,
}

impl Eye {
    /// Builds an eye from the configured field of view.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            fov_range: config.eye_fov_range,
            fov_angle: config.eye_fov_angle,
            cells: config.eye_cells,
        }
    }

    /// Number of buckets in the produced vision vector.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.cells
    }

    /// Projects `foods` onto the vision vector as seen from `position`
    /// facing `rotation` (0 rad is "up", angles grow counter-clockwise).
    #[must_use]
    pub fn process_vision(&self, position: Vec2, rotation: f32, foods: &[Food]) -> Vec<f32> {
        let mut vision = vec![0.0f32; self.cells];
        let half_fov = self.fov_angle / 2.0;

        for food in foods {
            let vec = food.position() - position;
            let distance = vec.length();
            if distance > self.fov_range {
                continue;
            }

            // Angle relative to "up", then relative to where the bird faces.
            let angle = wrap_relative_angle(vec.x.atan2(vec.y) - rotation);
            if angle < -half_fov || angle > half_fov {
                continue;
            }

            let fraction = (angle + half_fov) / self.fov_angle;
            let cell = ((fraction * self.cells as f32) as usize).min(self.cells - 1);
            vision[cell] += (self.fov_range - distance) / self.fov_range;
        }

        vision
    }
}

/// Network wrapper translating vision into speed and rotation deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    network: Network,
    speed_accel: f32,
    rotation_accel: f32,
}

impl Brain {
    /// Randomly initialised brain with the configured topology.
    pub fn random(rng: &mut dyn RngCore, config: &Config) -> Result<Self, SimulationError> {
        let network = Network::random(rng, &config.brain_topology())?;
        Ok(Self::wrap(network, config))
    }

    /// Rebuilds a brain from a flat-weight chromosome.
    pub fn from_chromosome(
        chromosome: &Chromosome,
        config: &Config,
    ) -> Result<Self, SimulationError> {
        let network = Network::from_weights(&config.brain_topology(), chromosome.genes())?;
        Ok(Self::wrap(network, config))
    }

    /// Wraps a foreign network after structurally validating its topology.
    pub fn from_network(network: Network, config: &Config) -> Result<Self, SimulationError> {
        if !network.matches_topology(&config.brain_topology()) {
            return Err(SimulationError::TopologyMismatch);
        }
        Ok(Self::wrap(network, config))
    }

    fn wrap(network: Network, config: &Config) -> Self {
        Self {
            network,
            speed_accel: config.sim_speed_accel,
            rotation_accel: config.sim_rotation_accel,
        }
    }

    /// Maps vision to `(Δspeed, Δrotation)`.
    ///
    /// Both raw outputs are clamped to `[0, 1]` and shifted by −0.5; their
    /// sum and difference then express speed and turn decisions
    /// independently, each clamped to its acceleration limit.
    pub fn process_inputs(&self, vision: &[f32]) -> Result<(f32, f32), SimulationError> {
        let response = self.network.propagate(vision)?;

        // The topology invariably ends in a width-2 layer.
        let r0 = response[0].clamp(0.0, 1.0) - 0.5;
        let r1 = response[1].clamp(0.0, 1.0) - 0.5;

        let speed = (r0 + r1).clamp(-self.speed_accel, self.speed_accel);
        let rotation = (r0 - r1).clamp(-self.rotation_accel, self.rotation_accel);
        Ok((speed, rotation))
    }

    /// Flattens the brain into its genetic representation.
    #[must_use]
    pub fn as_chromosome(&self) -> Chromosome {
        Chromosome::new(self.network.weights())
    }
}

/// One simulated bird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    position: Vec2,
    previous_position: Vec2,
    rotation: f32,
    speed: f32,
    satiation: u32,
    vision: Vec<f32>,
    eye: Eye,
    brain: Brain,
}

impl Bird {
    /// Places a bird with the given brain at `position`, facing up at top
    /// speed.
    #[must_use]
    pub fn new(brain: Brain, position: Vec2, config: &Config) -> Self {
        Self {
            position,
            previous_position: position,
            rotation: 0.0,
            speed: config.sim_speed_max,
            satiation: 0,
            vision: vec![0.0; config.eye_cells],
            eye: Eye::new(config),
            brain,
        }
    }

    /// Random bird: random brain, position, and rotation.
    pub fn random(config: &Config, rng: &mut dyn RngCore) -> Result<Self, SimulationError> {
        let brain = Brain::random(rng, config)?;
        let mut bird = Self::new(brain, Vec2::random(rng), config);
        bird.rotation = rng.random::<f32>() * std::f32::consts::TAU;
        Ok(bird)
    }

    /// Bird rebuilt from an evolved chromosome, at a fresh random pose.
    pub fn from_chromosome(
        config: &Config,
        rng: &mut dyn RngCore,
        chromosome: &Chromosome,
    ) -> Result<Self, SimulationError> {
        let brain = Brain::from_chromosome(chromosome, config)?;
        let mut bird = Self::new(brain, Vec2::random(rng), config);
        bird.rotation = rng.random::<f32>() * std::f32::consts::TAU;
        Ok(bird)
    }

    /// Current position in the unit square.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Position before the most recent movement step.
    #[must_use]
    pub const fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    /// Heading in `[0, 2π)`; 0 rad points up.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Current speed within the configured clamps.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Food eaten so far; doubles as fitness.
    #[must_use]
    pub const fn satiation(&self) -> u32 {
        self.satiation
    }

    /// Vision vector cached from the latest brain step.
    #[must_use]
    pub fn vision(&self) -> &[f32] {
        &self.vision
    }

    /// Flattens the bird's brain into a chromosome.
    #[must_use]
    pub fn as_chromosome(&self) -> Chromosome {
        self.brain.as_chromosome()
    }

    /// Registers one food contact.
    pub(crate) fn eat(&mut self) {
        self.satiation += 1;
    }

    /// Senses `foods`, runs the brain, and integrates speed and rotation.
    pub(crate) fn process_brain(
        &mut self,
        foods: &[Food],
        config: &Config,
    ) -> Result<(), SimulationError> {
        self.vision = self.eye.process_vision(self.position, self.rotation, foods);
        let (speed_delta, rotation_delta) = self.brain.process_inputs(&self.vision)?;

        self.speed =
            (self.speed + speed_delta).clamp(config.sim_speed_min, config.sim_speed_max);
        self.rotation = wrap_rotation(self.rotation + rotation_delta);
        Ok(())
    }

    /// Moves along the current heading and wraps around the torus.
    pub(crate) fn process_movement(&mut self) {
        self.previous_position = self.position;

        // 0 rad faces up and grows counter-clockwise; convert to the math
        // convention before taking cos/sin.
        let math_angle = std::f32::consts::FRAC_PI_2 - self.rotation;
        let step = Vec2::new(math_angle.cos(), math_angle.sin()) * self.speed;
        self.position = (self.position + step).wrap();
    }
}

/// Snapshot of a bird as a fitness-bearing individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdIndividual {
    chromosome: Chromosome,
    fitness: f32,
}

impl BirdIndividual {
    /// Wraps an evolved chromosome; children start at zero fitness.
    #[must_use]
    pub fn new(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            fitness: 0.0,
        }
    }

    /// Snapshots a live bird, capturing satiation as fitness.
    #[must_use]
    pub fn from_bird(bird: &Bird) -> Self {
        Self {
            chromosome: bird.as_chromosome(),
            fitness: bird.satiation() as f32,
        }
    }

    /// Materialises the individual back into a bird at a random pose.
    pub fn into_bird(
        self,
        config: &Config,
        rng: &mut dyn RngCore,
    ) -> Result<Bird, SimulationError> {
        Bird::from_chromosome(config, rng, &self.chromosome)
    }
}

impl Individual for BirdIndividual {
    fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    fn test_config() -> Config {
        Config::default()
    }

    fn food_at(x: f32, y: f32) -> Food {
        Food::at(Vec2::new(x, y))
    }

    /// Brain whose network is all zeros: every output rectifies to 0, so the
    /// clamped-and-shifted responses are both -0.5, giving a maximal
    /// deceleration and no turn.
    fn zero_brain(config: &Config) -> Brain {
        let weights = vec![0.0; skein_neural::parameter_count(&config.brain_topology())];
        Brain::from_chromosome(&Chromosome::new(weights), config).expect("brain")
    }

    #[test]
    fn eye_sees_food_straight_ahead_in_centre_cell() {
        let config = test_config();
        let eye = Eye::new(&config);
        let vision = eye.process_vision(
            Vec2::new(0.5, 0.5),
            0.0,
            &[food_at(0.5, 0.6)],
        );

        let centre = config.eye_cells / 2;
        assert!(vision[centre] > 0.0, "vision was {vision:?}");
        for (index, value) in vision.iter().enumerate() {
            if index != centre {
                assert_eq!(*value, 0.0);
            }
        }
        // Weight grows as distance shrinks: 0.1 away inside a 0.25 range.
        assert!((vision[centre] - 0.6).abs() < 1e-5);
    }

    #[test]
    fn eye_ignores_food_out_of_range() {
        let config = test_config();
        let eye = Eye::new(&config);
        let vision = eye.process_vision(Vec2::new(0.1, 0.1), 0.0, &[food_at(0.9, 0.9)]);
        assert!(vision.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn eye_ignores_food_behind_the_bird() {
        let config = test_config();
        let eye = Eye::new(&config);
        // Directly behind: relative angle is exactly pi, outside the fov.
        let vision = eye.process_vision(Vec2::new(0.5, 0.5), 0.0, &[food_at(0.5, 0.4)]);
        assert!(vision.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn eye_rotation_shifts_the_perceived_bucket() {
        let config = test_config();
        let eye = Eye::new(&config);
        let food = [food_at(0.6, 0.5)]; // due "right" of the bird

        // Facing up, food sits at +pi/2, in the right half of the view.
        let facing_up = eye.process_vision(Vec2::new(0.5, 0.5), 0.0, &food);
        // Facing right, the same food is dead ahead.
        let facing_right = eye.process_vision(Vec2::new(0.5, 0.5), FRAC_PI_2, &food);

        let centre = config.eye_cells / 2;
        assert!(facing_right[centre] > 0.0);
        let up_bucket = facing_up.iter().position(|&v| v > 0.0).expect("visible");
        assert!(up_bucket > centre);
    }

    #[test]
    fn eye_accumulates_multiple_foods_additively() {
        let config = test_config();
        let eye = Eye::new(&config);
        let one = eye.process_vision(Vec2::new(0.5, 0.5), 0.0, &[food_at(0.5, 0.6)]);
        let two = eye.process_vision(
            Vec2::new(0.5, 0.5),
            0.0,
            &[food_at(0.5, 0.6), food_at(0.5, 0.6)],
        );
        let centre = config.eye_cells / 2;
        assert!((two[centre] - 2.0 * one[centre]).abs() < 1e-6);
    }

    #[test]
    fn eye_clamps_boundary_angle_to_last_cell() {
        let config = Config {
            eye_fov_angle: PI,
            eye_cells: 4,
            ..test_config()
        };
        let eye = Eye::new(&config);
        // Food exactly on the +fov/2 edge maps to the last bucket instead of
        // falling off the end.
        let vision = eye.process_vision(Vec2::new(0.5, 0.5), 0.0, &[food_at(0.6, 0.5)]);
        assert!(vision[3] > 0.0, "vision was {vision:?}");
    }

    #[test]
    fn zero_brain_decelerates_without_turning() {
        let config = test_config();
        let brain = zero_brain(&config);
        let (speed_delta, rotation_delta) = brain
            .process_inputs(&vec![0.0; config.eye_cells])
            .expect("processed");
        assert_eq!(rotation_delta, 0.0);
        assert_eq!(speed_delta, -config.sim_speed_accel);
    }

    #[test]
    fn brain_clamps_deltas_to_acceleration_limits() {
        let config = Config {
            sim_speed_accel: 0.05,
            sim_rotation_accel: 0.1,
            ..test_config()
        };
        let brain = zero_brain(&config);
        let (speed_delta, rotation_delta) = brain
            .process_inputs(&vec![0.0; config.eye_cells])
            .expect("processed");
        assert_eq!(speed_delta, -0.05);
        assert_eq!(rotation_delta, 0.0);
        assert!(speed_delta.abs() <= config.sim_speed_accel);
        assert!(rotation_delta.abs() <= config.sim_rotation_accel);
    }

    #[test]
    fn brain_from_network_checks_topology() {
        let config = test_config();
        let mut rng = SmallRng::seed_from_u64(0);
        let wrong = skein_neural::Network::random(&mut rng, &[3, 3, 2]).expect("network");
        assert!(matches!(
            Brain::from_network(wrong, &config),
            Err(SimulationError::TopologyMismatch),
        ));

        let right =
            skein_neural::Network::random(&mut rng, &config.brain_topology()).expect("network");
        assert!(Brain::from_network(right, &config).is_ok());
    }

    #[test]
    fn chromosome_round_trip_preserves_the_brain() {
        let config = test_config();
        let mut rng = SmallRng::seed_from_u64(1);
        let bird = Bird::random(&config, &mut rng).expect("bird");

        let chromosome = bird.as_chromosome();
        let rebuilt = Brain::from_chromosome(&chromosome, &config).expect("brain");
        assert_eq!(rebuilt.as_chromosome(), chromosome);
    }

    #[test]
    fn movement_follows_heading_and_wraps() {
        let config = Config {
            sim_speed_min: 0.1,
            sim_speed_max: 0.1,
            ..test_config()
        };
        let mut bird = Bird::new(zero_brain(&config), Vec2::new(0.5, 0.95), &config);

        // Facing up at speed 0.1: crosses the top edge and re-enters.
        bird.process_movement();
        assert!((bird.position().x - 0.5).abs() < 1e-6);
        assert!((bird.position().y - 0.05).abs() < 1e-4);
        assert_eq!(bird.previous_position(), Vec2::new(0.5, 0.95));
    }

    #[test]
    fn process_brain_clamps_speed_and_wraps_rotation() {
        let config = test_config();
        let mut bird = Bird::new(zero_brain(&config), Vec2::new(0.5, 0.5), &config);

        // The zero brain decelerates maximally every tick; speed bottoms out
        // at the configured minimum and never leaves the clamp range.
        for _ in 0..10 {
            bird.process_brain(&[], &config).expect("brain");
            assert!(bird.speed() >= config.sim_speed_min);
            assert!(bird.speed() <= config.sim_speed_max);
            assert!((0.0..TAU).contains(&bird.rotation()));
        }
        assert_eq!(bird.speed(), config.sim_speed_min);
    }

    #[test]
    fn eat_increments_satiation_by_one() {
        let config = test_config();
        let mut bird = Bird::new(zero_brain(&config), Vec2::new(0.5, 0.5), &config);
        assert_eq!(bird.satiation(), 0);
        bird.eat();
        bird.eat();
        assert_eq!(bird.satiation(), 2);
    }

    #[test]
    fn individual_snapshot_captures_satiation_as_fitness() {
        use skein_genetic::Individual as _;

        let config = test_config();
        let mut bird = Bird::new(zero_brain(&config), Vec2::new(0.5, 0.5), &config);
        bird.eat();
        bird.eat();
        bird.eat();

        let individual = BirdIndividual::from_bird(&bird);
        assert_eq!(individual.fitness(), 3.0);
        assert_eq!(*individual.chromosome(), bird.as_chromosome());

        let mut rng = SmallRng::seed_from_u64(2);
        let reborn = individual.clone().into_bird(&config, &mut rng).expect("bird");
        assert_eq!(reborn.satiation(), 0);
        assert_eq!(reborn.as_chromosome(), bird.as_chromosome());
    }
}
