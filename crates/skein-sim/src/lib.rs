//! World model for the Skein bird simulation.
//!
//! The world is a unit torus populated by [`Bird`]s and [`Food`]; one tick
//! resolves collisions, runs every brain, then moves every bird, in that
//! fixed order. The [`simulation`] module drives ticks and the generation
//! loop; [`bird`] holds the agent, its eye, and its network-backed brain.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bird;
pub mod simulation;

pub use bird::{Bird, BirdIndividual, Brain, Eye};
pub use simulation::{CollisionEvent, CollisionReceiver, Evolution, GenerationStatistics, Simulation};

use skein_genetic::GeneticError;
use skein_neural::NetworkError;

const TAU: f32 = std::f32::consts::TAU;

/// Errors raised by the simulation layer.
///
/// Every variant is an invalid-argument condition caught at the boundary of
/// the offending operation; nothing is silently corrected.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A configuration field is outside its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A foreign network does not match the configured brain topology.
    #[error("network does not match the configured brain topology")]
    TopologyMismatch,
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Genetic(#[from] GeneticError),
}

/// Wraps an angle into `[0, 2π)`.
#[inline]
fn wrap_rotation(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

/// Wraps an angle into `(-π, π]`.
#[inline]
fn wrap_relative_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > std::f32::consts::PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Point or displacement in the unit-square world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Constructs a vector from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Uniform random point in `[0, 1) × [0, 1)`.
    #[must_use]
    pub fn random(rng: &mut dyn RngCore) -> Self {
        Self {
            x: rng.random::<f32>(),
            y: rng.random::<f32>(),
        }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(&self, other: Self) -> f32 {
        (*self - other).length()
    }

    /// Wraps both coordinates back into `[0, 1)` (toroidal world).
    #[must_use]
    pub fn wrap(&self) -> Self {
        Self {
            x: self.x.rem_euclid(1.0),
            y: self.y.rem_euclid(1.0),
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Static configuration for one simulation instance.
///
/// Plain numerics only; [`Config::validate`] enforces the documented ranges
/// (probabilities in `[0, 1]`, `min <= max`, positive counts and radii).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of birds spawned per generation.
    pub world_animals: usize,
    /// Number of food items kept in the world.
    pub world_foods: usize,
    /// Bird collision radius in world units.
    pub bird_size: f32,
    /// Food collision radius in world units.
    pub food_size: f32,
    /// Maximum distance at which food registers on the eye.
    pub eye_fov_range: f32,
    /// Angular width of the field of view, in radians.
    pub eye_fov_angle: f32,
    /// Number of buckets in the vision vector.
    pub eye_cells: usize,
    /// Hidden-layer neuron count of the brain network.
    pub brain_neurons: usize,
    /// Lower speed clamp.
    pub sim_speed_min: f32,
    /// Upper speed clamp.
    pub sim_speed_max: f32,
    /// Per-tick speed change limit.
    pub sim_speed_accel: f32,
    /// Per-tick rotation change limit, in radians.
    pub sim_rotation_accel: f32,
    /// Ticks per generation.
    pub sim_generation_length: u32,
    /// Per-gene Gaussian mutation probability.
    pub ga_mut_chance: f32,
    /// Gaussian mutation magnitude bound.
    pub ga_mut_coeff: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_animals: 40,
            world_foods: 60,
            bird_size: 0.005,
            food_size: 0.005,
            eye_fov_range: 0.25,
            eye_fov_angle: std::f32::consts::PI + std::f32::consts::FRAC_PI_4,
            eye_cells: 9,
            brain_neurons: 9,
            sim_speed_min: 0.001,
            sim_speed_max: 0.005,
            sim_speed_accel: 0.2,
            sim_rotation_accel: std::f32::consts::FRAC_PI_2,
            sim_generation_length: 2_500,
            ga_mut_chance: 0.01,
            ga_mut_coeff: 0.3,
        }
    }
}

impl Config {
    /// Validates every field against its documented range.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.world_animals == 0 {
            return Err(SimulationError::InvalidConfig(
                "world_animals must be at least 1",
            ));
        }
        if self.world_foods == 0 {
            return Err(SimulationError::InvalidConfig(
                "world_foods must be at least 1",
            ));
        }
        if self.bird_size < 0.0 || self.food_size < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "collision radii must be non-negative",
            ));
        }
        if self.eye_fov_range <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "eye_fov_range must be positive",
            ));
        }
        if self.eye_fov_angle <= 0.0 || self.eye_fov_angle > TAU {
            return Err(SimulationError::InvalidConfig(
                "eye_fov_angle must lie within (0, 2*pi]",
            ));
        }
        if self.eye_cells == 0 {
            return Err(SimulationError::InvalidConfig(
                "eye_cells must be at least 1",
            ));
        }
        if self.brain_neurons == 0 {
            return Err(SimulationError::InvalidConfig(
                "brain_neurons must be at least 1",
            ));
        }
        if self.sim_speed_min < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "sim_speed_min must be non-negative",
            ));
        }
        if self.sim_speed_min > self.sim_speed_max {
            return Err(SimulationError::InvalidConfig(
                "sim_speed_min must not exceed sim_speed_max",
            ));
        }
        if self.sim_speed_accel < 0.0 || self.sim_rotation_accel < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "acceleration limits must be non-negative",
            ));
        }
        if self.sim_generation_length == 0 {
            return Err(SimulationError::InvalidConfig(
                "sim_generation_length must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.ga_mut_chance) {
            return Err(SimulationError::InvalidConfig(
                "ga_mut_chance must lie within [0, 1]",
            ));
        }
        if self.ga_mut_coeff < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "ga_mut_coeff must be non-negative",
            ));
        }
        Ok(())
    }

    /// Network layer widths implied by this configuration: eye cells in,
    /// hidden layer, two control outputs.
    #[must_use]
    pub fn brain_topology(&self) -> [usize; 3] {
        [self.eye_cells, self.brain_neurons, 2]
    }
}

/// A food item; only its position evolves, by relocation on consumption or
/// at a generation reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
    position: Vec2,
}

impl Food {
    /// Places food at the given position.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self { position }
    }

    /// Places food at a uniform random position.
    #[must_use]
    pub fn random(rng: &mut dyn RngCore) -> Self {
        Self {
            position: Vec2::random(rng),
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn relocate(&mut self, rng: &mut dyn RngCore) {
        self.position = Vec2::random(rng);
    }
}

/// Owned arena of birds and food.
///
/// The world is the sole mutator of both collections; external views are
/// read-only slices that never outlive a tick.
#[derive(Debug, Default)]
pub struct World {
    birds: Vec<Bird>,
    foods: Vec<Food>,
}

impl World {
    /// Populates a world with randomly placed birds and food.
    pub fn random(config: &Config, rng: &mut dyn RngCore) -> Result<Self, SimulationError> {
        let mut world = Self::default();
        for _ in 0..config.world_animals {
            world.birds.push(Bird::random(config, rng)?);
        }
        for _ in 0..config.world_foods {
            world.foods.push(Food::random(rng));
        }
        Ok(world)
    }

    /// Read-only view of the birds.
    #[must_use]
    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    /// Read-only view of the food.
    #[must_use]
    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    /// Adds a bird.
    pub fn add_bird(&mut self, bird: Bird) {
        self.birds.push(bird);
    }

    /// Adds a food item.
    pub fn add_food(&mut self, food: Food) {
        self.foods.push(food);
    }

    /// Removes every bird, e.g. ahead of a generation swap.
    pub fn clear_birds(&mut self) {
        self.birds.clear();
    }

    /// Removes every food item.
    pub fn clear_foods(&mut self) {
        self.foods.clear();
    }

    pub(crate) fn birds_mut(&mut self) -> &mut [Bird] {
        &mut self.birds
    }

    pub(crate) fn foods_mut(&mut self) -> &mut [Food] {
        &mut self.foods
    }
}
