//! Tick driver and generation loop.
//!
//! [`Simulation`] owns the world and advances it one tick at a time;
//! [`Evolution`] counts ticks and swaps in an evolved population at each
//! generation boundary. Collision observers attach through a bounded
//! channel and never block the tick loop.

use crossfire::mpmc;
use crossfire::{MRx, MTx, TrySendError, detect_backoff_cfg};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use skein_genetic::{
    GaussianMutation, GeneticAlgorithm, RouletteWheelSelection, Statistics, UniformCrossover,
};

use crate::bird::{Bird, BirdIndividual};
use crate::{Config, Food, SimulationError, Vec2, World};

/// One bird-food contact, captured before the food is relocated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Bird position at the moment of contact.
    pub bird_position: Vec2,
    /// Bird heading at the moment of contact.
    pub bird_rotation: f32,
    /// Bird satiation after this contact.
    pub bird_satiation: u32,
    /// Where the food sat when it was eaten.
    pub food_position: Vec2,
    /// Centre distance between the pair.
    pub distance: f32,
}

/// Receiving end of a collision subscription.
pub type CollisionReceiver = MRx<CollisionEvent>;

/// Fitness summary of one finished generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    /// Zero-based index of the generation that just ended.
    pub generation: u32,
    /// Fitness distribution of the population that lived through it.
    pub statistics: Statistics,
}

/// A world plus the configuration that shaped it.
pub struct Simulation {
    config: Config,
    world: World,
    collision_taps: Vec<MTx<CollisionEvent>>,
}

impl Simulation {
    /// Builds a randomly populated simulation after validating `config`.
    pub fn new(config: Config, rng: &mut dyn RngCore) -> Result<Self, SimulationError> {
        config.validate()?;
        let world = World::random(&config, rng)?;
        Ok(Self {
            config,
            world,
            collision_taps: Vec::new(),
        })
    }

    /// The configuration this simulation was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only view of the birds.
    #[must_use]
    pub fn birds(&self) -> &[Bird] {
        self.world.birds()
    }

    /// Read-only view of the food.
    #[must_use]
    pub fn foods(&self) -> &[Food] {
        self.world.foods()
    }

    /// Adds one bird to the world.
    pub fn add_bird(&mut self, bird: Bird) {
        self.world.add_bird(bird);
    }

    /// Adds one food item to the world.
    pub fn add_food(&mut self, food: Food) {
        self.world.add_food(food);
    }

    /// Adds `count` randomly placed food items.
    pub fn add_foods(&mut self, count: usize, rng: &mut dyn RngCore) {
        for _ in 0..count {
            self.world.add_food(Food::random(rng));
        }
    }

    /// Removes every bird.
    pub fn clear_birds(&mut self) {
        self.world.clear_birds();
    }

    /// Removes every food item.
    pub fn clear_foods(&mut self) {
        self.world.clear_foods();
    }

    /// Attaches a collision observer over a bounded channel.
    ///
    /// Publishing never blocks: when a subscriber's queue is full the event
    /// is dropped for that subscriber, and disconnected subscribers are
    /// pruned on the next publish.
    pub fn subscribe_collisions(&mut self, capacity: usize) -> CollisionReceiver {
        detect_backoff_cfg();
        let (tx, rx) = mpmc::bounded_blocking(capacity);
        self.collision_taps.push(tx);
        rx
    }

    /// Advances the world one tick: collisions, then brains, then movement.
    pub fn update(&mut self, rng: &mut dyn RngCore) -> Result<(), SimulationError> {
        self.process_collisions(rng);
        self.process_brains()?;
        self.process_movements();
        Ok(())
    }

    /// Resolves bird-food contacts against food positions snapshotted at
    /// the start of the phase, so every bird sees the same layout and two
    /// birds may eat the same food in one tick.
    fn process_collisions(&mut self, rng: &mut dyn RngCore) {
        let contact_distance = self.config.bird_size + self.config.food_size;
        let snapshot: Vec<Vec2> = self.world.foods().iter().map(Food::position).collect();

        let mut events = Vec::new();
        for bird in self.world.birds_mut() {
            for (index, &food_position) in snapshot.iter().enumerate() {
                let distance = bird.position().distance(food_position);
                if distance <= contact_distance {
                    bird.eat();
                    events.push((index, CollisionEvent {
                        bird_position: bird.position(),
                        bird_rotation: bird.rotation(),
                        bird_satiation: bird.satiation(),
                        food_position,
                        distance,
                    }));
                }
            }
        }

        for (index, event) in events {
            self.world.foods_mut()[index].relocate(rng);
            self.publish_collision(event);
        }
    }

    fn publish_collision(&mut self, event: CollisionEvent) {
        self.collision_taps.retain(|tap| match tap.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("collision subscriber queue full; dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    fn process_brains(&mut self) -> Result<(), SimulationError> {
        // Vision also works on a snapshot; the collision phase has already
        // settled this tick's food layout.
        let foods = self.world.foods().to_vec();
        for bird in self.world.birds_mut() {
            bird.process_brain(&foods, &self.config)?;
        }
        Ok(())
    }

    fn process_movements(&mut self) {
        for bird in self.world.birds_mut() {
            bird.process_movement();
        }
    }
}

/// Generation counter wrapped around a [`Simulation`].
pub struct Evolution {
    simulation: Simulation,
    age: u32,
    generation: u32,
}

impl Evolution {
    /// Starts an evolution run at generation zero.
    pub fn new(config: Config, rng: &mut dyn RngCore) -> Result<Self, SimulationError> {
        let simulation = Simulation::new(config, rng)?;
        Ok(Self {
            simulation,
            age: 0,
            generation: 0,
        })
    }

    /// The underlying simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Mutable access to the underlying simulation, e.g. for subscriptions.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Ticks completed within the current generation.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Completed generation count.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Runs one tick; at the generation boundary, evolves the population
    /// and reports the finished generation's fitness statistics.
    pub fn step(
        &mut self,
        rng: &mut dyn RngCore,
    ) -> Result<Option<GenerationStatistics>, SimulationError> {
        self.simulation.update(rng)?;
        self.age += 1;

        if self.age >= self.simulation.config.sim_generation_length {
            return self.evolve(rng).map(Some);
        }
        Ok(None)
    }

    /// Runs ticks until the current generation finishes.
    pub fn train(&mut self, rng: &mut dyn RngCore) -> Result<GenerationStatistics, SimulationError> {
        loop {
            if let Some(statistics) = self.step(rng)? {
                return Ok(statistics);
            }
        }
    }

    fn evolve(&mut self, rng: &mut dyn RngCore) -> Result<GenerationStatistics, SimulationError> {
        let config = self.simulation.config.clone();

        let population: Vec<BirdIndividual> = self
            .simulation
            .birds()
            .iter()
            .map(BirdIndividual::from_bird)
            .collect();

        let statistics = if population.is_empty() {
            // A manually emptied world restarts from random stock instead of
            // failing the whole run; the reported fitness is uniformly zero.
            debug!("no birds to evolve; substituting random stock");
            for _ in 0..config.world_animals {
                let bird = Bird::random(&config, rng)?;
                self.simulation.world.add_bird(bird);
            }
            Statistics::from_fitnesses(&vec![0.0; config.world_animals])?
        } else {
            let algorithm = GeneticAlgorithm::new(
                Box::new(RouletteWheelSelection),
                Box::new(UniformCrossover),
                Box::new(GaussianMutation::new(
                    config.ga_mut_chance,
                    config.ga_mut_coeff,
                )?),
                Box::new(BirdIndividual::new),
            );
            let (evolved, statistics) = algorithm.evolve(rng, &population)?;

            self.simulation.world.clear_birds();
            for individual in evolved {
                let bird = individual.into_bird(&config, rng)?;
                self.simulation.world.add_bird(bird);
            }
            statistics
        };
        for food in self.simulation.world.foods_mut() {
            food.relocate(rng);
        }

        let report = GenerationStatistics {
            generation: self.generation,
            statistics,
        };
        info!(
            generation = report.generation,
            max = statistics.max_fitness(),
            avg = statistics.avg_fitness(),
            median = statistics.median_fitness(),
            "generation finished"
        );

        self.age = 0;
        self.generation += 1;
        Ok(report)
    }
}
