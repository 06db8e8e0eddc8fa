//! Genetic algorithm for flight itinerary selection.
//!
//! The genotype is deliberately minimal: a chromosome is a single catalog
//! index, so the search space is exactly the set of candidate flights.
//! Crossover therefore has no internal structure to recombine and collapses
//! to propagating one of two already-fit parents; mutation (uniform
//! replacement) is the only source of diversity beyond initialization.
//! Replacement is wholesale and non-elitist: only the final generation's
//! best is reported.

use crate::catalog::{FlightCatalog, FlightRecord};
use crate::error::OptimizeError;
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A chromosome: the id of one catalog record.
pub type FlightId = usize;

/// Penalized cost of a chromosome. Lower is better.
pub type Fitness = u32;

/// Default disutility of one layover, in currency units.
pub const STOP_PENALTY: u32 = 1000;

/// Genetic algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Population size; must be even and at least `tournament_size`.
    pub population_size: usize,
    /// Number of generations; the loop always runs the full budget.
    pub generations: usize,
    /// Probability that an offspring is replaced by a fresh random id.
    pub mutation_rate: f64,
    /// Sample size for tournament selection.
    pub tournament_size: usize,
    /// Currency-unit penalty applied per layover.
    pub stop_penalty: u32,
    /// Random seed
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 500,
            generations: 300,
            mutation_rate: 0.1,
            tournament_size: 5,
            stop_penalty: STOP_PENALTY,
            seed: 42,
        }
    }
}

impl GaConfig {
    /// Validate the configuration. Called once, before generation 0.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.tournament_size == 0 {
            return Err(OptimizeError::Configuration(
                "tournament size must be at least 1".to_string(),
            ));
        }
        if self.population_size % 2 != 0 {
            // An odd population would silently shrink by one each generation
            // (breeding produces two offspring per iteration), so reject it.
            return Err(OptimizeError::Configuration(format!(
                "population size must be even, got {}",
                self.population_size
            )));
        }
        if self.population_size < self.tournament_size {
            return Err(OptimizeError::Configuration(format!(
                "population size {} is smaller than tournament size {}",
                self.population_size, self.tournament_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(OptimizeError::Configuration(format!(
                "mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

/// The best itinerary found by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestFlight {
    /// Catalog id of the selected itinerary.
    pub id: FlightId,
    /// Penalized cost: price + stops * stop_penalty.
    pub score: Fitness,
    pub price: u32,
    pub emissions: u32,
    pub stops: String,
    pub stay_days: i32,
    /// Generations actually run.
    pub generations: usize,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl BestFlight {
    fn new(record: &FlightRecord, score: Fitness, generations: usize, computation_time: f64) -> Self {
        BestFlight {
            id: record.id,
            score,
            price: record.price,
            emissions: record.emissions,
            stops: record.stops.clone(),
            stay_days: record.stay_days,
            generations,
            computation_time,
        }
    }
}

impl std::fmt::Display for BestFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Best flight: #{}", self.id)?;
        writeln!(f, "  Price: {}", self.price)?;
        writeln!(f, "  Emissions: {} kg CO2e", self.emissions)?;
        writeln!(f, "  Stops: {}", self.stops)?;
        writeln!(f, "  Stay: {} days", self.stay_days)?;
        writeln!(f, "  Adjusted cost: {}", self.score)?;
        writeln!(f, "  Generations: {}", self.generations)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)
    }
}

/// Genetic algorithm over a flight catalog.
pub struct GeneticAlgorithm {
    config: GaConfig,
    catalog: FlightCatalog,
    population: Vec<FlightId>,
    rng: ChaCha8Rng,
    generation: usize,
}

impl GeneticAlgorithm {
    /// Build an engine over an immutable catalog. Fails before generation 0
    /// on an empty catalog or an invalid configuration.
    pub fn new(catalog: FlightCatalog, config: GaConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(OptimizeError::EmptyCatalog);
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(GeneticAlgorithm {
            config,
            catalog,
            population: Vec::new(),
            rng,
            generation: 0,
        })
    }

    /// Penalized cost of a chromosome: `price + stops * stop_penalty`.
    /// Deterministic given the catalog.
    pub fn fitness(&self, id: FlightId) -> Result<Fitness, OptimizeError> {
        let record = self.catalog.get(id).ok_or(OptimizeError::OutOfRange {
            id,
            len: self.catalog.len(),
        })?;
        Ok(record.price + record.stop_count() * self.config.stop_penalty)
    }

    fn random_chromosome(&mut self) -> FlightId {
        self.rng.gen_range(0..self.catalog.len())
    }

    /// Fill the population with uniform random draws (with replacement)
    /// from the catalog's id set. Duplicates are expected and legal.
    fn initialize_population(&mut self) {
        let len = self.catalog.len();
        self.population = (0..self.config.population_size)
            .map(|_| self.rng.gen_range(0..len))
            .collect();
    }

    /// Evaluate the whole population. The returned vector is the immutable
    /// fitness snapshot every selection in this generation must observe;
    /// evaluation of each chromosome is independent, so it runs in parallel.
    fn evaluate(&self) -> Result<Vec<Fitness>, OptimizeError> {
        self.population
            .par_iter()
            .map(|&id| self.fitness(id))
            .collect()
    }

    /// Tournament selection: sample `tournament_size` positions without
    /// replacement from the paired (chromosome, score) snapshot and return
    /// the chromosome with the lowest score. Strict comparison keeps the
    /// first-sampled winner on ties.
    fn tournament_select(&mut self, scores: &[Fitness]) -> FlightId {
        let sample = rand::seq::index::sample(
            &mut self.rng,
            self.population.len(),
            self.config.tournament_size,
        );

        let mut best_idx = sample.index(0);
        for idx in sample.iter().skip(1) {
            if scores[idx] < scores[best_idx] {
                best_idx = idx;
            }
        }

        self.population[best_idx]
    }

    /// Coin-flip crossover: returns one of the two parents.
    fn crossover(&mut self, parent1: FlightId, parent2: FlightId) -> FlightId {
        if self.rng.gen_bool(0.5) {
            parent1
        } else {
            parent2
        }
    }

    /// With probability `mutation_rate`, replace the chromosome with a fresh
    /// uniform draw from the catalog (which may coincide with the old value).
    fn mutate(&mut self, chromosome: FlightId) -> FlightId {
        if self.rng.gen_bool(self.config.mutation_rate) {
            self.random_chromosome()
        } else {
            chromosome
        }
    }

    /// Breed the next generation from the current fitness snapshot and
    /// replace the population wholesale.
    fn evolve(&mut self, scores: &[Fitness]) {
        let mut next = Vec::with_capacity(self.config.population_size);

        for _ in 0..self.config.population_size / 2 {
            let parent1 = self.tournament_select(scores);
            let parent2 = self.tournament_select(scores);

            let child1 = self.crossover(parent1, parent2);
            let child2 = self.crossover(parent2, parent1);

            next.push(self.mutate(child1));
            next.push(self.mutate(child2));
        }

        self.population = next;
        self.generation += 1;
    }

    /// Run the full generation budget and report the best chromosome of the
    /// final population (first occurrence on ties) with its score.
    pub fn run(&mut self) -> Result<BestFlight, OptimizeError> {
        let start = std::time::Instant::now();

        self.initialize_population();
        info!(
            "initialized population of {} over {} candidate flights",
            self.config.population_size,
            self.catalog.len()
        );

        for _ in 0..self.config.generations {
            let scores = self.evaluate()?;
            if let Some(best) = scores.iter().min() {
                debug!("generation {}: best score {}", self.generation, best);
            }
            self.evolve(&scores);
        }

        let scores = self.evaluate()?;
        let mut best_idx = 0;
        for (idx, &score) in scores.iter().enumerate() {
            if score < scores[best_idx] {
                best_idx = idx;
            }
        }

        let id = self.population[best_idx];
        let record = self.catalog.get(id).ok_or(OptimizeError::OutOfRange {
            id,
            len: self.catalog.len(),
        })?;

        info!(
            "finished after {} generations: flight {} with adjusted cost {}",
            self.generation, id, scores[best_idx]
        );

        Ok(BestFlight::new(
            record,
            scores[best_idx],
            self.generation,
            start.elapsed().as_secs_f64(),
        ))
    }

    pub fn population(&self) -> &[FlightId] {
        &self.population
    }

    pub fn current_generation(&self) -> usize {
        self.generation
    }
}

/// Ground-truth optimum by linear scan, for sanity checks and `analyze`
/// reporting. Returns the first record with the minimal penalized cost.
pub fn exhaustive_best(catalog: &FlightCatalog, stop_penalty: u32) -> Option<(FlightId, Fitness)> {
    let mut best: Option<(FlightId, Fitness)> = None;
    for record in catalog.records() {
        let score = record.price + record.stop_count() * stop_penalty;
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((record.id, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_of(flights: &[(u32, &str)]) -> FlightCatalog {
        let records = flights
            .iter()
            .enumerate()
            .map(|(id, &(price, stops))| FlightRecord::new(id, price, 0, stops, 14))
            .collect();
        FlightCatalog::new(records)
    }

    fn small_config() -> GaConfig {
        GaConfig {
            population_size: 10,
            generations: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_fitness_formula() {
        let catalog = catalog_of(&[(5000, "1 stop"), (800, "0 stops"), (1200, "2 stops")]);
        let ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        assert_eq!(ga.fitness(0).unwrap(), 6000);
        assert_eq!(ga.fitness(1).unwrap(), 800);
        assert_eq!(ga.fitness(2).unwrap(), 3200);

        // Deterministic: repeated calls agree.
        assert_eq!(ga.fitness(0).unwrap(), ga.fitness(0).unwrap());
    }

    #[test]
    fn test_fitness_out_of_range() {
        let catalog = catalog_of(&[(1000, "1 stop")]);
        let ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        assert!(matches!(
            ga.fitness(7),
            Err(OptimizeError::OutOfRange { id: 7, len: 1 })
        ));
    }

    #[test]
    fn test_initial_population_valid() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop"), (2500, "1 stop")]);
        let len = catalog.len();
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        ga.initialize_population();
        assert_eq!(ga.population().len(), 10);
        assert!(ga.population().iter().all(|&id| id < len));
    }

    #[test]
    fn test_crossover_returns_a_parent() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop")]);
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        let mut picked_first = 0usize;
        let trials = 10_000;
        for _ in 0..trials {
            let child = ga.crossover(0, 1);
            assert!(child == 0 || child == 1);
            if child == 0 {
                picked_first += 1;
            }
        }

        // Roughly 50/50 over many trials.
        let ratio = picked_first as f64 / trials as f64;
        assert!(ratio > 0.45 && ratio < 0.55, "ratio was {}", ratio);
    }

    #[test]
    fn test_mutation_rate_empirical() {
        let records = (0..100)
            .map(|id| FlightRecord::new(id, 1000 + id as u32, 0, "1 stop", 14))
            .collect();
        let catalog = FlightCatalog::new(records);
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        let mut changed = 0usize;
        let trials = 10_000;
        for _ in 0..trials {
            if ga.mutate(0) != 0 {
                changed += 1;
            }
        }

        // Mutation fires at rate 0.1 and redraws uniformly, so the observed
        // change rate is 0.1 * 99/100. Allow statistical tolerance.
        let ratio = changed as f64 / trials as f64;
        assert!(ratio > 0.07 && ratio < 0.13, "ratio was {}", ratio);
    }

    #[test]
    fn test_population_size_preserved() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop"), (2500, "1 stop")]);
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        ga.initialize_population();
        for _ in 0..5 {
            let scores = ga.evaluate().unwrap();
            ga.evolve(&scores);
            assert_eq!(ga.population().len(), 10);
        }
        assert_eq!(ga.current_generation(), 5);
    }

    #[test]
    fn test_odd_population_rejected() {
        let catalog = catalog_of(&[(1000, "1 stop")]);
        let config = GaConfig {
            population_size: 7,
            ..Default::default()
        };

        assert!(matches!(
            GeneticAlgorithm::new(catalog, config),
            Err(OptimizeError::Configuration(_))
        ));
    }

    #[test]
    fn test_population_below_tournament_rejected() {
        let catalog = catalog_of(&[(1000, "1 stop")]);
        let config = GaConfig {
            population_size: 4,
            ..Default::default()
        };

        assert!(matches!(
            GeneticAlgorithm::new(catalog, config),
            Err(OptimizeError::Configuration(_))
        ));
    }

    #[test]
    fn test_mutation_rate_out_of_bounds_rejected() {
        let catalog = catalog_of(&[(1000, "1 stop")]);
        let config = GaConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };

        assert!(matches!(
            GeneticAlgorithm::new(catalog, config),
            Err(OptimizeError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let catalog = FlightCatalog::new(Vec::new());
        assert!(matches!(
            GeneticAlgorithm::new(catalog, GaConfig::default()),
            Err(OptimizeError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_converges_to_cheapest_one_stop() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop"), (50000, "1 stop")]);
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        let best = ga.run().unwrap();
        assert_eq!(best.id, 1);
        assert_eq!(best.score, 1500);
        assert_eq!(best.generations, 50);
    }

    #[test]
    fn test_penalty_lets_pricier_nonstop_win() {
        // The nonstop is 600 more expensive but saves a 1000-unit penalty.
        let catalog = catalog_of(&[(1200, "1 stop"), (1800, "0 stops"), (2600, "1 stop")]);
        let mut ga = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        let best = ga.run().unwrap();
        assert_eq!(best.id, 1);
        assert_eq!(best.score, 1800);
    }

    #[test]
    fn test_zero_generations_reports_initial_best() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop")]);
        let config = GaConfig {
            population_size: 10,
            generations: 0,
            ..Default::default()
        };
        let mut ga = GeneticAlgorithm::new(catalog, config).unwrap();

        let best = ga.run().unwrap();
        assert_eq!(best.generations, 0);
        assert!(best.score == 1500 || best.score == 2000);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let catalog = catalog_of(&[(1000, "1 stop"), (500, "1 stop"), (50000, "1 stop")]);

        let mut first = GeneticAlgorithm::new(catalog.clone(), small_config()).unwrap();
        let mut second = GeneticAlgorithm::new(catalog, small_config()).unwrap();

        let a = first.run().unwrap();
        let b = second.run().unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn test_exhaustive_best_prefers_first_on_tie() {
        let catalog = catalog_of(&[(1500, "0 stops"), (500, "1 stop"), (1500, "0 stops")]);
        let (id, score) = exhaustive_best(&catalog, STOP_PENALTY).unwrap();
        assert_eq!(id, 0);
        assert_eq!(score, 1500);
    }
}
