//! Flight Optimizer Library
//!
//! A genetic-algorithm optimizer that selects a near-optimal flight
//! itinerary from a catalog of scraped candidates, minimizing ticket price
//! plus a fixed penalty per layover.
//!
//! # Features
//!
//! - CSV catalog loading with the cleaning rules of the scraping pipeline
//! - Index-valued genotype with tournament selection and uniform mutation
//! - Seeded, reproducible runs; parallel fitness evaluation
//! - SVG histograms of price/emissions with the selected flight marked
//!
//! # Example
//!
//! ```no_run
//! use flight_optimizer::catalog::FlightCatalog;
//! use flight_optimizer::genetic::{GaConfig, GeneticAlgorithm};
//!
//! // Load and clean the scraped catalog, keep one-stop itineraries
//! let catalog = FlightCatalog::from_csv("flights.csv", 14).unwrap().retain_stops(1);
//!
//! // Run the optimizer with the default configuration
//! let mut ga = GeneticAlgorithm::new(catalog, GaConfig::default()).unwrap();
//! let best = ga.run().unwrap();
//!
//! println!("Adjusted cost: {}", best.score);
//! ```

pub mod catalog;
pub mod error;
pub mod genetic;
pub mod visualization;

pub use catalog::{FlightCatalog, FlightRecord};
pub use error::{CatalogError, OptimizeError};
pub use genetic::{BestFlight, GaConfig, GeneticAlgorithm};
