//! Flight Optimizer - Command Line Interface
//!
//! Runs a genetic algorithm over a CSV catalog of scraped flight
//! itineraries and reports the best price/layover trade-off.

use clap::{Parser, Subcommand};
use flight_optimizer::catalog::FlightCatalog;
use flight_optimizer::error::OptimizeError;
use flight_optimizer::genetic::{exhaustive_best, GaConfig, GeneticAlgorithm};
use flight_optimizer::visualization::Visualizer;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "flight-optimizer")]
#[command(version = "1.0")]
#[command(about = "A genetic-algorithm optimizer for flight itineraries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the genetic algorithm over a catalog
    Optimize {
        /// Path to the catalog CSV
        #[arg(short, long)]
        catalog: PathBuf,

        /// Trip duration in days, recorded on each itinerary
        #[arg(long, default_value = "14")]
        stay_days: i32,

        /// Keep only itineraries with exactly this many layovers before
        /// optimizing (the scraping pipeline used 1)
        #[arg(long)]
        stops: Option<u32>,

        /// Population size (must be even)
        #[arg(short, long, default_value = "500")]
        population_size: usize,

        /// Number of generations
        #[arg(short, long, default_value = "300")]
        generations: usize,

        /// Mutation rate in [0, 1]
        #[arg(short, long, default_value = "0.1")]
        mutation_rate: f64,

        /// Currency-unit penalty per layover
        #[arg(long, default_value = "1000")]
        stop_penalty: u32,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output the best flight as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate SVG/PNG histograms of price and emissions
        #[arg(long)]
        visualize: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print catalog statistics and the exhaustive-scan optimum
    Analyze {
        /// Path to the catalog CSV
        #[arg(short, long)]
        catalog: PathBuf,

        /// Trip duration in days
        #[arg(long, default_value = "14")]
        stay_days: i32,

        /// Currency-unit penalty per layover
        #[arg(long, default_value = "1000")]
        stop_penalty: u32,
    },

    /// Repeat the optimizer across seeds and summarize the spread
    Compare {
        /// Path to the catalog CSV
        #[arg(short, long)]
        catalog: PathBuf,

        /// Trip duration in days
        #[arg(long, default_value = "14")]
        stay_days: i32,

        /// Keep only itineraries with exactly this many layovers
        #[arg(long)]
        stops: Option<u32>,

        /// Number of runs, one seed each
        #[arg(short, long, default_value = "10")]
        runs: u64,

        /// Output CSV file with per-run results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize {
            catalog,
            stay_days,
            stops,
            population_size,
            generations,
            mutation_rate,
            stop_penalty,
            seed,
            output,
            visualize,
            verbose,
        } => {
            let config = GaConfig {
                population_size,
                generations,
                mutation_rate,
                stop_penalty,
                seed,
                ..Default::default()
            };
            optimize_catalog(&catalog, stay_days, stops, config, output, visualize, verbose);
        }

        Commands::Analyze {
            catalog,
            stay_days,
            stop_penalty,
        } => {
            analyze_catalog(&catalog, stay_days, stop_penalty);
        }

        Commands::Compare {
            catalog,
            stay_days,
            stops,
            runs,
            output,
        } => {
            compare_runs(&catalog, stay_days, stops, runs, output);
        }
    }
}

fn load_catalog(path: &PathBuf, stay_days: i32, stops: Option<u32>) -> FlightCatalog {
    println!("Loading catalog from {:?}...", path);

    let catalog = match FlightCatalog::from_csv(path, stay_days) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            std::process::exit(1);
        }
    };

    match stops {
        Some(count) => {
            let filtered = catalog.retain_stops(count);
            println!(
                "Kept {} itineraries with exactly {} stop(s)",
                filtered.len(),
                count
            );
            filtered
        }
        None => catalog,
    }
}

fn optimize_catalog(
    path: &PathBuf,
    stay_days: i32,
    stops: Option<u32>,
    config: GaConfig,
    output: Option<PathBuf>,
    visualize: bool,
    verbose: bool,
) {
    let catalog = load_catalog(path, stay_days, stops);

    if verbose {
        println!("{}", catalog.statistics());
        println!("Population: {}  Generations: {}  Mutation rate: {}  Seed: {}",
            config.population_size, config.generations, config.mutation_rate, config.seed);
    }

    let mut ga = match GeneticAlgorithm::new(catalog.clone(), config) {
        Ok(ga) => ga,
        Err(OptimizeError::EmptyCatalog) => {
            eprintln!("No flights to optimize after filtering.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let best = match ga.run() {
        Ok(best) => best,
        Err(e) => {
            eprintln!("Optimization failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n========== Results ==========");
    print!("{}", best);

    if let Some(out_path) = output {
        let json = match serde_json::to_string_pretty(&best) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Failed to write output: {}", e);
            std::process::exit(1);
        }
        println!("\nResult saved to {:?}", out_path);
    }

    if visualize {
        let viz = Visualizer::new();
        for (svg, name) in [
            (viz.generate_price_svg(&catalog, &best), "price"),
            (viz.generate_emissions_svg(&catalog, &best), "emissions"),
        ] {
            let png_path = path.with_extension(format!("{}.png", name));
            match viz.save_png(&svg, &png_path) {
                Ok(()) => println!("Histogram saved to {:?}", png_path),
                Err(e) => {
                    // fallback: write SVG if PNG conversion failed
                    let svg_path = path.with_extension(format!("{}.svg", name));
                    match viz.save_svg(&svg, &svg_path) {
                        Ok(()) => println!(
                            "PNG conversion failed ({}). Saved SVG to {:?}",
                            e, svg_path
                        ),
                        Err(e) => eprintln!("Failed to save histogram: {}", e),
                    }
                }
            }
        }
    }
}

fn analyze_catalog(path: &PathBuf, stay_days: i32, stop_penalty: u32) {
    let catalog = load_catalog(path, stay_days, None);

    println!("\n========== Catalog Analysis ==========\n");
    println!("{}", catalog.statistics());

    // Ground truth by linear scan; the GA should land here on healthy runs.
    match exhaustive_best(&catalog, stop_penalty) {
        Some((id, score)) => {
            println!("Exhaustive optimum (penalty {} per stop):", stop_penalty);
            if let Some(record) = catalog.get(id) {
                print!("{}", record);
            }
            println!("  Adjusted cost: {}", score);
        }
        None => println!("Catalog is empty; nothing to analyze."),
    }
}

fn compare_runs(
    path: &PathBuf,
    stay_days: i32,
    stops: Option<u32>,
    runs: u64,
    output: Option<PathBuf>,
) {
    let catalog = load_catalog(path, stay_days, stops);

    println!("Comparing {} seeded runs over {} itineraries...\n", runs, catalog.len());

    let mut results: Vec<(u64, usize, u32, f64)> = Vec::new();

    for seed in 0..runs {
        let config = GaConfig {
            seed,
            ..Default::default()
        };

        let mut ga = match GeneticAlgorithm::new(catalog.clone(), config) {
            Ok(ga) => ga,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        let start = Instant::now();
        match ga.run() {
            Ok(best) => {
                let elapsed = start.elapsed().as_secs_f64();
                println!(
                    "seed {:>3}  flight #{:<5} score {:>8}  time {:.4}s",
                    seed, best.id, best.score, elapsed
                );
                results.push((seed, best.id, best.score, elapsed));
            }
            Err(e) => {
                eprintln!("Run with seed {} failed: {}", seed, e);
                std::process::exit(1);
            }
        }
    }

    if results.is_empty() {
        println!("No runs completed.");
        return;
    }

    let scores: Vec<u32> = results.iter().map(|r| r.2).collect();
    let times: Vec<f64> = results.iter().map(|r| r.3).collect();
    let best = scores.iter().copied().min().unwrap_or(0);
    let worst = scores.iter().copied().max().unwrap_or(0);
    let avg = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
    let avg_time = times.iter().sum::<f64>() / times.len() as f64;

    println!("\n========== Summary ==========");
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>10}",
        "Runs", "Best", "Average", "Worst", "Avg Time"
    );
    println!("{}", "-".repeat(55));
    println!(
        "{:<10} {:>10} {:>10.2} {:>10} {:>10.4}",
        results.len(),
        best,
        avg,
        worst,
        avg_time
    );

    if let Some(out_path) = output {
        let mut writer = match csv::Writer::from_path(&out_path) {
            Ok(writer) => writer,
            Err(e) => {
                eprintln!("Failed to open output CSV: {}", e);
                std::process::exit(1);
            }
        };

        let write_result = (|| -> Result<(), csv::Error> {
            writer.write_record(["seed", "flight_id", "score", "time"])?;
            for (seed, id, score, time) in &results {
                writer.write_record([
                    seed.to_string(),
                    id.to_string(),
                    score.to_string(),
                    format!("{:.4}", time),
                ])?;
            }
            writer.flush().map_err(csv::Error::from)?;
            Ok(())
        })();

        match write_result {
            Ok(()) => println!("\nResults exported to {:?}", out_path),
            Err(e) => {
                eprintln!("Failed to write CSV: {}", e);
                std::process::exit(1);
            }
        }
    }
}
