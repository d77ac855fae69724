//! Trait Branching CLI - Run replicate ensembles from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use trait_branching::{
    compute::{Ensemble, PopulationStats, count_clusters},
    export::save_replicate,
    schema::{EcologyPreset, RunConfig},
};

/// Trait distance separating two phenotypic clusters in the summary.
const CLUSTER_GAP: f64 = 0.1;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [output_dir]", args[0]);
        eprintln!();
        eprintln!("Run birth-death-mutation replicates from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  output_dir   Directory for trajectory CSV and summary files");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --example    Print an example configuration");
        eprintln!("  --presets    List ecological presets");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => {
            print_example_config();
            return;
        }
        "--presets" => {
            for preset in EcologyPreset::ALL {
                println!("{}", preset);
            }
            return;
        }
        _ => {}
    }

    let config_path = PathBuf::from(&args[1]);
    let output_dir = args.get(2).map(PathBuf::from);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let ensemble = Ensemble::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let config = ensemble.config();
    let sim = &config.simulation;

    println!("Trait Branching Simulation");
    println!("==========================");
    println!(
        "Model: {} (K0 = {})",
        config.ecology.name(),
        config.ecology.system_size()
    );
    println!("Slots: {}", config.initial.slots());
    println!(
        "Time: {} over {} steps (dt = {}), {} samples",
        sim.total_time,
        sim.steps,
        sim.dt(),
        sim.samples()
    );
    println!(
        "Mutation: rate {}, effect {}, traits in [{}, {}]",
        sim.mutation_rate, sim.mutation_effect, sim.trait_min, sim.trait_max
    );
    println!("Replicates: {}", config.replicates);
    println!("Base seed: {}", ensemble.base_seed());
    println!();

    println!("Running replicates...");
    let start = Instant::now();
    let results = ensemble.run();
    let elapsed = start.elapsed();

    let mut failures = 0usize;
    for result in &results {
        let output = match &result.output {
            Ok(output) => output,
            Err(e) => {
                failures += 1;
                eprintln!("  Replicate {}: failed: {}", result.index, e);
                continue;
            }
        };

        let stats = PopulationStats::from_state(&output.final_state);
        let summary = &output.summary;
        println!(
            "  Replicate {} (seed {}): N={}, occupied={}, clusters={}",
            result.index,
            result.seed,
            stats.total_count,
            stats.occupied_slots,
            count_clusters(&output.final_state, CLUSTER_GAP)
        );
        if summary.extinct {
            println!("    extinct by t={:.4}", summary.final_time);
        } else {
            println!(
                "    trait mean={:.4}, var={:.6}, range=[{:.4}, {:.4}]",
                stats.mean_trait, stats.trait_variance, stats.min_trait, stats.max_trait
            );
        }
        println!(
            "    births={}, deaths={}, mutants={}, founders={}, dropped={}",
            summary.births,
            summary.deaths,
            summary.mutants,
            summary.founders,
            summary.dropped_mutants
        );

        if let Some(dir) = &output_dir {
            let label = format!("rep{:03}", result.index);
            match save_replicate(dir, &label, output) {
                Ok(paths) => println!("    saved {}", paths.summary.display()),
                Err(e) => {
                    failures += 1;
                    eprintln!("    Error saving replicate {}: {}", result.index, e);
                }
            }
        }
    }

    println!();
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        (sim.steps as f32 * results.len() as f32) / elapsed.as_secs_f32()
    );

    if failures > 0 {
        eprintln!("{} of {} replicates failed", failures, results.len());
        std::process::exit(1);
    }
}

fn print_example_config() {
    let config = RunConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
