//! ECOGENESIS - CLI Entry Point
//!
//! Headless predator/prey evolution runs.

use clap::{Parser, Subcommand};
use ecogenesis::neural::{MAX_INPUTS, OUTPUT_BASE};
use ecogenesis::persistence::GenomeBank;
use ecogenesis::{Config, Species, World};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ecogenesis")]
#[command(version)]
#[command(about = "Open-ended predator/prey evolution with NEAT-style steering brains")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of steps to simulate
        #[arg(short, long, default_value = "36000")]
        steps: u64,

        /// Genome bank to start from instead of fresh genomes
        #[arg(short, long)]
        bank: Option<PathBuf>,

        /// Output directory for the final bank, stats and fitness logs
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Write a bank of freshly seeded genomes
    Seed {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Output path (.json for JSON, binary otherwise)
        #[arg(short, long, default_value = "genomes.bin")]
        output: PathBuf,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Summarize a genome bank
    Analyze {
        /// Bank file (.json or binary)
        bank: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            bank,
            output,
            seed,
            quiet,
        } => run_simulation(config, steps, bank, output, seed, quiet),

        Commands::Init { output } => generate_config(output),

        Commands::Seed { config, output, seed } => seed_bank(config, output, seed),

        Commands::Analyze { bank } => analyze_bank(bank),
    }
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    bank: Option<PathBuf>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&config_path)?;

    // Create output directory
    std::fs::create_dir_all(&output)?;
    if config.logging.fitness_log_dir.is_none() {
        config.logging.fitness_log_dir = Some(output.join("fitness").to_string_lossy().to_string());
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut world = match bank {
        Some(path) => {
            println!("Loading genome bank: {:?}", path);
            let bank = GenomeBank::load_any(&path)?;
            World::from_bank(config.clone(), &bank, seed)?
        }
        None => World::new_with_seed(config.clone(), seed)?,
    };

    println!("Starting simulation");
    println!("  Seed: {}", seed);
    for species in Species::ALL {
        let count = world.population_of(species);
        if count > 0 {
            println!("  {}: {}", species, count);
        }
    }
    println!("  World size: {}x{}", config.world.width, config.world.height);
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;

    world.run_with_callback(steps, |world, i| {
        if !quiet && i % stats_interval == 0 {
            println!("{}", world.stats.summary());
        }
    });

    let elapsed = start.elapsed();
    let steps_per_sec = world.time as f64 / elapsed.as_secs_f64();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", world.time);
    println!("Simulated: {:.0}s", world.clock.total_scaled());
    println!("Speed: {:.1} steps/s", steps_per_sec);
    println!("Deaths: {}", world.stats.deaths_total);
    for species in Species::ALL {
        if let Some(mean) = world.fitness_log().recent_mean(species, 100) {
            println!("Recent {} fitness: {:.3}", species, mean);
        }
    }

    world.fitness_log_mut().flush();

    let bank_path = output.join("genomes_final.bin");
    world.genome_bank().save(&bank_path)?;
    println!("Final genome bank: {:?}", bank_path);

    let stats_path = output.join("stats_history.json");
    world.stats_history.save_json(&stats_path)?;
    println!("Stats history: {:?}", stats_path);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn seed_bank(config_path: PathBuf, output: PathBuf, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let bank = World::new_with_seed(config, seed)?.genome_bank();

    if output.extension().map_or(false, |ext| ext == "json") {
        bank.save_json(&output)?;
    } else {
        bank.save(&output)?;
    }
    println!("Seeded {} genomes into: {:?}", bank.len(), output);
    Ok(())
}

fn analyze_bank(bank_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Genome Bank Analysis ===");
    println!("File: {:?}", bank_path);
    println!();

    let bank = GenomeBank::load_any(&bank_path)?;

    println!("Taken at step: {}", bank.time);
    println!("Genomes: {}", bank.len());

    let prey = bank.genomes.iter().filter(|g| g.is_prey).count();
    println!("Prey-flagged: {}", prey);
    println!("Predator-flagged: {}", bank.len() - prey);
    println!();

    if !bank.is_empty() {
        let n = bank.len() as f32;
        let avg_genes = bank.genomes.iter().map(|g| g.genes.len() as f32).sum::<f32>() / n;
        let avg_enabled = bank
            .genomes
            .iter()
            .map(|g| g.genes.iter().filter(|gene| gene.is_enabled()).count() as f32)
            .sum::<f32>()
            / n;
        let hidden: Vec<usize> = bank
            .genomes
            .iter()
            .map(|g| {
                g.genes
                    .iter()
                    .flat_map(|gene| [gene.source(), gene.target()])
                    .filter(|&id| id as usize >= MAX_INPUTS && id < OUTPUT_BASE)
                    .collect::<BTreeSet<_>>()
                    .len()
            })
            .collect();
        let avg_hidden = hidden.iter().sum::<usize>() as f32 / n;
        let max_hidden = hidden.iter().copied().max().unwrap_or(0);
        let avg_size = bank.genomes.iter().map(|g| g.size_trait).sum::<f32>() / n;

        println!("Average genes: {:.1} ({:.1} enabled)", avg_genes, avg_enabled);
        println!("Average hidden neurons: {:.2}", avg_hidden);
        println!("Max hidden neurons: {}", max_hidden);
        println!("Average size: {:.2}", avg_size);
        println!("Max innovation: {}", bank.max_innovation().unwrap_or(0));
        println!("Max genome id: {}", bank.max_id().unwrap_or(0));
    }

    Ok(())
}
