//! Owl Sentinel - Command Line Entry Point
//!
//! Thin wrapper over the detector core for operators and edge scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use owl_sentinel::constants::{APP_NAME, APP_VERSION};
use owl_sentinel::logic::{AnomalyDetector, DetectorConfig, Reading, Verdict};

#[derive(Parser)]
#[command(name = "owl-sentinel")]
#[command(about = "Environmental sensor anomaly detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log one reading and print the verdict
    Ingest {
        #[arg(long, default_value_t = 0.0)]
        temp: f64,

        #[arg(long, default_value_t = 0.0)]
        humidity: f64,

        #[arg(long, default_value_t = 0.0)]
        gas: f64,

        #[arg(long, default_value_t = 0)]
        motion: u8,

        /// Raw JSON payload, overrides the individual fields
        #[arg(long)]
        json: Option<String>,
    },

    /// Retrain the model from the feature table
    Train,

    /// Show model and feature table status
    Status,

    /// Restore the header and drop malformed rows in the feature table
    Repair,

    /// Log synthetic normal readings, train, then send a gas spike
    Simulate {
        /// Number of normal readings to send first
        #[arg(short, long, default_value_t = 50)]
        count: usize,

        /// RNG seed for the synthetic readings
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = DetectorConfig::from_env();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);
    log::debug!("Feature table: {}", config.data_file.display());
    log::debug!("Model file: {}", config.model_file.display());

    let detector = AnomalyDetector::new(config);

    match cli.command {
        Commands::Ingest { temp, humidity, gas, motion, json } => {
            let reading = match json {
                Some(payload) => Reading::from_json(&payload).context("Invalid reading payload")?,
                None => Reading::new(temp, humidity, gas, motion),
            };
            let verdict = detector.ingest(&reading).context("Failed to log reading")?;
            print_verdict(&reading, &verdict);
        }
        Commands::Train => {
            let success = detector.train();
            let message = if success {
                "Model trained successfully."
            } else {
                "Training failed or not enough data."
            };
            println!("{}", json!({ "success": success, "message": message }));
            if !success {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&detector.status())?);
        }
        Commands::Repair => {
            let report = detector.store().repair().context("Failed to repair feature table")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Simulate { count, seed } => simulate(&detector, count, seed)?,
    }

    Ok(())
}

fn print_verdict(reading: &Reading, verdict: &Verdict) {
    println!(
        "{}",
        json!({
            "reading": reading,
            "anomaly": verdict.is_anomaly(),
            "message": verdict.reason,
        })
    );
}

fn simulate(detector: &AnomalyDetector, count: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    log::info!("Sending {} normal readings...", count);
    for i in 0..count {
        // Motion on every third reading stays under the density threshold
        let reading = Reading::new(
            rng.gen_range(20.0..25.0),
            rng.gen_range(40.0..60.0),
            rng.gen_range(100.0..200.0),
            u8::from(i % 3 == 0),
        );
        let verdict = detector.ingest(&reading)?;
        print_verdict(&reading, &verdict);
    }

    log::info!("Training model...");
    if !detector.train() {
        log::warn!("Training failed, spike will be scored without a fresh model");
    }

    log::info!("Sending gas spike...");
    let spike = Reading::new(24.0, 50.0, 800.0, 1);
    let verdict = detector.ingest(&spike)?;
    print_verdict(&spike, &verdict);

    Ok(())
}
