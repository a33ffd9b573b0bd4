//! CLI for phit: randomness and routing from CPU/timer phase jitter.

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;

#[derive(Parser)]
#[command(name = "phit")]
#[command(about = "phit — randomness and stateless routing from CPU/timer phase jitter")]
#[command(version = phit_core::VERSION)]
struct Cli {
    /// JSON config file (harvest_iterations, seed_rounds)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override harvest workload iterations
    #[arg(long, global = true)]
    harvest_iterations: Option<u32>,

    /// Override PRNG seed rounds
    #[arg(long, global = true)]
    seed_rounds: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print raw phit samples
    Sample {
        /// Number of samples
        #[arg(long, default_value = "16")]
        count: usize,

        /// Timer reads folded into each sample (1 = basic sample)
        #[arg(long, default_value = "1")]
        reads: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Hex)]
        format: OutputFormat,
    },

    /// Route tasks across destinations and show the resulting distribution.
    /// Compares against round-robin and runs a lock-free multi-thread dispatch.
    Route {
        /// Number of destinations
        #[arg(long, default_value = "8")]
        destinations: usize,

        /// Number of routing decisions
        #[arg(long, default_value = "100000")]
        tasks: usize,

        /// Worker threads for the concurrent dispatch run (0 = skip)
        #[arg(long, default_value = "4")]
        threads: usize,
    },

    /// Print PRNG output
    Prng {
        /// Number of 64-bit values
        #[arg(long, default_value = "8")]
        count: usize,

        /// Emit this many bytes via fill instead of 64-bit values
        #[arg(long)]
        bytes: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Hex)]
        format: OutputFormat,
    },

    /// Run the statistical battery on PRNG output or raw samples
    Report {
        /// Stream to test: prng or samples
        #[arg(long, default_value = "prng", value_parser = ["prng", "samples"])]
        source: String,

        /// Number of bytes to collect
        #[arg(long, default_value = "65536")]
        bytes: usize,

        /// Timer reads per sample when --source samples
        #[arg(long, default_value = "1")]
        reads: usize,

        /// Write the results as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Measure timer tick and harvest workload duration on this machine
    Calibrate {
        /// Number of probes
        #[arg(long, default_value = "10000")]
        probes: usize,

        /// Write the profile as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Run the quick self test; exits non-zero on failure
    Selftest {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Throughput of sample, route and PRNG operations
    Bench {
        /// Operations per benchmark
        #[arg(long, default_value = "100000")]
        iterations: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = commands::load_config(
        cli.config.as_deref(),
        cli.harvest_iterations,
        cli.seed_rounds,
    );

    match cli.command {
        Commands::Sample {
            count,
            reads,
            format,
        } => commands::sample::run(count, reads, format),
        Commands::Route {
            destinations,
            tasks,
            threads,
        } => commands::route::run(destinations, tasks, threads),
        Commands::Prng {
            count,
            bytes,
            format,
        } => commands::prng::run(&config, count, bytes, format),
        Commands::Report {
            source,
            bytes,
            reads,
            output,
        } => commands::report::run(&config, &source, bytes, reads, output.as_deref()),
        Commands::Calibrate { probes, output } => {
            commands::calibrate::run(&config, probes, output.as_deref())
        }
        Commands::Selftest { json } => commands::selftest::run(json),
        Commands::Bench { iterations } => commands::bench::run(&config, iterations),
    }
}
