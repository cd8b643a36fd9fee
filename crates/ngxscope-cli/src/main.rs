mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ngxscope_analyzer::Analyzer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "ngxscope",
    version,
    about = "Analyze nginx access/error logs and HTTP load-test output"
)]
struct Cli {
    /// Config file (defaults to ./ngxscope.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected input format
    Detect {
        /// Input file
        file: PathBuf,
    },
    /// Analyze an nginx access or error log
    Logs {
        /// Input file
        file: PathBuf,
        /// Log type: access, error or auto
        #[arg(long = "type", default_value = "auto")]
        kind: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze load-test tool output
    Bench {
        /// Input file
        file: PathBuf,
        /// Tool: wrk, ab, k6, autocannon, siege or auto
        #[arg(long, default_value = "auto")]
        tool: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match ngxscope_config::discover(cli.config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config.log_directive());

    let analyzer = Analyzer::new(config.to_options());
    let json_default = config.output.json;

    let result = match cli.command {
        Commands::Detect { file } => commands::detect::run(&file),
        Commands::Logs { file, kind, json } => {
            commands::logs::run(&analyzer, &file, &kind, json || json_default)
        }
        Commands::Bench { file, tool, json } => {
            commands::bench::run(&analyzer, &file, &tool, json || json_default)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
