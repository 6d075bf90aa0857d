use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pdk")]
#[command(about = "Perp DEX account & risk monitor CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation pass and print the report
    Report {
        /// Layered config paths in merge order (base -> local overrides)
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Print the report tree as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run one aggregation pass and deliver it to Telegram as a manual push
    Push {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate config and show which accounts the environment provides
    ConfigCheck {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Treat unused config keys as an error instead of a warning
        #[arg(long, default_value_t = false)]
        fail_unused: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report { config_paths, json } => {
            commands::report::run_report(&config_paths, json).await?;
        }

        Commands::Push { config_paths } => {
            commands::report::run_push(&config_paths).await?;
        }

        Commands::ConfigHash { paths } => {
            let loaded = commands::load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::ConfigCheck {
            config_paths,
            fail_unused,
        } => {
            commands::check::run_config_check(&config_paths, fail_unused)?;
        }
    }

    Ok(())
}

// Logs go to stderr so `report --json` output stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
