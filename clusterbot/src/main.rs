use clap::Parser;
use std::path::PathBuf;

use clusterbot::{ClusterbotResult, Config, RunOptions, Subsystem};
use clusterbot_core::logging;

#[derive(Parser)]
#[command(name = "clusterbot")]
#[command(about = "Bring cluster monitoring into chat channels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Probe the cluster and deliver one report
    Run {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Incoming webhook URL of the channel receiving the report
        #[arg(long)]
        webhook_url: Option<String>,

        /// Service to check (repeatable, or comma separated): executors, jvm, yarn, hdfs, spark
        #[arg(long = "service", value_delimiter = ',')]
        services: Vec<Subsystem>,

        /// Offline mode: read fixtures and print the report instead of posting it
        #[arg(long)]
        test: bool,

        /// Directory holding <service>.txt fixtures for offline mode
        #[arg(long)]
        fixture_dir: Option<PathBuf>,

        /// Keep command log artifacts after reading them
        #[arg(long)]
        retain_logs: bool,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
    /// List known services in report order
    Services,
    /// Load and validate a configuration file
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands) -> ClusterbotResult<()> {
    match command {
        Commands::Run {
            config,
            webhook_url,
            services,
            test,
            fixture_dir,
            retain_logs,
            log_level,
        } => {
            let options = RunOptions {
                config_path: config,
                webhook_url,
                services,
                offline: test,
                fixture_dir,
                retain_logs,
                log_level,
            };
            let config = options.resolve()?;
            logging::init(&config.observability.logging.level)?;

            let report = clusterbot::run(&config).await?;
            tracing::info!("Run complete, cluster {}", report.overall());
        }
        Commands::Services => {
            for subsystem in Subsystem::ALL {
                println!("{:<10} {}", subsystem.key(), subsystem.label());
            }
        }
        Commands::CheckConfig { config } => {
            let loaded = Config::from_file(&config)?;
            let services = loaded
                .selected_services()
                .iter()
                .map(Subsystem::key)
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "Configuration OK: {} ({} mode, services: {})",
                config.display(),
                if loaded.report.offline { "offline" } else { "live" },
                if services.is_empty() { "none" } else { services.as_str() }
            );
        }
    }

    Ok(())
}
