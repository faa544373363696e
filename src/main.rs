use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxdash::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the refresh loop, gated by business hours
    Run,
    /// Run a single ungated refresh cycle and exit
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(Commands::Run) => fxdash::run(cli.config_path.as_deref(), fxdash::RunMode::Loop).await,
        Some(Commands::Once) => fxdash::run(cli.config_path.as_deref(), fxdash::RunMode::Once).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = fxdash::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
feed:
  base_url: "https://economia.awesomeapi.com.br"
  pair: "USD-BRL"
  history_limit: 100

store:
  sales_path: "data/pedidos.json"
  purchases_path: "data/ordens.json"
  reload_each_cycle: false

refresh:
  interval_secs: 60
  idle_secs: 60

business_hours:
  enabled: true
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
