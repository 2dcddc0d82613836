use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gathered::config::AppConfig;
use gathered::core::{Registry, SourceEvent};
use gathered::{sources, Monitor, MonitorEvent, SourceReport};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// gathered - typed, timestamped readings from the sources on this machine
#[derive(Parser, Debug)]
#[command(name = "gathered")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0", global = true)]
    debug: u8,

    /// Config file to use instead of the default location
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List source types and whether they can run here
    List,

    /// Sample sources once and print their values
    Snapshot {
        /// Source types to sample (default: all configured)
        #[arg(value_name = "SOURCE")]
        sources: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start sources and print every update until Ctrl-C
    Watch {
        /// Source types to watch (default: all configured)
        #[arg(value_name = "SOURCE")]
        sources: Vec<String>,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECONDS")]
        seconds: Option<u64>,
    },

    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file path
    Path,

    /// Write the default config
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting gathered v{}", env!("CARGO_PKG_VERSION"));

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?,
    };

    if let Command::Config { action } = &cli.command {
        return run_config(action, &config_path);
    }

    let config = load_config(&config_path)?;

    sources::initialize_sensors();
    let mut registry = Registry::new();
    sources::register_all(&mut registry);

    match cli.command {
        Command::List => list_sources(&registry, &config),
        Command::Snapshot { sources, json } => {
            let monitor = Monitor::from_configs(&registry, &config.select(&sources)?)?;
            print_reports(&monitor.snapshot_all(), json)
        }
        Command::Watch { sources, seconds } => {
            let monitor = Monitor::from_configs(&registry, &config.select(&sources)?)?;
            watch(monitor, seconds.map(Duration::from_secs)).await
        }
        Command::Config { .. } => Ok(()),
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    AppConfig::load_from_path(path)
}

fn run_config(action: &ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::default().save_to_path(path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn list_sources(registry: &Registry, config: &AppConfig) -> Result<()> {
    println!("{:<10} {:<16} AVAILABILITY", "ID", "NAME");
    for id in registry.list_sources() {
        let source_config = config
            .select(std::slice::from_ref(&id))?
            .remove(0);
        let source = registry.create_source(&source_config)?;
        println!("{:<10} {:<16} {}", id, source.name(), source.availability());
    }
    Ok(())
}

fn print_reports(reports: &[SourceReport], json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(reports).context("Failed to serialize snapshots")?;
        println!("{}", out);
        return Ok(());
    }
    for report in reports {
        println!("{} ({})", report.name, report.source);
        for snapshot in &report.snapshots {
            let shown = snapshot
                .formatted_value
                .clone()
                .or_else(|| snapshot.value.as_ref().map(|v| v.to_string()))
                .unwrap_or_else(|| gathered::core::UNKNOWN_PLACEHOLDER.to_string());
            println!("  {:<24} {}", snapshot.display_name, shown);
        }
    }
    Ok(())
}

fn describe(event: &SourceEvent) -> String {
    match event {
        SourceEvent::RequestingPermissions => "requesting permissions".to_string(),
        SourceEvent::StartedUpdating => "started updating".to_string(),
        SourceEvent::StoppedUpdating { error: None } => "stopped updating".to_string(),
        SourceEvent::StoppedUpdating { error: Some(e) } => format!("stopped updating: {}", e),
        SourceEvent::AvailabilityChanged(a) => format!("availability changed: {}", a),
        SourceEvent::UpdateFailed { message } => format!("update failed: {}", message),
    }
}

fn print_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Property { source, snapshot } => println!(
            "{} [{}] {}: {}",
            snapshot
                .date
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S%.3f"),
            source,
            snapshot.display_name,
            snapshot
                .formatted_value
                .as_deref()
                .unwrap_or(gathered::core::UNKNOWN_PLACEHOLDER)
        ),
        MonitorEvent::Lifecycle { source, event } => println!(
            "{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            source,
            describe(event)
        ),
    }
}

async fn watch(mut monitor: Monitor, limit: Option<Duration>) -> Result<()> {
    monitor.watch(print_event);
    monitor.start_all();

    match limit {
        Some(limit) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(limit) => {}
            }
        }
        None => tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?,
    }

    info!("Stopping {} sources", monitor.sources().len());
    monitor.stop_all();
    Ok(())
}
