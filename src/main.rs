//! lpadder device host
//!
//! Tracks connected launchpads and exposes device profiles and local
//! projects from the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use lpadder::config::AppConfig;
use lpadder::devices::{
    DeviceStore, JsonProfileStore, MidiSession, MidirAccess, MidirPortRegistry, PortRegistry, SysexGuesser,
};
use lpadder::paths::AppPaths;
use lpadder::projects::ProjectStore;

/// lpadder - launchpad detection and cover project store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the application directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print the connected devices on every change (default mode)
    #[arg(long, conflicts_with_all = ["repl", "list_ports"])]
    watch: bool,

    /// Start the interactive prompt instead of printing device changes
    #[arg(long, conflicts_with = "list_ports")]
    repl: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = AppPaths::detect();
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths.logs_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.config.to_string_lossy().to_string());
    info!("Configuration file: {}", config_path);

    let config = AppConfig::load_or_default(&config_path).await?;

    if args.list_ports {
        list_ports(&config)?;
        return Ok(());
    }

    let profiles_path = config.storage.profiles.clone().unwrap_or_else(|| paths.profiles_file());
    let profiles = Arc::new(JsonProfileStore::new(profiles_path));

    let projects_path = config.storage.projects.clone().unwrap_or_else(|| paths.projects_db());
    let projects = match ProjectStore::open(&projects_path) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Project store unavailable ({}): {}", projects_path.display(), e);
            None
        }
    };

    let guesser = Arc::new(SysexGuesser::new(
        config.midi.client_name.clone(),
        config.devices.probe_timeout(),
    ));
    let session = MidiSession::new(
        DeviceStore::new(),
        guesser,
        profiles.clone(),
        config.devices.reconciler_settings(),
    )
    .with_sysex(config.midi.sysex);

    let access = MidirAccess::new(config.midi.client_name.clone(), config.midi.poll_interval());
    if !session.enable_and_setup(&access).await {
        println!("{}", "MIDI is unavailable, device features are disabled.".yellow());
    }

    // Watch is the mode used when no other one is asked for
    let watch = args.watch || !args.repl;
    if !watch {
        cli::run_repl(&session, &profiles, projects.as_ref()).await?;
    } else if session.store().status().is_enabled {
        watch_devices(&session).await;
    }

    session.shutdown().await;
    info!("lpadder shutdown complete");
    Ok(())
}

/// Print the Device Set on every publish until Ctrl+C
async fn watch_devices(session: &MidiSession) {
    let mut devices_rx = session.store().subscribe();

    println!("{}", "=== Connected devices ===".bold().cyan());
    println!("Press Ctrl+C to exit\n");
    cli::print_devices(&devices_rx.borrow_and_update());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = devices_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", "─".repeat(60).dimmed());
                cli::print_devices(&devices_rx.borrow_and_update());
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
}

fn list_ports(config: &AppConfig) -> Result<()> {
    let registry = MidirPortRegistry::new(config.midi.client_name.clone()).context("MIDI is unavailable")?;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    for (title, ports) in [("Input Ports:", registry.list_inputs()?), ("Output Ports:", registry.list_outputs()?)] {
        println!("\n{}", title.bold());
        if ports.is_empty() {
            println!("  {}", "No ports found".dimmed());
        }
        for port in ports {
            println!(
                "  {} {} {}",
                port.name,
                format!("({})", lpadder::devices::raw_name(&port.name)).dimmed(),
                format!("[{}]", port.id).dimmed()
            );
        }
    }

    println!();
    Ok(())
}

fn init_logging(level: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "lpadder.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        let args = Args::try_parse_from(["lpadder", "--watch"]).unwrap();
        assert!(args.watch && !args.repl);

        let args = Args::try_parse_from(["lpadder"]).unwrap();
        assert!(!args.watch && !args.repl && !args.list_ports);

        assert!(Args::try_parse_from(["lpadder", "--watch", "--repl"]).is_err());
        assert!(Args::try_parse_from(["lpadder", "--repl", "--list-ports"]).is_err());
    }
}
