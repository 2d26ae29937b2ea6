//! inputmap - inspect, edit and persist input mappings, and watch joysticks

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use inputmap::config::AppConfig;
use inputmap::host::FileHost;
use inputmap::input::joystick::{
    print_joystick_diagnostics, CalibrationTable, DeviceChange, DeviceObserver, InputSignal,
    JoystickProvider, ProviderOptions,
};
use inputmap::paths::AppPaths;
use inputmap::persistence::SledStore;
use inputmap::MappingManager;

type AppManager = MappingManager<FileHost, SledStore>;

/// Input remapping layer: device registry, save slots, presets and joystick input
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "INPUTMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the save slot (bootstrapping from the host) and apply it
    Startup,
    /// Rebuild the registry from the host table and print it
    LoadHost,
    /// List devices and binding counts
    Devices,
    /// Show the bindings of one device
    Show { device: String },
    /// Export one device as a preset file
    Export { device: String },
    /// Import a preset file, save and apply
    Import { file: PathBuf },
    /// List preset files
    Presets,
    /// Drop bindings the host no longer knows, then save
    Reconcile,
    /// Print calibrated joystick signals until Ctrl-C
    Watch,
    /// Log every detected joystick and its keys
    Joysticks {
        /// Seconds to wait for devices before listing
        #[arg(long, default_value = "3")]
        wait: u64,
    },
    /// Interactive editor
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut paths = AppPaths::detect();
    if let Some(config) = &args.config {
        paths = paths.with_config(config);
    }
    paths.ensure_directories()?;

    info!("Starting inputmap v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", paths.config.display());

    let config = AppConfig::load(&paths.config).await?;

    match args.command.unwrap_or(Command::Devices) {
        Command::Startup => {
            let mut manager = open_manager(&config, &paths)?;
            let state = manager.startup();
            info!("Manager state: {:?}", state);
            cli::print_devices(manager.registry());
        },
        Command::LoadHost => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_host()?;
            cli::print_devices(manager.registry());
        },
        Command::Devices => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_save(false)?;
            cli::print_devices(manager.registry());
        },
        Command::Show { device } => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_save(false)?;
            match manager.registry().lookup(&device) {
                Some(device) => cli::print_device(device),
                None => anyhow::bail!("No such device: {}", device),
            }
        },
        Command::Export { device } => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_save(false)?;
            let path = manager.export_device(&device)?;
            println!("Exported to {}", path.display());
        },
        Command::Import { file } => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_save(false)?;
            manager
                .import_preset(&file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            manager.save()?;
            manager.apply_and_persist(false)?;
            cli::print_devices(manager.registry());
        },
        Command::Presets => {
            let manager = open_manager(&config, &paths)?;
            cli::print_presets(&manager.list_presets()?);
        },
        Command::Reconcile => {
            let mut manager = open_manager(&config, &paths)?;
            manager.load_from_save(false)?;
            let report = manager.reconcile_with_host()?;
            cli::print_reconcile(&report);
            if !report.is_empty() || !report.pruned_devices.is_empty() {
                manager.save()?;
            }
        },
        Command::Watch => watch(&config, &paths).await?,
        Command::Joysticks { wait } => {
            let skip = config.joystick.skip_game_controllers;
            tokio::task::spawn_blocking(move || {
                print_joystick_diagnostics(skip, std::time::Duration::from_secs(wait))
            })
            .await??;
        },
        Command::Repl => {
            let mut manager = open_manager(&config, &paths)?;
            manager.startup();
            cli::run_repl(&mut manager)?;
        },
    }

    Ok(())
}

fn store_path(config: &AppConfig, paths: &AppPaths) -> PathBuf {
    config
        .store
        .path
        .clone()
        .unwrap_or_else(|| paths.sled_db_path())
}

fn open_manager(config: &AppConfig, paths: &AppPaths) -> Result<AppManager> {
    let host_path = config
        .host
        .mappings
        .clone()
        .unwrap_or_else(|| paths.host_mappings());
    let host = FileHost::open(&host_path)
        .with_context(|| format!("Failed to open host table {}", host_path.display()))?;

    let db_path = store_path(config, paths);
    let store = SledStore::open(&db_path)
        .with_context(|| format!("Failed to open save store {}", db_path.display()))?;

    Ok(MappingManager::new(
        host,
        store,
        config.manager_settings(&paths.presets_dir),
    ))
}

async fn watch(config: &AppConfig, paths: &AppPaths) -> Result<()> {
    if !config.joystick.enabled {
        warn!("Joystick input is disabled in the configuration");
        return Ok(());
    }

    // The store is only needed for calibration; release it before polling
    let calibration = {
        let db_path = store_path(config, paths);
        let store = SledStore::open(&db_path)
            .with_context(|| format!("Failed to open save store {}", db_path.display()))?;
        CalibrationTable::load(&store, &config.save_slot())
    };

    let observer: DeviceObserver = Arc::new(|change: &DeviceChange| match change {
        DeviceChange::Added { instance_id, name } => {
            println!("{} {} ({})", "+".green(), name, instance_id)
        },
        DeviceChange::Removed { instance_id, name } => {
            println!("{} {} ({})", "-".red(), name, instance_id)
        },
    });

    let (mut provider, mut signals) = JoystickProvider::start(ProviderOptions {
        poll_interval: config.joystick.poll_interval(),
        skip_game_controllers: config.joystick.skip_game_controllers,
        calibration,
        observers: vec![observer],
    })?;

    println!("\n{}", "Watching joysticks, Ctrl-C to stop".green());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            signal = signals.recv() => match signal {
                Some(InputSignal::KeyDown(key)) => println!("{} {}", "down".green(), key),
                Some(InputSignal::KeyUp(key)) => println!("{} {}", "up  ".yellow(), key),
                Some(InputSignal::Analog { key, value }) => println!("{} {} {:+.4}", "axis".cyan(), key, value),
                None => {
                    warn!("Joystick provider stopped");
                    break;
                },
            },
        }
    }

    tokio::task::spawn_blocking(move || provider.shutdown()).await?;
    info!("Watch stopped");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
