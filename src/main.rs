use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

mod cli;
mod config;
mod constants;
mod identity;
mod models;
mod pipeline;
mod scheduler;
mod sources;
mod upload;

use cli::{Args, Commands};
use config::{load_or_create_config, AgentConfig};
use identity::IdentityStore;
use pipeline::CollectionPipeline;
use scheduler::Scheduler;
use sources::{AppInventory, DeviceInfo, EventSpool, MediaLibrary, SourceEnumerator};
use upload::UploadClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    info!("Starting inventory agent");

    let config = load_and_override_config(&args)?;
    let identity = IdentityStore::open(&config.state_dir)?;
    let subject_id = resolve_subject_id(&args, &config, &identity)?;

    let client = UploadClient::new(
        &config.base_url,
        &subject_id,
        config.connect_timeout(),
        config.request_timeout(),
    )?;

    let sources = build_sources(&config, &identity)?;
    let pipeline = Arc::new(CollectionPipeline::new(
        sources,
        Arc::new(client),
        config.pipeline_settings(),
    ));

    if args.once {
        let report = pipeline.run_cycle().await;
        info!(
            "Single cycle finished: {}/{} delivered",
            report.delivered, report.attempted
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(pipeline, config.cycle_interval());
    scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    scheduler.stop();
    scheduler.join().await;

    info!("Inventory agent stopped");
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands (init-config)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            AgentConfig::default().save_to_yaml_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}

/// Load the config file (if any) and apply CLI overrides on top.
fn load_and_override_config(args: &Args) -> Result<AgentConfig> {
    let mut config = load_or_create_config(args.config.as_deref())?;

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(user_id) = &args.user_id {
        config.user_id = Some(user_id.clone());
    }
    if let Some(interval) = args.interval_secs {
        config.cycle_interval_secs = interval;
    }
    if let Some(max) = args.max_concurrent_uploads {
        config.max_concurrent_uploads = max;
    }
    if !args.media_root.is_empty() {
        config.media_roots = args.media_root.clone();
    }
    Ok(config)
}

/// Subject id resolution order: CLI flag, config file, identity store.
/// Whatever wins is persisted so later runs can omit it.
fn resolve_subject_id(
    args: &Args,
    config: &AgentConfig,
    identity: &IdentityStore,
) -> Result<String> {
    let explicit = args.user_id.clone().or_else(|| config.user_id.clone());
    match explicit {
        Some(id) => {
            identity.set_subject_id(&id)?;
            Ok(id)
        }
        None => identity
            .subject_id()?
            .context("No subject id provisioned; pass --user-id or set user_id in the config"),
    }
}

/// Assemble the configured source enumerators.
fn build_sources(
    config: &AgentConfig,
    identity: &IdentityStore,
) -> Result<Vec<Arc<dyn SourceEnumerator>>> {
    let mut sources: Vec<Arc<dyn SourceEnumerator>> = Vec::new();

    if config.media_roots.is_empty() {
        warn!("No media roots configured, media source disabled");
    } else {
        sources.push(Arc::new(MediaLibrary::new(config.media_roots.clone())));
    }

    sources.push(Arc::new(DeviceInfo::new(identity.device_identifier()?)));

    let user_app_roots: Vec<PathBuf> = if config.user_app_roots.is_empty() {
        std::env::var_os("HOME")
            .map(|home| vec![PathBuf::from(home).join(".local/share/applications")])
            .unwrap_or_default()
    } else {
        config.user_app_roots.clone()
    };
    sources.push(Arc::new(AppInventory::new(
        config.system_app_roots.clone(),
        user_app_roots,
    )));

    if let Some(spool) = &config.event_spool_dir {
        sources.push(Arc::new(EventSpool::new(spool.clone())));
    }

    Ok(sources)
}
