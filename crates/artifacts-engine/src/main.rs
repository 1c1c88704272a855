//! Engine binary for the Artifacts automation engine.
//!
//! Loads the configuration, builds the catalog and the action backend,
//! then runs one role loop per configured character until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `artifacts.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the catalog from its snapshot, or fetch it from the API
//! 4. Create the backend: the live API, or the simulated world
//! 5. Fetch the bank and every configured character
//! 6. Spawn one role loop per character, plus the reporter
//! 7. Wait for Ctrl-C, request shutdown, and join the loops

mod error;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use artifacts_bank::Bank;
use artifacts_catalog::Catalog;
use artifacts_client::{ActionBackend, ClientConfig, HttpBackend, SimulatedServer};
use artifacts_core::{
    BackendKind, Character, Context, EngineConfig, LoggingConfig, RoleKind, run_role,
};
use artifacts_types::CharacterSnapshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file used when no path is given.
const DEFAULT_CONFIG: &str = "artifacts.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, catalog, or backend setup fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = EngineConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        backend = ?config.backend.kind,
        characters = config.characters.len(),
        harvesters = config.harvester_count(),
        "artifacts-engine starting"
    );

    // 3-4. Catalog and backend.
    let (catalog, backend) = build_backend(&config).await?;

    // 5. Shared state.
    let bank = Arc::new(Bank::with_items(backend.bank_items().await?));
    let ctx = Context::new(catalog, backend, bank, config.tasks.clone())
        .with_harvesters(config.harvester_count());
    info!(
        backend = ctx.backend.name(),
        banked_items = ctx.bank.snapshot().items.len(),
        "Backend ready"
    );

    let mut characters = Vec::with_capacity(config.characters.len());
    for entry in &config.characters {
        let snapshot = ctx
            .backend
            .character(&entry.name)
            .await
            .map_err(EngineError::from)
            .with_context(|| format!("fetching character {}", entry.name))?;
        let character = Character::new(snapshot);
        character.publish(&ctx);
        characters.push((character, entry.role));
    }

    // 6. Role loops.
    let reporter = report::spawn(&ctx.bank, &ctx.roster, Arc::clone(&ctx.shutdown));
    let mut handles = Vec::with_capacity(characters.len());
    for (character, role) in characters {
        handles.push(spawn_role(ctx.clone(), character, role));
    }
    info!(loops = handles.len(), "Character loops running, Ctrl-C to stop");

    // 7. Shutdown.
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Stop requested, finishing current actions"),
        Err(error) => warn!(error = %error, "Cannot listen for Ctrl-C, stopping"),
    }
    ctx.shutdown.request();

    for handle in handles {
        if let Err(error) = handle.await {
            warn!(error = %error, "Character loop ended abnormally");
        }
    }
    if let Err(error) = reporter.await {
        warn!(error = %error, "Reporter ended abnormally");
    }

    info!("artifacts-engine shutdown complete");
    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured
/// level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_role(
    ctx: Context,
    mut character: Character,
    role: RoleKind,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        Box::pin(run_role(&ctx, &mut character, role)).await;
    })
}

/// Build the catalog and the backend the configuration asks for.
async fn build_backend(
    config: &EngineConfig,
) -> Result<(Arc<Catalog>, Arc<ActionBackend>), EngineError> {
    match config.backend.kind {
        BackendKind::Http => {
            let http = HttpBackend::new(ClientConfig::from_env()?)?;
            let catalog = Arc::new(load_catalog(config, Some(&http)).await?);
            Ok((catalog, Arc::new(ActionBackend::Http(http))))
        }
        BackendKind::Simulated => {
            let catalog = Arc::new(load_catalog(config, None).await?);
            let server = SimulatedServer::new(Arc::clone(&catalog), &config.backend.simulated());
            for entry in &config.characters {
                server.add_character(CharacterSnapshot::new(entry.name.as_str()));
            }
            info!(
                characters = config.characters.len(),
                seed = config.backend.simulated_seed,
                "Simulated world created"
            );
            Ok((catalog, Arc::new(ActionBackend::Simulated(server))))
        }
    }
}

/// Load the catalog from its snapshot, or fetch it when there is none or a
/// refresh was asked for. A fetched catalog is written to the snapshot
/// path when one is configured.
async fn load_catalog(
    config: &EngineConfig,
    http: Option<&HttpBackend>,
) -> Result<Catalog, EngineError> {
    let snapshot = config.catalog.snapshot.as_deref();
    let cached = snapshot.filter(|path| path.exists() && !config.catalog.refresh);

    if let Some(path) = cached {
        let catalog = Catalog::load(path)?;
        info!(path = %path.display(), "Catalog loaded from snapshot");
        return Ok(catalog);
    }

    let Some(http) = http else {
        return Err(snapshot.map_or(EngineError::NoCatalog, missing_snapshot));
    };
    let fetched = http.fetch_catalog().await?;
    if let Some(path) = snapshot {
        fetched.write(path)?;
        info!(path = %path.display(), "Catalog snapshot written");
    }
    Ok(Catalog::from_snapshot(fetched)?)
}

fn missing_snapshot(path: &Path) -> EngineError {
    EngineError::MissingSnapshot {
        path: path.to_path_buf(),
    }
}
