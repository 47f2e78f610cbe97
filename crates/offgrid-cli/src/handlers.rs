//! Command handlers.

use crate::config::{EdgeConfig, StoreKind};
use anyhow::Context;
use console::style;
use offgrid_cache::{FilesystemStore, InstallOutcome, MemoryStore, PrecacheManifest, Precacher};
use offgrid_core::ports::{CacheStore, LivenessProbe, Origin};
use offgrid_core::{LinkState, ProbeOutcome};
use offgrid_gateway::AppState;
use offgrid_monitor::{HttpProbe, MonitorConfig, MonitorTask};
use offgrid_proxy::{AssetCacheProxy, HttpOrigin, ProxyConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use url::Url;

fn build_store(config: &EdgeConfig) -> Arc<dyn CacheStore> {
    match config.store {
        StoreKind::Filesystem => Arc::new(FilesystemStore::new(config.cache_dir.clone())),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    }
}

fn build_origin(config: &EdgeConfig) -> anyhow::Result<Arc<dyn Origin>> {
    let origin = HttpOrigin::with_timeout(config.request_timeout())?;
    Ok(Arc::new(origin))
}

fn build_probe(config: &EdgeConfig, origin_url: &Url) -> anyhow::Result<HttpProbe> {
    let probe = HttpProbe::for_origin(origin_url, &config.health_path)?
        .with_timeout(config.request_timeout())?;
    Ok(probe)
}

async fn run_precache(
    config: &EdgeConfig,
    origin_url: &Url,
    origin: Arc<dyn Origin>,
    store: Arc<dyn CacheStore>,
) -> InstallOutcome {
    let precacher = Precacher::new(
        origin,
        store,
        config.generation.clone(),
        PrecacheManifest::new(config.manifest.iter()),
        origin_url.clone(),
    );
    precacher.install().await
}

/// Precache, start the monitor, and serve until Ctrl-C.
pub async fn serve(config: &EdgeConfig) -> anyhow::Result<()> {
    let origin_url = config.origin()?;
    let store = build_store(config);
    let origin = build_origin(config)?;

    // A degraded install still serves; assets are cached as they are requested.
    if let InstallOutcome::Degraded { reason } =
        run_precache(config, &origin_url, origin.clone(), store.clone()).await
    {
        warn!(%reason, "Serving without a complete precache");
    }

    let probe = build_probe(config, &origin_url)?;
    let (task, bridge) = MonitorTask::new(
        Arc::new(probe),
        MonitorConfig {
            interval: config.probe_interval(),
        },
    );
    let monitor = task.spawn();

    let proxy = AssetCacheProxy::new(
        ProxyConfig {
            generation: config.generation.clone(),
            denylist: config.denylist.clone(),
            detach_writes: config.detach_writes,
        },
        store,
        origin,
    );
    let state = AppState::new(Arc::new(proxy), origin_url.clone()).with_bridge(bridge);

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    info!(
        origin = %origin_url,
        generation = %config.generation,
        "Starting offgrid"
    );
    offgrid_gateway::serve(listener, Arc::new(state), shutdown_signal()).await?;

    monitor.cancel().await;
    info!("offgrid stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Seed the configured store once.
pub async fn precache(config: &EdgeConfig) -> anyhow::Result<()> {
    let origin_url = config.origin()?;
    let origin = build_origin(config)?;
    let outcome = run_precache(config, &origin_url, origin, build_store(config)).await;

    match outcome {
        InstallOutcome::Complete { assets } => {
            println!(
                "{} Cached {} assets into generation {}",
                style("✓").green(),
                assets,
                style(&config.generation).bold()
            );
            Ok(())
        }
        InstallOutcome::Degraded { reason } => {
            println!("{} Precache failed: {}", style("✗").red(), reason);
            anyhow::bail!("precache did not complete")
        }
    }
}

/// Probe the origin once.
pub async fn probe(config: &EdgeConfig) -> anyhow::Result<()> {
    let probe = build_probe(config, &config.origin()?)?;
    let outcome = probe.probe().await;

    match outcome {
        ProbeOutcome::Healthy => println!("{} {}", style("●").green(), LinkState::Online),
        ProbeOutcome::Unhealthy { reason } => {
            println!("{} {} ({})", style("●").red(), LinkState::Offline, reason)
        }
    }

    println!("  {}", style(probe.url()).dim());
    Ok(())
}

/// Print the effective configuration.
pub fn show_config(config: &EdgeConfig, path: Option<&Path>) -> anyhow::Result<()> {
    println!("Current configuration:");
    for line in serde_yaml::to_string(config)?.lines() {
        println!("  {}", line);
    }

    match path.map(Path::to_path_buf).or_else(EdgeConfig::config_path) {
        Some(path) if path.exists() => println!("\nConfig file: {}", path.display()),
        Some(path) => println!("\nConfig file: {} (not found, using defaults)", path.display()),
        None => println!("\nConfig file: (no config directory)"),
    }

    Ok(())
}
