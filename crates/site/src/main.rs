use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use wasui_core::events::EventBus;
use wasui_core::Record;
use wasui_query::PaginationMeta;
use wasui_site::cache::FileCache;
use wasui_site::config::SiteConfig;
use wasui_site::pages::home::HomePreview;
use wasui_site::pages::{PageController, PageKind};
use wasui_site::poller::Poller;
use wasui_site::state::SiteState;
use wasui_site::submit::ViewLifetime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = SiteConfig::from_env().context("failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting WASUI site runtime");

    let cache = FileCache::open(&config.cache_dir)
        .with_context(|| format!("failed to open cache at {}", config.cache_dir.display()))?;
    tracing::info!(dir = %config.cache_dir.display(), "Opened content cache");

    let event_bus = EventBus::new(config.event_bus_capacity);
    let state = SiteState::new(config.clone(), Arc::new(cache), event_bus);

    let report = state
        .reload_from_cache()
        .context("failed to read content cache")?;
    tracing::info!(
        loaded = report.replaced.len(),
        rejected = report.rejected.len(),
        "Initial content loaded"
    );

    let home = HomePreview::build(&state).context("failed to build home previews")?;
    log_home(&home);

    // One live list view per page, logging what it would draw.
    let lifetime = ViewLifetime::new();
    let mut command_senders = Vec::new();
    let mut pages = Vec::new();
    for kind in [PageKind::News, PageKind::Products, PageKind::Gifts, PageKind::Reviews] {
        let (tx, rx) = mpsc::channel(16);
        let controller = PageController::new(kind, state.clone(), log_renderer(kind));
        pages.push(tokio::spawn(controller.run(rx, lifetime.clone())));
        command_senders.push(tx);
    }

    let poller = Poller::spawn(state.clone(), config.poll_interval);
    tracing::info!(interval_ms = config.poll_interval.as_millis() as u64, "Polling cache");

    shutdown_signal().await;

    poller.shutdown().await;
    lifetime.close();
    drop(command_senders);
    for page in pages {
        match page.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "page stopped with an error"),
            Err(e) => tracing::warn!(error = %e, "page task panicked"),
        }
    }

    tracing::info!("Site runtime shut down gracefully");
    Ok(())
}

fn log_home(home: &HomePreview) {
    let titles = |records: &[Record]| {
        records
            .iter()
            .filter_map(|r| r.title().map(str::to_string))
            .collect::<Vec<_>>()
    };
    tracing::info!(
        news = ?titles(&home.news),
        products = ?titles(&home.products),
        gifts = ?titles(&home.gifts),
        reviews = home.reviews.len(),
        notice = home.notice.as_deref().unwrap_or(""),
        "Home previews"
    );
}

fn log_renderer(kind: PageKind) -> impl FnMut(&[Record], &PaginationMeta) + Send {
    move |items: &[Record], meta: &PaginationMeta| {
        let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
        tracing::info!(
            page = ?kind,
            items = ?ids,
            current_page = meta.current_page,
            total_pages = meta.total_pages,
            total_matches = meta.total_matches,
            "Rendered page"
        );
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
