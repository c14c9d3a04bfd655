use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};

use orbsplit::api::{RatesApiState, SessionApiState, SplitApiState};
use orbsplit::config::Config;
use orbsplit::rates::{PriceFeedClient, RateBook};
use orbsplit::session::{SessionData, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging starts at the right level
    let config = Arc::new(Config::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check ORBSPLIT_* environment variables.");
        e
    })?);

    init_logging(&config)?;

    info!("Starting orbsplit loot split service");
    info!(
        league = %config.feed.league,
        major = %config.feed.major_currency,
        reference = %config.feed.reference_currency,
        "Price feed configured"
    );

    // Initialize components
    let feed = Arc::new(
        PriceFeedClient::new(config.feed_config()).context("Failed to create price feed client")?,
    );
    let rates = Arc::new(RwLock::new(RateBook::new(config.feed.league.clone())));
    let store = Arc::new(SessionStore::new(config.session.data_path.clone()));
    let session = Arc::new(RwLock::new(load_session(&store, &config)));
    let units = Arc::new(config.unit_names());

    if config.feed.refresh_on_start {
        refresh_rates_on_start(&feed, &rates).await;
    }

    // Build the application with nested routers
    let app = Router::new()
        .nest(
            "/split",
            orbsplit::api::create_split_router(SplitApiState {
                rates: rates.clone(),
                session: session.clone(),
                store: store.clone(),
            }),
        )
        .nest(
            "/rates",
            orbsplit::api::create_rates_router(RatesApiState {
                rates: rates.clone(),
                feed: feed.clone(),
            }),
        )
        .nest(
            "/session",
            orbsplit::api::create_session_router(SessionApiState {
                session: session.clone(),
                store: store.clone(),
                rates: rates.clone(),
                units: units.clone(),
            }),
        )
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("orbsplit listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;
    Ok(())
}

/// Load the persisted session, falling back to a fresh one when the
/// file is missing or unreadable. A corrupt file is logged and left in
/// place; the next save overwrites it.
fn load_session(store: &SessionStore, config: &Config) -> SessionData {
    match store.load() {
        Ok(Some(session)) => session,
        Ok(None) => {
            info!(group = %config.session.group_name, "Starting a fresh session");
            SessionData::new(config.session.group_name.clone())
        }
        Err(e) => {
            warn!(error = ?e, "Session file unreadable, starting fresh");
            SessionData::new(config.session.group_name.clone())
        }
    }
}

/// One feed fetch at startup, mirroring the original page-load refresh.
/// Manual overrides cannot exist yet, so a plain apply is enough; total
/// failure keeps the fallback constants the book started with.
async fn refresh_rates_on_start(feed: &PriceFeedClient, rates: &Arc<RwLock<RateBook>>) {
    match feed.fetch_rates().await {
        Ok(feed_rates) => {
            let mut book = rates.write().await;
            book.apply(&feed_rates);
            info!(via = %feed_rates.fetched_via, "Loaded exchange rates at startup");
        }
        Err(e) => {
            warn!(error = ?e, "Price feed unavailable at startup, using fallback rates");
        }
    }
}
