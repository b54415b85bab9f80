//! Brand Mention Monitor — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the source registry, job manager,
//! notification dispatcher, and middleware.
//!
//! See `README.md` for quickstart and configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brand_mention_monitor::api::{create_router, AppState};
use brand_mention_monitor::config::Settings;
use brand_mention_monitor::enrich::EnrichmentPipeline;
use brand_mention_monitor::fallback::FallbackExecutor;
use brand_mention_monitor::jobs::manager::JobManager;
use brand_mention_monitor::jobs::store::InMemoryJobStore;
use brand_mention_monitor::metrics::Metrics;
use brand_mention_monitor::notify::dispatch::Dispatcher;
use brand_mention_monitor::notify::email::{LogMailer, Mailer, SmtpMailer};
use brand_mention_monitor::notify::log::InMemoryNotificationLog;
use brand_mention_monitor::sources::SourceRegistry;
use brand_mention_monitor::store::InMemoryPostStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("brand_mention_monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::load()?;
    let metrics = Metrics::init(settings.jobs.max_concurrency);

    let client = reqwest::Client::builder()
        .user_agent(concat!("brand-mention-monitor/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;

    let registry = Arc::new(SourceRegistry::from_settings(&settings, client));
    info!(sources = ?registry.ids(), "source registry ready");

    let posts = Arc::new(InMemoryPostStore::new());
    let pipeline = Arc::new(EnrichmentPipeline::from_settings(&settings));
    let executor = Arc::new(FallbackExecutor::new(Duration::from_secs(
        settings.jobs.tier_timeout_secs,
    )));

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_env() {
        Ok(smtp) => Arc::new(smtp),
        Err(err) => {
            warn!(error = %err, "SMTP not configured, alerts go to the log");
            Arc::new(LogMailer)
        }
    };
    let (notify_tx, notify_rx) = tokio::sync::mpsc::channel(settings.notify.queue_capacity);
    let dispatcher = Dispatcher::new(
        settings.notify.triggers.clone(),
        Arc::new(InMemoryNotificationLog::new()),
        mailer,
        posts.clone(),
        chrono::Duration::seconds(settings.notify.batch_window_secs as i64),
    );
    tokio::spawn(dispatcher.run(notify_rx));

    let manager = Arc::new(JobManager::new(
        Arc::new(InMemoryJobStore::new()),
        registry,
        executor,
        pipeline,
        posts,
        notify_tx,
        settings.jobs.max_concurrency,
        settings.jobs.default_limit,
    ));

    let router = create_router(AppState { manager }).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
