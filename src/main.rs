//! Asset scanner bot entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_scanner_bot::api::{create_routes, AppState};
use asset_scanner_bot::bot::{Bot, Dispatcher};
use asset_scanner_bot::config::logging::{env_filter, fmt_layer};
use asset_scanner_bot::config::{BotMode, APP_CONFIG};
use asset_scanner_bot::scanner::Scanner;
use asset_scanner_bot::sheets::{RowSink, SheetsClient};
use asset_scanner_bot::telegram::{run_polling, PollingOptions, TelegramClient};

// High-performance memory allocator for non-MSVC targets
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Polling task gets this long to finish its current batch on shutdown.
const POLLING_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() {
    // Initialize tracing (JSON lines in production)
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer(APP_CONFIG.is_production, std::io::stdout))
        .init();

    // Initialize Sentry
    let _guard = if APP_CONFIG.sentry_dsn.is_empty() {
        tracing::warn!("Sentry DSN not configured, error tracking disabled");
        None
    } else {
        Some(sentry::init((
            APP_CONFIG.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: APP_CONFIG.sentry_traces_sample_rate,
                sample_rate: 1.0, // Capture all errors
                ..Default::default()
            },
        )))
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if APP_CONFIG.worker_threads > 0 {
        builder.worker_threads(APP_CONFIG.worker_threads);
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to build Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(run());

    // Flush Sentry events before exit
    if let Some(client) = sentry::Hub::current().client() {
        client.flush(Some(Duration::from_secs(2)));
    }

    tracing::info!("Shutdown complete");
}

async fn run() {
    if let Err(e) = APP_CONFIG.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
    let mode = APP_CONFIG.mode().unwrap_or(BotMode::Polling);
    tracing::debug!(config = ?*APP_CONFIG, "Configuration loaded");

    // Telegram client
    let telegram = match TelegramClient::from_config(&APP_CONFIG) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create Telegram client: {}", e);
            std::process::exit(1);
        }
    };

    match telegram.get_me().await {
        Ok(me) => tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or_default(),
            "Connected to Telegram"
        ),
        Err(e) => tracing::warn!(error = %e, "Telegram getMe failed, continuing"),
    }

    // Google Sheets
    let sink = init_sheets();

    // Barcode / OCR scanner
    let scanner = match Scanner::from_config(&APP_CONFIG) {
        Ok(scanner) => scanner,
        Err(e) => {
            tracing::error!("Failed to create scanner: {}", e);
            std::process::exit(1);
        }
    };

    let bot = Arc::new(Bot::new(
        Arc::new(telegram.clone()),
        Arc::new(scanner),
        sink,
    ));
    let dispatcher = Dispatcher::new(bot);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let polling = match mode {
        BotMode::Polling => Some(tokio::spawn(run_polling(
            telegram.clone(),
            dispatcher.clone(),
            PollingOptions {
                interval: Duration::from_secs(APP_CONFIG.poll_interval_secs),
                timeout_secs: APP_CONFIG.poll_timeout_secs,
            },
            shutdown_rx,
        ))),
        BotMode::Webhook => {
            let url = format!(
                "{}/webhook",
                APP_CONFIG.webhook_public_url.trim_end_matches('/')
            );
            if let Err(e) = telegram.set_webhook(&url, &APP_CONFIG.webhook_secret).await {
                tracing::error!("Failed to register webhook: {}", e);
                std::process::exit(1);
            }
            tracing::info!(url = %url, "Webhook registered");
            None
        }
    };

    let state = AppState::new(dispatcher, telegram, &APP_CONFIG.webhook_secret);

    // Configure rate limiting with SmartIpKeyExtractor for better IP detection
    let Some(governor_config) = GovernorConfigBuilder::default()
        .per_second(APP_CONFIG.rate_limit_per_second)
        .burst_size(APP_CONFIG.rate_limit_burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
    else {
        tracing::error!("Failed to build rate limiter config");
        std::process::exit(1);
    };

    // Layer order (bottom to top execution): Trace -> Rate Limit
    let app = create_routes(state, mode == BotMode::Webhook)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_config));

    // Determine server address
    let port = match APP_CONFIG.port() {
        Ok(port) => port,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(
        port = port,
        mode = %mode,
        rate_limit_per_second = APP_CONFIG.rate_limit_per_second,
        rate_limit_burst = APP_CONFIG.rate_limit_burst_size,
        "Starting server"
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server with graceful shutdown and ConnectInfo for rate limiting
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .await;

    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
    }

    // Cleanup
    tracing::info!("Shutting down...");

    if let Some(handle) = polling {
        if tokio::time::timeout(POLLING_SHUTDOWN_GRACE, handle).await.is_err() {
            tracing::warn!("Polling task did not stop in time");
        }
    }
}

/// Connects to Google Sheets. The bot keeps running without it; saves then fail.
fn init_sheets() -> Option<Arc<dyn RowSink>> {
    if !APP_CONFIG.sheets_configured() {
        tracing::error!("SPREADSHEET_ID or SERVICE_ACCOUNT_JSON not provided, items will not be saved");
        return None;
    }

    match SheetsClient::from_config(&APP_CONFIG) {
        Ok(client) => {
            tracing::info!(
                service_account = client.service_account(),
                range = %APP_CONFIG.sheet_range,
                "Google Sheets configured"
            );
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!("Error connecting to Google Sheets: {}", e);
            None
        }
    }
}

/// Handles shutdown signals for graceful termination.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        },
    }
}
