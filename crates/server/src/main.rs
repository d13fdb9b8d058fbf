use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convertino_core::{
    create_audit_system, create_authenticator, load_config, validate_config, AuditEvent,
    AuditSink, AuditStore, Authenticator, CloudConvertClient, ContentCache, ConversionClient,
    ConversionOrchestrator, CreditMonitor, FsContentCache, SqliteAuditStore,
};

use convertino_server::api::create_router;
use convertino_server::files::FilesRoot;
use convertino_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("CONVERTINO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);
    info!("Cache directory: {:?}", config.cache.dir);

    // Hash of the sanitized config, recorded with ServiceStarted
    let sanitized = convertino_core::SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    let client: Arc<dyn ConversionClient> = Arc::new(
        CloudConvertClient::new(config.cloudconvert.clone())
            .context("Failed to create CloudConvert client")?,
    );
    info!(
        "CloudConvert client at {} (import: {:?})",
        config.cloudconvert.api_url, config.cloudconvert.import_method
    );

    let cache: Arc<dyn ContentCache> = Arc::new(FsContentCache::from_config(&config.cache));
    let audit_sink: Arc<dyn AuditSink> = Arc::new(audit_handle.clone());

    let orchestrator = Arc::new(
        ConversionOrchestrator::new(Arc::clone(&client), cache).with_audit(Arc::clone(&audit_sink)),
    );

    let monitor = CreditMonitor::new(Arc::clone(&client), config.credit_monitor.clone())
        .with_audit(Arc::clone(&audit_sink));
    monitor.start();

    let files_root = FilesRoot::create(&config.server.files_root)
        .await
        .with_context(|| format!("Failed to prepare files root {:?}", config.server.files_root))?;
    info!("Files root: {:?}", files_root.path());

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        audit_store,
        orchestrator,
        files_root,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    if monitor.is_running() {
        info!("Stopping credit monitor...");
        monitor.stop();
    }

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The writer exits once every AuditHandle clone is gone, so the final
    // event must be emitted before these drops.
    drop(monitor);
    drop(audit_sink);
    drop(audit_handle);

    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
