use scope_api::{
    create_app, AppState, Config, Database, MemoryStore, Repositories, ScopeService,
    TokenAuthenticationService,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scope_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Starting scope API with config: {:?}", config);

    let repos = open_store(&config)?;
    let state = AppState {
        scope_service: Arc::new(ScopeService::new(repos)),
        auth_service: Arc::new(TokenAuthenticationService::new(config.auth.clone())),
        config: config.clone(),
    };

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;
    info!("Server listening on {}", addr);

    // Run the server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Repositories> {
    match (&config.store.url, &config.store.key) {
        (Some(url), Some(key)) => {
            info!("Using document store at {}", url);
            Ok(Repositories::from_store(Arc::new(Database::new(url, key))))
        }
        _ => {
            let store = match &config.store.seed_file {
                Some(path) => MemoryStore::from_file(path)?,
                None => {
                    warn!("No STORE_URL or STORE_SEED_FILE configured, starting with an empty in-memory store");
                    MemoryStore::new()
                }
            };
            Ok(Repositories::from_store(Arc::new(store)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
