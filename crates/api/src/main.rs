use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use meshgen_api::config::ServerConfig;
use meshgen_api::router::build_app_router;
use meshgen_api::state::AppState;
use meshgen_db::store::PgMeshStore;
use meshgen_pipeline::fetcher::ArtifactFetcher;
use meshgen_pipeline::orchestrator::PipelineOrchestrator;
use meshgen_tripo::api::TripoApi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meshgen_api=debug,meshgen_pipeline=debug,meshgen_tripo=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = %config.port,
        base_url = %config.remote.base_url,
        artifact_path = %config.pipeline.artifact_path.display(),
        scripts_enabled = config.scripts.is_some(),
        "Loaded server configuration",
    );

    // --- Database ---
    let pool = meshgen_db::create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    meshgen_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    meshgen_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Pipeline ---
    let store = Arc::new(PgMeshStore::new(pool));
    let tasks = Arc::new(TripoApi::new(
        &config.remote.base_url,
        config.remote.api_key.clone(),
    )?);
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        tasks,
        Arc::new(ArtifactFetcher::new()),
        store.clone(),
        Arc::new(config.pipeline.clone()),
    ));

    // --- App state ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let state = AppState {
        store,
        orchestrator,
        config: Arc::new(config),
    };
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
///
/// In-flight requests are dropped with the server, which cancels any
/// pipeline they were running.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
