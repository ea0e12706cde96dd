use std::net::SocketAddr;
use std::sync::Arc;

use apollo_core::{config::env_or, Config, Provider};
use apollo_runner::{CloudBatchRunner, LocalRunner, Runner};
use apollo_secrets::{merge_secrets, InfisicalClient};
use apollo_server::{app, reload};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apollo_server=info,tower_http=info".into()),
        )
        .init();

    info!("starting apollo");

    // Secret provider first: its variables may feed the config and the
    // merged secret set. Failure is fatal only when the operator opted in.
    let use_infisical = env_or("USE_INFISICAL", "false") == "true";
    let provider_secrets = match InfisicalClient::from_env().load_secrets().await {
        Ok(secrets) => secrets,
        Err(e) if use_infisical => {
            return Err(anyhow::anyhow!("infisical init failed: {e}"));
        }
        Err(e) => {
            warn!("infisical unavailable, starting without provider secrets: {e}");
            Vec::new()
        }
    };

    let config = Config::load();
    let secrets = merge_secrets(&provider_secrets, &config.jobs.secrets);
    info!(
        provider = ?config.provider,
        environment = %config.environment,
        secrets = secrets.len(),
        image = %config.jobs.image,
        "config loaded"
    );

    let runner: Arc<dyn Runner> = match config.provider {
        Provider::CloudRun => Arc::new(
            CloudBatchRunner::new(
                config.gcp_project_id.clone(),
                config.gcp_region.clone(),
                config.jobs.image.clone(),
                secrets,
            )
            .with_service_account_email(config.gcp_service_account_email.clone())
            .with_persistent_disk(config.persistent_disk_name.clone()),
        ),
        Provider::Local => Arc::new(LocalRunner::new(config.jobs.image.clone(), secrets)),
    };

    let port = config.port;
    let state = Arc::new(app::AppState::new(config, runner).await);

    // Rehydrate the schedule table before accepting traffic.
    reload::reload(&state).await;

    let router = app::build_router(Arc::clone(&state));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("apollo listening on {addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on SIGINT or SIGTERM so the server drains in-flight RPCs
/// before exiting.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
