/*!
Server lifecycle: load the snapshot, serve HTTP until a stop signal, drain
in-flight requests, save the snapshot.
*/

use crate::http;
use anyhow::Context;
use axum::extract::Request;
use axum::ServiceExt;
use citydir_core::{
    create_store_from_config, DirectoryConfig, DirectoryService, LocalFileStorage, RecordStore,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Run the HTTP server with the given configuration until a stop signal
pub async fn run(config: DirectoryConfig) -> anyhow::Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Run the HTTP server until `shutdown` resolves
///
/// The snapshot is loaded before the listener is bound, so a malformed
/// snapshot aborts startup. Returns once the snapshot has been saved after
/// shutdown, or with the error that prevented startup or the final save.
pub async fn run_until<F>(config: DirectoryConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let store = load_store(&config)?;

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve_until(listener, store, config, shutdown).await
}

fn load_store(config: &DirectoryConfig) -> anyhow::Result<Arc<RecordStore<LocalFileStorage>>> {
    let store = create_store_from_config(config)?;

    let loaded = store
        .load()
        .with_context(|| format!("failed to load snapshot {}", store.snapshot_path()))?;
    info!(
        snapshot = store.snapshot_path(),
        records = loaded,
        "snapshot loaded"
    );

    Ok(Arc::new(store))
}

async fn serve_until<F>(
    listener: TcpListener,
    store: Arc<RecordStore<LocalFileStorage>>,
    config: DirectoryConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let directory = Arc::new(DirectoryService::new(Arc::clone(&store)));
    let app = http::app(directory, config.request_timeout());

    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "server running");

    let stop = Arc::new(Notify::new());
    let server_stop = Arc::clone(&stop);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(async move { server_stop.notified().await })
            .await
    });

    let served = tokio::select! {
        result = &mut server => {
            warn!("server stopped without a shutdown signal");
            result
        }
        _ = shutdown => {
            info!(
                grace_secs = config.shutdown_grace_secs,
                "shutdown signal received, draining requests"
            );
            stop.notify_one();
            match tokio::time::timeout(config.shutdown_grace(), &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("graceful shutdown timed out, saving with requests still in flight");
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    let save = tokio::task::spawn_blocking(move || store.save())
        .await
        .context("snapshot save task failed")?;
    match save {
        Ok(stats) => info!(records = stats.records, bytes = stats.bytes, "snapshot saved"),
        Err(e) => {
            error!(error = %e, "failed to save snapshot");
            return Err(e).context("failed to save snapshot");
        }
    }

    served
        .context("server task failed")?
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

/// Resolves on the first SIGINT, SIGTERM, SIGHUP or SIGQUIT
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let others = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::hangup()),
            signal(SignalKind::quit()),
        ) {
            (Ok(mut term), Ok(mut hup), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => {},
                    _ = hup.recv() => {},
                    _ = quit.recv() => {},
                }
            }
            _ => {
                error!("failed to install unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let others = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = others => {},
    }
}
