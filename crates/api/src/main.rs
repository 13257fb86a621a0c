use errly_infra::Config;

#[tokio::main]
async fn main() {
    errly_observability::init();

    let config = Config::from_env().expect("invalid configuration");
    let bind_addr = config.bind_addr();
    let shutdown_grace = config.shutdown_grace;

    let app = errly_api::build_app(config)
        .await
        .expect("failed to build application");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    // `with_graceful_shutdown` stops accepting new connections once the
    // signal fires and then waits, unbounded, for in-flight requests to
    // finish. spec.md §6 wants that wait capped at `shutdown_grace`, so a
    // stuck connection can't hold the process open forever: race the serve
    // future against a timer that only starts once the signal has fired.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });

    tokio::select! {
        result = serve => result.unwrap(),
        _ = grace_period_elapsed(signalled_rx, shutdown_grace) => {
            tracing::warn!("graceful shutdown exceeded its grace period, exiting anyway");
        }
    }
}

async fn grace_period_elapsed(signalled_rx: tokio::sync::oneshot::Receiver<()>, grace: std::time::Duration) {
    if signalled_rx.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining in-flight requests");
}
