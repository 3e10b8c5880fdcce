#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use axum::Router;
use axum::extract::ConnectInfo;
use clap::Parser;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use qrgen_core::{PngEncoder, QrGenerator, QrService};
use server::config::{CliArgs, ServerConfig};
use server::service::handler::{AppState, router};
use server::telemetry::init_telemetry;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry(&config)?;
    debug!(
        port = config.port,
        read_timeout = ?config.read_timeout,
        write_timeout = ?config.write_timeout,
        max_body_size = config.max_body_size,
        "Configuration loaded"
    );

    let service: Arc<dyn QrGenerator> = Arc::new(QrService::new(PngEncoder::new()));
    debug!("QR service initialized");

    let state = AppState::new(service, config.max_body_size);
    let app = router(state).layer(TraceLayer::new_for_http());
    debug!(endpoints = ?["/generate", "/health"], "HTTP routes registered");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "Server failed to start");
            return Err(err).with_context(|| format!("failed to bind {addr}"));
        }
    };

    info!(port = config.port, %addr, "Starting server");
    serve(listener, app, &config).await
}

/// Accept loop plus the shutdown state machine.
///
/// Serves each accepted connection on its own task until a termination
/// signal arrives, then stops accepting and drains in-flight connections,
/// bounded by the configured shutdown timeout. Timeout expiry is fatal.
async fn serve(listener: TcpListener, app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let mut connection_builder = ConnectionBuilder::new(TokioExecutor::new());
    connection_builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_header_timeout);
    connection_builder
        .http2()
        .timer(TokioTimer::new())
        .keep_alive_interval(config.idle_timeout)
        .keep_alive_timeout(config.idle_timeout);

    // The body timeouts wrap the router from outside: request bodies are
    // bounded while the handler reads them, response bodies while hyper
    // writes them. These are the per-connection read/write bounds.
    let app = ServiceBuilder::new()
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
        .layer(ResponseBodyTimeoutLayer::new(config.write_timeout))
        .service(app);

    let graceful = GracefulShutdown::new();
    let mut signal = pin!(shutdown_signal());

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "Failed to accept connection");
                        continue;
                    }
                };

                let app = app.clone();
                let hyper_service =
                    service_fn(move |mut request: hyper::Request<hyper::body::Incoming>| {
                        // Handlers read the peer address out of this extension.
                        request.extensions_mut().insert(ConnectInfo(remote_addr));
                        app.clone().oneshot(request)
                    });

                let connection = connection_builder
                    .serve_connection_with_upgrades(TokioIo::new(stream), hyper_service);
                let connection = graceful.watch(connection.into_owned());

                tokio::spawn(async move {
                    if let Err(err) = connection.await {
                        debug!(error = %err, "Connection closed with error");
                    }
                });
            }
            received = &mut signal => {
                info!(signal = received, "Shutdown signal received");
                break;
            }
        }
    }

    drop(listener);
    debug!(timeout = ?config.shutdown_timeout, "Initiating graceful shutdown");

    tokio::select! {
        () = graceful.shutdown() => {
            info!("Server exited gracefully");
            Ok(())
        }
        () = tokio::time::sleep(config.shutdown_timeout) => {
            error!(timeout = ?config.shutdown_timeout, "Server forced to shutdown");
            anyhow::bail!(
                "graceful shutdown timed out after {:?}",
                config.shutdown_timeout
            )
        }
    }
}

/// Blocks until SIGINT or SIGTERM is received; reports which one.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
