use std::process;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::{writer::BoxMakeWriter, Layer}, layer::SubscriberExt, EnvFilter, Registry};

use config::Config;
use simulation::{Entropy, SeededEntropy, Simulator, ThreadEntropy, TokioPause};

mod config;
mod error;
mod routes;
mod schema;
mod simulation;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            process::exit(1);
        }
    };

    let _guards = match init_tracing(&config.log_file) {
        Ok(guards) => guards,
        Err(err) => {
            eprintln!("Unable to set global subscriber: {err}");
            process::exit(1);
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => {
            match listener.local_addr() {
                Ok(addr) => tracing::info!("Listening on port: {}", addr.port()),
                Err(err) => tracing::warn!("Listening, but the local address is unknown: {err}"),
            }
            listener
        }
        Err(err) => {
            tracing::error!("Failed to bind to port: {}", err);
            process::exit(1);
        }
    };

    let simulator = build_simulator(&config);
    tracing::info!(policy = ?simulator.policy(), "Simulator configured");
    let router = routes::app(Arc::new(simulator), config.body_limit);

    //start the http service
    let http_service = axum::serve(listener, router).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    });
    if let Err(err) = http_service.await {
        tracing::error!("Failed to start server: {}", err);
        process::exit(1);
    }
}

// stdout for humans, JSON lines in the log file
fn init_tracing(log_file: &str) -> Result<(WorkerGuard, WorkerGuard), tracing::subscriber::SetGlobalDefaultError> {
    let file_appender = tracing_appender::rolling::never(".", log_file);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let file_layer = Layer::new().json().with_writer(BoxMakeWriter::new(move || file_writer.clone()));
    let stdout_layer = Layer::new().with_writer(BoxMakeWriter::new(move || stdout_writer.clone()));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok((file_guard, stdout_guard))
}

fn build_simulator(config: &Config) -> Simulator {
    let entropy: Box<dyn Entropy> = match config.rng_seed {
        Some(seed) => {
            tracing::warn!(seed, "Using a seeded generator, outcomes are reproducible");
            Box::new(SeededEntropy::new(seed))
        }
        None => Box::new(ThreadEntropy),
    };
    Simulator::new(config.policy, entropy, Box::new(TokioPause))
}
