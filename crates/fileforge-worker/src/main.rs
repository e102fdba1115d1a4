//! File processing worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fileforge_jobstore::RedisJobStore;
use fileforge_processors::ProcessorRegistry;
use fileforge_queue::SqsQueue;
use fileforge_storage::S3BlobStore;
use fileforge_worker::{MessageHandler, WorkerConfig, WorkerLoop};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::from_default_env().add_directive("fileforge=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting fileforge-worker");

    // Load configuration
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => info!("Prometheus exporter listening on {}", addr),
            Err(e) => error!("Failed to start Prometheus exporter: {}", e),
        }
    }

    // Create collaborators
    let queue = match SqsQueue::from_env().await {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create queue client: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match S3BlobStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create blob store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = storage.check_connectivity().await {
        error!("Blob store connectivity check failed: {}", e);
        std::process::exit(1);
    }

    let jobs = match RedisJobStore::from_env() {
        Ok(j) => Arc::new(j),
        Err(e) => {
            error!("Failed to create job store: {}", e);
            std::process::exit(1);
        }
    };

    let handler = MessageHandler::new(ProcessorRegistry::with_default_processors(), storage, jobs);
    let worker = WorkerLoop::new(queue, handler, config.poll_interval);

    // Setup signal handlers
    let shutdown = worker.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown.stop();
    });

    // Run until shutdown
    worker.run().await;

    info!("Worker shutdown complete");
}
