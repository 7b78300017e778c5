// src/main.rs
//! Punto de entrada del microservicio `alert-delivery-service`.
//!
//! - Cargar configuración, tracing y métricas.
//! - Construir stores, caché de outputs, registro de notifiers y las etapas del pipeline.
//! - Arrancar el queue poller y el servidor HTTP (feature `http`).
//! - Gestionar apagado ordenado (graceful shutdown).

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{select, signal, sync::broadcast, task::JoinSet};
use tracing::{error, info, warn};

use alert_delivery_service::adapter::notifier::http_client::HttpDelivery;
use alert_delivery_service::adapter::notifier::notifier_registry::NotifierRegistry;
use alert_delivery_service::config::app_config::AppConfig;
use alert_delivery_service::repository::alert_store::{AlertStore, AnalysisStore, InMemoryAlertStore, InMemoryAnalysisStore};
use alert_delivery_service::repository::output_store::FileOutputStore;
use alert_delivery_service::repository::work_queue::InMemoryWorkQueue;
use alert_delivery_service::scheduler::queue_poller::QueuePoller;
use alert_delivery_service::scheduler::retry_scheduler::RetryScheduler;
use alert_delivery_service::service::notification_dispatcher::NotificationDispatcher;
use alert_delivery_service::service::outputs_cache::OutputsCache;
use alert_delivery_service::service::status_recorder::StatusRecorder;
use alert_delivery_service::telemetry;
use alert_delivery_service::usecase::alert_delivery::AlertDeliveryService;

/// Tiempo máximo para que las tareas terminen tras la señal de parada.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Señales de shutdown compartidas entre tareas.
#[derive(Clone)]
struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(8);
        Self { tx }
    }
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
    fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

#[tokio::main]
async fn main() {
    let cfg = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    telemetry::tracing::init_tracing(&cfg.logging);
    telemetry::metrics::register_core_metrics();

    if let Err(e) = run(cfg).await {
        error!(error = %format!("{e:#}"), "service terminated with error");
        std::process::exit(1);
    }
}

async fn run(cfg: Arc<AppConfig>) -> anyhow::Result<()> {
    // 1) Stores
    let alerts: Arc<dyn AlertStore> = match &cfg.stores.alerts_file {
        Some(path) => Arc::new(InMemoryAlertStore::from_yaml_file(path).await?),
        None => Arc::new(InMemoryAlertStore::new(vec![])),
    };
    let analyses: Arc<dyn AnalysisStore> = match &cfg.stores.analyses_file {
        Some(path) => Arc::new(InMemoryAnalysisStore::from_yaml_file(path).await?),
        None => Arc::new(InMemoryAnalysisStore::new(vec![])),
    };
    let outputs = Arc::new(FileOutputStore::new(cfg.stores.outputs_file.clone()));

    // 2) Pipeline
    let cache = Arc::new(OutputsCache::new(outputs, cfg.outputs_refresh_interval()));
    let http = HttpDelivery::new(cfg.http_timeout()).context("failed to build HTTP client")?;
    let registry = Arc::new(NotifierRegistry::with_http_notifiers(http));
    let queue = Arc::new(InMemoryWorkQueue::new());

    let service = Arc::new(AlertDeliveryService::new(
        cache,
        NotificationDispatcher::new(registry, cfg.delivery.max_in_flight_deliveries),
        StatusRecorder::new(alerts.clone()),
        RetryScheduler::new(queue.clone(), cfg.retry_policy()),
        alerts,
        analyses,
    ));

    let shutdown = Shutdown::new();
    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    // 3) Queue poller
    let poller = Arc::new(QueuePoller::new(queue.clone(), service.clone(), cfg.poller_config())).start();

    // 4) Servidor HTTP
    #[cfg(feature = "http")]
    {
        use alert_delivery_service::adapter::http::{controller::HttpController, routes::build_router};

        let listener = tokio::net::TcpListener::bind(&cfg.http.bind)
            .await
            .with_context(|| format!("failed to bind {}", cfg.http.bind))?;
        let router = build_router(Arc::new(HttpController::new(service.clone(), queue.clone())));
        let mut http_shutdown_rx = shutdown.subscribe();

        info!(bind = %cfg.http.bind, "HTTP server listening");
        tasks.spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = http_shutdown_rx.recv().await;
                    info!("shutdown signal received by HTTP server");
                })
                .await
                .context("HTTP server failed")
        });
    }

    info!(profile = %cfg.environment.profile, "alert-delivery-service started");

    // 5) Esperar señal de parada
    wait_for_signal().await;
    shutdown.trigger();

    if let Err(e) = poller.shutdown().await {
        warn!(error = %e, "queue poller did not stop cleanly");
    }

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %format!("{e:#}"), "task finished with error"),
                Err(e) => error!(error = %e, "task panicked during shutdown"),
            }
        }
    })
    .await;

    match drained {
        Ok(()) => info!("clean shutdown completed"),
        Err(_) => warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "shutdown timed out, exiting"),
    }
    let pending = queue.len().await;
    if pending > 0 {
        warn!(pending, "exiting with undelivered messages in the work queue");
    }
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("stop signal received, shutting down");
}
