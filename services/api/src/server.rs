use crate::cli::ServeArgs;
use crate::infra::{seed_portfolio, AppState, InMemoryPublicationStore};
use crate::routes::with_publication_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use brokerage_desk::config::AppConfig;
use brokerage_desk::error::AppError;
use brokerage_desk::telemetry;
use brokerage_desk::workflows::publication::PublicationService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryPublicationStore::default());
    store.set_digital_authorization_required(config.publication.digital_authorization_required);
    seed_portfolio(&store);
    let service = Arc::new(PublicationService::standard(store, &config.publication));

    let app = with_publication_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        digital_authorization_required = config.publication.digital_authorization_required,
        "publication gate ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
