use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredStore};
use crate::routes::with_contact_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use portfolio_contact::config::AppConfig;
use portfolio_contact::contact::{
    NotificationDispatcher, SmtpMailTransport, SubmissionHandler, TracingObserver,
};
use portfolio_contact::error::AppError;
use portfolio_contact::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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

    let store = Arc::new(ConfiguredStore::from_config(&config.storage)?);
    let transport = Arc::new(SmtpMailTransport::from_settings(&config.mail)?);
    let observer = Arc::new(TracingObserver::new(config.mail.detail));

    if config.mail.is_configured() {
        info!(
            relay = %config.mail.smtp_host,
            port = config.mail.smtp_port,
            "email notifications enabled"
        );
    } else {
        warn!("EMAIL_USER/EMAIL_PASS not set; submissions will be stored without email");
    }
    info!(store = %store.describe(), "contact store ready");

    let dispatcher = NotificationDispatcher::new(config.mail.clone(), transport);
    let handler = Arc::new(SubmissionHandler::with_observer(store, dispatcher, observer));

    let app = with_contact_routes(handler)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "portfolio contact service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
