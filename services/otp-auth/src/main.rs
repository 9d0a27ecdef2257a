use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{info, warn};

use portal_core::tracing::init_tracing;
use portal_otp_auth::config::{Delivery, OtpAuthConfig};
use portal_otp_auth::infra::notifier::{DeliveryNotifier, LogNotifier, SmtpNotifier};
use portal_otp_auth::infra::router_auth::HttpNetworkAuthorizer;
use portal_otp_auth::router::build_router;
use portal_otp_auth::state::PortalCore;
use portal_otp_auth::usecase::sweep::spawn_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let config = OtpAuthConfig::from_args()?;
    let settings = config.core.clone();

    let notifier = match config.delivery {
        Delivery::Simulated => {
            warn!("email simulation mode: otps are logged, not sent");
            DeliveryNotifier::Simulated(LogNotifier::new(settings.otp_validity_secs))
        }
        Delivery::Smtp(smtp) => {
            info!(
                server = %smtp.server,
                port = smtp.port,
                from = %smtp.from,
                "smtp delivery enabled"
            );
            DeliveryNotifier::Smtp(SmtpNotifier::new(
                smtp,
                settings.otp_validity_secs,
                settings.collaborator_timeout,
            )?)
        }
    };
    let authorizer =
        HttpNetworkAuthorizer::new(config.router_auth_url.clone(), settings.collaborator_timeout)?;

    info!(
        otp_length = settings.otp_length,
        otp_validity_secs = settings.otp_validity_secs,
        session_duration_secs = settings.session_duration_secs,
        email_enabled = settings.notifier_enabled,
        router_auth_url = %config.router_auth_url,
        "otp auth configured"
    );

    let core: Arc<PortalCore> = Arc::new(PortalCore::new(settings, notifier, authorizer));

    let sweeper = config
        .sweep_interval
        .map(|period| spawn_sweeper(Arc::clone(&core), period));

    let router = build_router(core);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("otp auth service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("otp auth service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
