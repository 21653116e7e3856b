use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocean_booking::booking::{FixedOutcomeSimulator, PaymentSimulator, UserChoiceSimulator};
use ocean_booking::config::{AppConfig, CrmBackend};
use ocean_booking::crm::{ContactStore, HubSpotClient, InMemoryContactStore};
use ocean_booking::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocean_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let store: Arc<dyn ContactStore> = match &config.crm {
        CrmBackend::HubSpot(hubspot) => {
            tracing::info!("Using HubSpot contact store at {}", hubspot.base_url);
            Arc::new(HubSpotClient::new(hubspot).context("Failed to build HubSpot client")?)
        }
        CrmBackend::Memory => {
            tracing::warn!("Using in-memory contact store; bookings are lost on restart");
            Arc::new(InMemoryContactStore::new())
        }
    };

    let payments: Arc<dyn PaymentSimulator> = match config.payment_outcome {
        Some(status) => {
            tracing::info!("Payment simulator fixed to {}", status);
            Arc::new(FixedOutcomeSimulator(status))
        }
        None => Arc::new(UserChoiceSimulator),
    };

    let state = AppState::new(store, payments, config.session_timeout);
    let app = app(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
