//! Runs one checkout end to end against the configured backend.
//!
//! Usage: `checkout-demo <email> <password> <booking-id> [card-number]`

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rental_checkout::{
    api::{ApiClient, AuthService, BookingService, PaymentService},
    checkout::{ChannelNavigator, CheckoutController, CheckoutState},
    config::AppConfig,
    payment::{CardDetails, PaymentAdapter, mock::CARD_SUCCESS},
    session::{SessionProvider, SharedSession},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rental_checkout=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password), Some(booking_id)) = (args.next(), args.next(), args.next())
    else {
        bail!("usage: checkout-demo <email> <password> <booking-id> [card-number]");
    };
    let card_number = args.next().unwrap_or_else(|| CARD_SUCCESS.to_string());

    let config = AppConfig::from_env()?;
    let session = SharedSession::new();
    let provider: Arc<dyn SessionProvider> = Arc::new(session.clone());
    let client = ApiClient::from_config(&config, Arc::clone(&provider))?;

    AuthService::new(client.clone(), session)
        .login(&email, &password)
        .await
        .context("login failed")?;

    let adapter = PaymentAdapter::from_config(
        &config.payment_provider,
        PaymentService::new(client.clone()),
        config.http_timeout,
    )?;
    let (navigator, mut routes) = ChannelNavigator::new();
    let checkout = CheckoutController::new(
        BookingService::new(client),
        adapter,
        provider,
        Arc::new(navigator),
    )
    .with_redirect_delay(config.redirect_delay);

    checkout.mount(&booking_id).await;
    let view = checkout.view();
    println!("{}: {}", view.headline, view.detail);
    if !matches!(checkout.state(), CheckoutState::Ready(_)) {
        bail!("checkout could not start ({:?})", view.action);
    }

    let card = CardDetails::new(card_number, 12, 2030, "123");
    checkout.submit(&card, false).await;

    let view = checkout.view();
    println!("{}: {}", view.headline, view.detail);
    if let CheckoutState::Succeeded { .. } = checkout.state() {
        if let Some(route) = routes.recv().await {
            println!("-> {}", route.path());
        }
    }
    Ok(())
}
