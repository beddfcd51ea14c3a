//! Front desk walkthrough for the booking stack.
//!
//! Hydrates the cart from disk, runs a short booking session against the
//! simulated payment gateway, and optionally follows the resort's live
//! event feed. Set `STILLWATER_API_BASE` to point the feed at a real host.

mod config;

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use stillwater_booking::payment::SimulatedGateway;
use stillwater_booking::storage::{CartStorage, JsonFileBackend};
use stillwater_booking::{BookingAction, BookingEnvironment, ItemDetails};
use stillwater_events::{EventStreamClient, HttpTransport, StreamConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "frontdesk=info,stillwater_booking=info,stillwater_events=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(cart_dir = %config.cart_dir, "front desk starting");

    let storage = Arc::new(CartStorage::new(Arc::new(JsonFileBackend::new(
        &config.cart_dir,
    ))));
    let env = BookingEnvironment::new(storage, SimulatedGateway::shared());
    let store = Arc::new(stillwater_booking::bootstrap(env));

    let carried = store.state(|cart| cart.lines.len()).await;
    if carried > 0 {
        info!(lines = carried, "resumed a saved cart");
    }

    // Log every cart snapshot as the session mutates it.
    let mut snapshots = store.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let (lines, total) = {
                let cart = snapshots.borrow();
                (cart.lines.len(), cart.total())
            };
            info!(lines, total, "cart updated");
        }
    });

    let events = config.api_base.as_deref().map(|base| {
        EventStreamClient::new(Arc::new(HttpTransport::new()), StreamConfig::new(base))
    });
    match &events {
        Some(client) => {
            client
                .connect(|event| info!(%event, "resort event"))
                .await;
        }
        None => info!("event feed disabled; set STILLWATER_API_BASE to enable it"),
    }

    stillwater_booking::provide(Arc::clone(&store), booking_session()).await?;

    if let Some(client) = &events {
        client.disconnect().await;
    }
    store.shutdown(Duration::from_secs(5)).await?;
    info!("front desk done");
    Ok(())
}

/// One scripted booking session against the ambient store.
async fn booking_session() -> Result<(), Box<dyn std::error::Error>> {
    let store = stillwater_booking::current()?;

    info!("booking a room and a massage");
    store
        .send(BookingAction::AddItem {
            item: ItemDetails::new("room_lakeview", "Lakeview Room", 420.0),
            qty: 1,
            pay_now: false,
        })
        .await?;
    store
        .send(BookingAction::AddItem {
            item: ItemDetails::new("spa_massage", "Deep Tissue Massage", 110.0)
                .with_portion("60 min"),
            qty: 2,
            pay_now: false,
        })
        .await?;

    info!("extending the stay to two nights");
    store
        .send(BookingAction::UpdateQty {
            id: "room_lakeview".into(),
            qty: 2,
        })
        .await?;

    info!("a kayak rental goes in, then gets dropped");
    store
        .send(BookingAction::AddItem {
            item: ItemDetails::new("kayak_rental", "Kayak Rental", 45.0),
            qty: 1,
            pay_now: false,
        })
        .await?;
    store
        .send(BookingAction::RemoveItem {
            id: "kayak_rental".into(),
        })
        .await?;

    info!("settling the massage up front");
    let mut handle = store
        .send(BookingAction::PayItem {
            id: "spa_massage".into(),
        })
        .await?;
    handle.wait().await;

    info!("dinner goes on the card right away");
    let mut handle = store
        .send(BookingAction::AddItem {
            item: ItemDetails::new("dinner_tasting", "Tasting Menu Dinner", 95.0),
            qty: 2,
            pay_now: true,
        })
        .await?;
    handle.wait().await;

    info!("settling the remainder at checkout");
    let mut handle = store.send(BookingAction::PayAll).await?;
    handle.wait().await;

    store
        .state(|cart| {
            for line in &cart.lines {
                info!(
                    id = %line.id,
                    qty = line.qty,
                    paid = line.paid,
                    line_total = line.line_total(),
                    "cart line"
                );
            }
            info!(total = cart.total(), "session total");
        })
        .await;

    Ok(())
}
