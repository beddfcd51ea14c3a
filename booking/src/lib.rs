//! Booking cart for a wellness resort front end.
//!
//! The cart holds one line per purchasable item (rooms, treatments, dining)
//! and drives three flows:
//!
//! - Cart operations (add, remove, update quantity, clear) with a derived
//!   total recomputed on every read
//! - Persistence that mirrors every cart mutation to a key-value blob and
//!   hydrates from it at startup, tolerating missing or corrupt data
//! - Simulated payments that settle a line or the whole cart after a fixed
//!   gateway delay and feed the receipt back into the cart
//!
//! # Quick Start
//!
//! ```no_run
//! use stillwater_booking::{BookingAction, BookingEnvironment, ItemDetails};
//! use stillwater_booking::payment::SimulatedGateway;
//! use stillwater_booking::storage::{CartStorage, MemoryBackend};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Hydrate a store from storage
//! let env = BookingEnvironment::new(
//!     Arc::new(CartStorage::new(Arc::new(MemoryBackend::new()))),
//!     SimulatedGateway::shared(),
//! );
//! let store = stillwater_booking::bootstrap(env);
//!
//! // Add a room and pay for it
//! store.send(BookingAction::AddItem {
//!     item: ItemDetails::new("r1", "Lakeview Room", 500.0),
//!     qty: 2,
//!     pay_now: false,
//! }).await?;
//! let mut handle = store.send(BookingAction::PayAll).await?;
//!
//! // Resolves once the settlement has been applied
//! handle.wait().await;
//! let total = store.state(|cart| cart.total()).await;
//! println!("Paid {total}");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod mocks;
pub mod payment;
pub mod reducer;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use context::{BookingStore, MissingProviderError, current, provide};
pub use reducer::{BookingEnvironment, BookingReducer};
pub use types::{BookingAction, CartLine, CartState, ItemDetails, ItemId, PaymentScope};

/// Builds a booking store hydrated from the environment's storage
///
/// Missing or corrupt persisted data yields an empty cart.
#[must_use]
pub fn bootstrap(env: BookingEnvironment) -> BookingStore {
    let cart = CartState::from_lines(env.storage.load());
    stillwater_runtime::Store::new(cart, BookingReducer::new(), env)
}
