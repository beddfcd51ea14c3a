//! Scoped access to a shared booking store.
//!
//! The cart is owned by one store per session, constructed explicitly and
//! made available to nested code through a task-scoped provider rather than
//! a process-wide global. Tests can run independent carts side by side by
//! giving each task its own scope.

use crate::reducer::{BookingEnvironment, BookingReducer};
use crate::types::{BookingAction, CartState};
use std::future::Future;
use std::sync::Arc;
use stillwater_runtime::Store;
use thiserror::Error;

/// The concrete store type driving a booking session
pub type BookingStore = Store<CartState, BookingAction, BookingEnvironment, BookingReducer>;

tokio::task_local! {
    static BOOKING_STORE: Arc<BookingStore>;
}

/// Raised by [`current`] outside a [`provide`] scope
///
/// This is a programming error in the caller, not a runtime condition to
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no booking store in scope; wrap the task in stillwater_booking::provide")]
pub struct MissingProviderError;

/// Runs `fut` with `store` in scope for [`current`]
///
/// Scopes nest per task: an inner `provide` shadows the outer store until
/// its future completes.
pub async fn provide<F>(store: Arc<BookingStore>, fut: F) -> F::Output
where
    F: Future,
{
    BOOKING_STORE.scope(store, fut).await
}

/// Returns the booking store provided to the current task
///
/// # Errors
///
/// Returns [`MissingProviderError`] when called outside a [`provide`]
/// scope.
pub fn current() -> Result<Arc<BookingStore>, MissingProviderError> {
    BOOKING_STORE
        .try_with(Arc::clone)
        .map_err(|_| MissingProviderError)
}
