//! Payment simulation.
//!
//! Checkout runs against a [`PaymentGateway`] seam. The only production
//! implementation here is [`SimulatedGateway`], which settles every request
//! after a fixed delay: this front end demonstrates the booking flow, it
//! does not move money. The seam exists so the reducer never learns which
//! gateway is behind it.

use crate::types::PaymentScope;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Proof of a settled payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Gateway-issued settlement reference
    pub reference: String,
}

/// Asynchronous payment confirmation
///
/// `confirm` is infallible by contract: a gateway resolves every request,
/// and declines would surface as a different receipt shape rather than an
/// error. The simulation approves everything.
pub trait PaymentGateway: Send + Sync {
    /// Confirm payment for the given scope, resolving to a receipt
    fn confirm(&self, scope: PaymentScope) -> Pin<Box<dyn Future<Output = PaymentReceipt> + Send>>;
}

/// Fixed-delay gateway that approves every payment
///
/// Single-line confirmations and whole-cart confirmations carry separate
/// delays so the two flows are distinguishable in demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedGateway {
    line_delay: Duration,
    all_delay: Duration,
}

impl SimulatedGateway {
    /// Creates a gateway with explicit settle delays
    #[must_use]
    pub const fn new(line_delay: Duration, all_delay: Duration) -> Self {
        Self {
            line_delay,
            all_delay,
        }
    }

    /// Creates the default gateway behind a shareable handle
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::default())
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(600), Duration::from_millis(700))
    }
}

impl PaymentGateway for SimulatedGateway {
    fn confirm(&self, scope: PaymentScope) -> Pin<Box<dyn Future<Output = PaymentReceipt> + Send>> {
        let delay = match scope {
            PaymentScope::Line(_) => self.line_delay,
            PaymentScope::All => self.all_delay,
        };

        Box::pin(async move {
            tracing::info!(?scope, ?delay, "processing simulated payment");
            tokio::time::sleep(delay).await;

            let receipt = PaymentReceipt {
                reference: format!("sim_{}", Uuid::new_v4()),
            };
            tracing::info!(reference = %receipt.reference, "payment settled");
            receipt
        })
    }
}
