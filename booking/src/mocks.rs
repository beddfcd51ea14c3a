//! Test doubles for the booking seams.
//!
//! Shared by unit tests, integration tests, and benches, so they live in the
//! crate proper rather than under `#[cfg(test)]`.

use crate::payment::{PaymentGateway, PaymentReceipt};
use crate::storage::{KeyValueBackend, StorageError};
use crate::types::PaymentScope;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Gateway that settles immediately
///
/// Keeps payment tests free of timer plumbing when the delay itself is not
/// under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantGateway;

impl PaymentGateway for InstantGateway {
    fn confirm(&self, scope: PaymentScope) -> Pin<Box<dyn Future<Output = PaymentReceipt> + Send>> {
        Box::pin(async move {
            tracing::debug!(?scope, "instant payment settled");
            PaymentReceipt {
                reference: format!("instant_{}", Uuid::new_v4()),
            }
        })
    }
}

/// Backend where every operation fails
///
/// Exercises the degraded path: the cart must keep working memory-only when
/// persistence is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingBackend;

impl KeyValueBackend for FailingBackend {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("backend offline".to_string()))
    }

    fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("backend offline".to_string()))
    }
}
