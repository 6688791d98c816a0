//! The stock ledger: tenant-scoped stock rows and the atomic decrement.
//!
//! `reserve_and_decrement` is the one safety-critical operation in the
//! system. Its precondition check (item exists, belongs to the tenant, has
//! enough stock) happens **atomically with the mutation** — a single
//! conditional update, never a separate read followed by a write. Two
//! concurrent invoice creations against the same low-stock item therefore
//! cannot both pass the check: the storage layer serializes the conflicting
//! writes and exactly one conditional update finds its predicate true.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use tradebook_core::{Quantity, StockItemId, TenantId};
use tradebook_stock::StockItem;

pub use in_memory::InMemoryStockLedger;
pub use postgres::PostgresStockLedger;

/// Stock ledger operation error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The conditional update affected zero rows.
    ///
    /// One kind on purpose: a missing item, an item owned by another tenant,
    /// and a quantity that is too low all mean the same thing to the caller —
    /// this line item cannot be fulfilled. Distinguishing them would leak
    /// other tenants' row existence.
    #[error("insufficient stock")]
    InsufficientStock,

    /// The item addressed by a non-decrement operation does not exist for
    /// this tenant.
    #[error("stock item not found")]
    NotFound,

    /// Creation collided with an existing item id.
    #[error("stock item already exists")]
    AlreadyExists,

    /// The request was malformed (e.g. non-positive quantity). Checked before
    /// any storage round-trip.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The underlying write could not be attempted or completed. Safe to
    /// retry the whole call: no partial state exists on failure.
    #[error("storage unavailable: {0}")]
    Transient(String),
}

/// Tenant-scoped stock storage.
///
/// Implementations must make `reserve_and_decrement` indistinguishable from
/// an instantaneous state transition to every concurrent observer. The ledger
/// never retries internally and guarantees per-item atomicity only; the
/// cross-item unit of work belongs to the billing orchestration.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Insert a freshly validated item. Fails on id collision.
    async fn create_item(&self, item: StockItem) -> Result<(), LedgerError>;

    /// Atomically verify sufficient stock and subtract `quantity`, returning
    /// the post-decrement quantity on hand.
    ///
    /// On failure nothing is mutated and the caller gets
    /// [`LedgerError::InsufficientStock`] (or [`LedgerError::Transient`] when
    /// storage was unreachable).
    async fn reserve_and_decrement(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError>;

    /// Additive restock; returns the new quantity on hand. Increases cannot
    /// violate the non-negative invariant, so a plain update suffices.
    async fn refill(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError>;

    async fn get(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, LedgerError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, LedgerError>;
}

/// Requested decrement/refill quantities must be strictly positive.
pub(crate) fn ensure_positive(quantity: Quantity) -> Result<(), LedgerError> {
    if quantity.is_zero() {
        return Err(LedgerError::Invalid("quantity must be positive".to_string()));
    }
    Ok(())
}
