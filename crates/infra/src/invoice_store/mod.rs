//! Tenant-scoped invoice storage.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;

use tradebook_core::{InvoiceId, TenantId};
use tradebook_invoicing::Invoice;

use crate::store::StoreError;

pub use in_memory::InMemoryInvoiceStore;
pub use postgres::PostgresInvoiceStore;

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a freshly issued invoice. Fails on id collision.
    async fn insert(&self, invoice: Invoice) -> Result<(), StoreError>;

    /// Replace an existing invoice row (payment registered, voided).
    /// `NotFound` when absent.
    async fn update(&self, invoice: Invoice) -> Result<(), StoreError>;

    async fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, StoreError>;
}
