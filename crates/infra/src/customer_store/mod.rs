//! Tenant-scoped customer directory storage.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;

use tradebook_core::{CustomerId, TenantId};
use tradebook_parties::Customer;

use crate::store::StoreError;

pub use in_memory::InMemoryCustomerStore;
pub use postgres::PostgresCustomerStore;

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert a freshly validated customer. Fails on id collision.
    async fn insert(&self, customer: Customer) -> Result<(), StoreError>;

    /// Replace an existing customer row. `NotFound` when absent.
    async fn update(&self, customer: Customer) -> Result<(), StoreError>;

    async fn get(&self, tenant_id: TenantId, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, StoreError>;

    /// Delete a customer row. `NotFound` when absent.
    async fn remove(&self, tenant_id: TenantId, id: CustomerId) -> Result<(), StoreError>;
}
