use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tradebook_core::{CustomerId, TenantId};
use tradebook_parties::Customer;

use super::CustomerStore;
use crate::store::StoreError;

/// In-memory customer store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    rows: RwLock<HashMap<(TenantId, CustomerId), Customer>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn insert(&self, customer: Customer) -> Result<(), StoreError> {
        let key = (customer.tenant_id(), customer.id());
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        if rows.contains_key(&key) {
            return Err(StoreError::Conflict("customer already exists".to_string()));
        }
        rows.insert(key, customer);
        Ok(())
    }

    async fn update(&self, customer: Customer) -> Result<(), StoreError> {
        let key = (customer.tenant_id(), customer.id());
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        if !rows.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        rows.insert(key, customer);
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        Ok(rows.get(&(tenant_id, id)).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        let mut customers: Vec<_> = rows
            .iter()
            .filter_map(|((t, _), v)| (*t == tenant_id).then(|| v.clone()))
            .collect();
        customers.sort_by_key(|c| *c.id().as_uuid());
        Ok(customers)
    }

    async fn remove(&self, tenant_id: TenantId, id: CustomerId) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        rows.remove(&(tenant_id, id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
