use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tradebook_core::{InvoiceId, TenantId};
use tradebook_invoicing::Invoice;

use super::InvoiceStore;
use crate::store::StoreError;

/// In-memory invoice store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    rows: RwLock<HashMap<(TenantId, InvoiceId), Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: Invoice) -> Result<(), StoreError> {
        let key = (invoice.tenant_id(), invoice.id());
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        if rows.contains_key(&key) {
            return Err(StoreError::Conflict("invoice already exists".to_string()));
        }
        rows.insert(key, invoice);
        Ok(())
    }

    async fn update(&self, invoice: Invoice) -> Result<(), StoreError> {
        let key = (invoice.tenant_id(), invoice.id());
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        if !rows.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        rows.insert(key, invoice);
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        Ok(rows.get(&(tenant_id, id)).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Transient("lock poisoned".to_string()))?;
        let mut invoices: Vec<_> = rows
            .iter()
            .filter_map(|((t, _), v)| (*t == tenant_id).then(|| v.clone()))
            .collect();
        invoices.sort_by_key(|i| *i.id().as_uuid());
        Ok(invoices)
    }
}
