use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use tradebook_core::{Quantity, StockItemId, TenantId};
use tradebook_stock::StockItem;

use super::{LedgerError, StockLedger, ensure_positive};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct RowKey {
    tenant_id: TenantId,
    item_id: StockItemId,
}

/// In-memory stock ledger.
///
/// Intended for tests/dev. The check-and-subtract runs inside one write-lock
/// critical section, which gives the same observable atomicity as the
/// Postgres conditional update: no concurrent reader can observe a state
/// where the check passed but the subtraction has not happened.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    rows: RwLock<HashMap<RowKey, StockItem>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn create_item(&self, item: StockItem) -> Result<(), LedgerError> {
        let key = RowKey {
            tenant_id: item.tenant_id(),
            item_id: item.id(),
        };
        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::Transient("lock poisoned".to_string()))?;
        if rows.contains_key(&key) {
            return Err(LedgerError::AlreadyExists);
        }
        rows.insert(key, item);
        Ok(())
    }

    async fn reserve_and_decrement(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError> {
        ensure_positive(quantity)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::Transient("lock poisoned".to_string()))?;

        // The key embeds the tenant, so a wrong-owner lookup is just a miss —
        // the same InsufficientStock the caller would get for a low quantity.
        let Some(item) = rows.get_mut(&RowKey { tenant_id, item_id }) else {
            return Err(LedgerError::InsufficientStock);
        };

        item.decrement(quantity, Utc::now())
            .ok_or(LedgerError::InsufficientStock)
    }

    async fn refill(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError> {
        ensure_positive(quantity)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::Transient("lock poisoned".to_string()))?;

        let Some(item) = rows.get_mut(&RowKey { tenant_id, item_id }) else {
            return Err(LedgerError::NotFound);
        };

        item.refill(quantity, Utc::now())
            .map_err(|e| LedgerError::Invalid(e.to_string()))
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::Transient("lock poisoned".to_string()))?;
        Ok(rows.get(&RowKey { tenant_id, item_id }).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::Transient("lock poisoned".to_string()))?;
        let mut items: Vec<_> = rows
            .iter()
            .filter_map(|(k, v)| (k.tenant_id == tenant_id).then(|| v.clone()))
            .collect();
        items.sort_by_key(|i| *i.id().as_uuid());
        Ok(items)
    }
}
