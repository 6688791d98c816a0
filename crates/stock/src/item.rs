use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradebook_core::{DomainError, DomainResult, Quantity, StockItemId, TenantId};

/// Validated input for creating a stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockItem {
    pub name: String,
    pub sku: Option<String>,
    pub initial_quantity: Quantity,
}

/// A stock item: one ledger entry whose `quantity_on_hand` is the quantity
/// available for sale.
///
/// Invariant: `quantity_on_hand >= 0` in every committed state. The type
/// upholds this locally via [`Quantity`]; under concurrent writers it is
/// upheld by the storage layer applying [`StockItem::decrement`]'s semantics
/// as a single conditional update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    id: StockItemId,
    tenant_id: TenantId,
    name: String,
    sku: Option<String>,
    quantity_on_hand: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Validate a draft into a stock item owned by `tenant_id`.
    pub fn create(
        tenant_id: TenantId,
        id: StockItemId,
        draft: NewStockItem,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let sku = match draft.sku {
            Some(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Err(DomainError::validation("sku cannot be empty when present"));
                }
                Some(s.to_string())
            }
            None => None,
        };

        Ok(Self {
            id,
            tenant_id,
            name: name.to_string(),
            sku,
            quantity_on_hand: draft.initial_quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate an item from a persisted row.
    ///
    /// Storage-layer use only: the fields are trusted as already validated at
    /// creation time. The `quantity` type still guards the invariant.
    pub fn restore(
        tenant_id: TenantId,
        id: StockItemId,
        name: String,
        sku: Option<String>,
        quantity_on_hand: Quantity,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name,
            sku,
            quantity_on_hand,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> StockItemId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn quantity_on_hand(&self) -> Quantity {
        self.quantity_on_hand
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Check-and-subtract as one step: succeeds only if `requested` does not
    /// exceed the quantity on hand, and mutates nothing otherwise.
    ///
    /// Returns the post-decrement quantity on success.
    pub fn decrement(&mut self, requested: Quantity, now: DateTime<Utc>) -> Option<Quantity> {
        let rest = self.quantity_on_hand.checked_sub(requested)?;
        self.quantity_on_hand = rest;
        self.updated_at = now;
        Some(rest)
    }

    /// Additive restock. Cannot violate the non-negative invariant.
    pub fn refill(&mut self, added: Quantity, now: DateTime<Utc>) -> DomainResult<Quantity> {
        let total = self.quantity_on_hand.checked_add(added)?;
        self.quantity_on_hand = total;
        self.updated_at = now;
        Ok(total)
    }
}
