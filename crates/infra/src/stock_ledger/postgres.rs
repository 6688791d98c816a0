//! Postgres-backed stock ledger.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE stock_items (
//!     tenant_id        UUID        NOT NULL,
//!     item_id          UUID        NOT NULL,
//!     name             TEXT        NOT NULL,
//!     sku              TEXT,
//!     quantity_on_hand NUMERIC     NOT NULL CHECK (quantity_on_hand >= 0),
//!     created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (tenant_id, item_id)
//! );
//! ```
//!
//! Every query includes `tenant_id` in the WHERE clause or primary key, so
//! cross-tenant access is architecturally impossible.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use tradebook_core::{Quantity, StockItemId, TenantId};
use tradebook_stock::StockItem;

use super::{LedgerError, StockLedger, ensure_positive};

/// Stock ledger backed by a Postgres table.
///
/// The decrement is one conditional `UPDATE` whose predicate re-states the
/// whole precondition; inspecting the affected-row count tells us whether the
/// precondition held *at the moment of application*. Postgres serializes
/// conflicting writes to the row, so no two callers can both observe a
/// passing predicate on stock only one of them can have.
pub struct PostgresStockLedger {
    pool: PgPool,
}

impl PostgresStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn transient(e: sqlx::Error) -> LedgerError {
    LedgerError::Transient(e.to_string())
}

fn item_from_row(row: &PgRow) -> Result<StockItem, LedgerError> {
    let decode = |e: sqlx::Error| LedgerError::Transient(format!("undecodable stock row: {e}"));

    let tenant_id: Uuid = row.try_get("tenant_id").map_err(decode)?;
    let item_id: Uuid = row.try_get("item_id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let sku: Option<String> = row.try_get("sku").map_err(decode)?;
    let quantity: Decimal = row.try_get("quantity_on_hand").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    let quantity = Quantity::new(quantity)
        .map_err(|_| LedgerError::Transient("negative quantity in storage".to_string()))?;

    Ok(StockItem::restore(
        TenantId::from_uuid(tenant_id),
        StockItemId::from_uuid(item_id),
        name,
        sku,
        quantity,
        created_at,
        updated_at,
    ))
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn create_item(&self, item: StockItem) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO stock_items (
                tenant_id,
                item_id,
                name,
                sku,
                quantity_on_hand,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.tenant_id().as_uuid())
        .bind(item.id().as_uuid())
        .bind(item.name())
        .bind(item.sku())
        .bind(item.quantity_on_hand().as_decimal())
        .bind(item.created_at())
        .bind(item.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => LedgerError::AlreadyExists,
            _ => transient(e),
        })?;

        Ok(())
    }

    async fn reserve_and_decrement(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError> {
        ensure_positive(quantity)?;

        // Precondition and mutation in one atomic statement. Zero rows
        // affected means the precondition was false at the moment of the
        // attempt; nothing was mutated.
        let row = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity_on_hand = quantity_on_hand - $3,
                updated_at = NOW()
            WHERE tenant_id = $1
              AND item_id = $2
              AND quantity_on_hand >= $3
            RETURNING quantity_on_hand
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(quantity.as_decimal())
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        let Some(row) = row else {
            return Err(LedgerError::InsufficientStock);
        };

        let rest: Decimal = row
            .try_get("quantity_on_hand")
            .map_err(|e| LedgerError::Transient(format!("undecodable stock row: {e}")))?;
        Quantity::new(rest)
            .map_err(|_| LedgerError::Transient("negative quantity in storage".to_string()))
    }

    async fn refill(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
        quantity: Quantity,
    ) -> Result<Quantity, LedgerError> {
        ensure_positive(quantity)?;

        let row = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity_on_hand = quantity_on_hand + $3,
                updated_at = NOW()
            WHERE tenant_id = $1
              AND item_id = $2
            RETURNING quantity_on_hand
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(quantity.as_decimal())
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        let Some(row) = row else {
            return Err(LedgerError::NotFound);
        };

        let total: Decimal = row
            .try_get("quantity_on_hand")
            .map_err(|e| LedgerError::Transient(format!("undecodable stock row: {e}")))?;
        Quantity::new(total)
            .map_err(|_| LedgerError::Transient("negative quantity in storage".to_string()))
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        item_id: StockItemId,
    ) -> Result<Option<StockItem>, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, item_id, name, sku, quantity_on_hand, created_at, updated_at
            FROM stock_items
            WHERE tenant_id = $1 AND item_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(item_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(transient)?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<StockItem>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, item_id, name, sku, quantity_on_hand, created_at, updated_at
            FROM stock_items
            WHERE tenant_id = $1
            ORDER BY item_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.iter().map(item_from_row).collect()
    }
}
