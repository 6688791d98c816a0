//! Postgres-backed invoice store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE invoices (
//!     tenant_id  UUID        NOT NULL,
//!     invoice_id UUID        NOT NULL,
//!     issued_at  TIMESTAMPTZ NOT NULL,
//!     doc        JSONB       NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (tenant_id, invoice_id)
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use tradebook_core::{InvoiceId, TenantId};
use tradebook_invoicing::Invoice;

use super::InvoiceStore;
use crate::store::StoreError;

pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn invoice_from_row(row: &PgRow) -> Result<Invoice, StoreError> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    serde_json::from_value(doc).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    async fn insert(&self, invoice: Invoice) -> Result<(), StoreError> {
        let doc = serde_json::to_value(&invoice).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (tenant_id, invoice_id, issued_at, doc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(invoice.tenant_id().as_uuid())
        .bind(invoice.id().as_uuid())
        .bind(invoice.issued_at())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict("invoice already exists".to_string())
            }
            _ => StoreError::transient(e),
        })?;

        Ok(())
    }

    async fn update(&self, invoice: Invoice) -> Result<(), StoreError> {
        let doc = serde_json::to_value(&invoice).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET doc = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(invoice.tenant_id().as_uuid())
        .bind(invoice.id().as_uuid())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT doc FROM invoices
            WHERE tenant_id = $1 AND invoice_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM invoices
            WHERE tenant_id = $1
            ORDER BY issued_at DESC, invoice_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        rows.iter().map(invoice_from_row).collect()
    }
}
