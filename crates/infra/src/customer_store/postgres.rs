//! Postgres-backed customer store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE customers (
//!     tenant_id   UUID        NOT NULL,
//!     customer_id UUID        NOT NULL,
//!     doc         JSONB       NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (tenant_id, customer_id)
//! );
//! ```
//!
//! The serialized domain object is the source of truth (`doc`); the key
//! columns exist for tenant scoping and lookup.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use tradebook_core::{CustomerId, TenantId};
use tradebook_parties::Customer;

use super::CustomerStore;
use crate::store::StoreError;

pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    serde_json::from_value(doc).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    async fn insert(&self, customer: Customer) -> Result<(), StoreError> {
        let doc = serde_json::to_value(&customer).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO customers (tenant_id, customer_id, doc)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(customer.tenant_id().as_uuid())
        .bind(customer.id().as_uuid())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict("customer already exists".to_string())
            }
            _ => StoreError::transient(e),
        })?;

        Ok(())
    }

    async fn update(&self, customer: Customer) -> Result<(), StoreError> {
        let doc = serde_json::to_value(&customer).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET doc = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND customer_id = $2
            "#,
        )
        .bind(customer.tenant_id().as_uuid())
        .bind(customer.id().as_uuid())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, tenant_id: TenantId, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT doc FROM customers
            WHERE tenant_id = $1 AND customer_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM customers
            WHERE tenant_id = $1
            ORDER BY customer_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        rows.iter().map(customer_from_row).collect()
    }

    async fn remove(&self, tenant_id: TenantId, id: CustomerId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM customers
            WHERE tenant_id = $1 AND customer_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(StoreError::transient)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
