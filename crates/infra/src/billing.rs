//! Billing orchestration: invoice creation and the per-line stock decrements.
//!
//! The ledger guarantees per-item atomicity only; this service owns the
//! cross-item unit of work. Creating an invoice attempts the decrement for
//! **every** line (so the caller learns about all shortages at once) and,
//! when any line cannot be fulfilled, refills the lines that had already been
//! decremented before reporting failure. A failed issue therefore never
//! leaves a half-saved invoice or leaked stock.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use tradebook_core::{DomainError, InvoiceId, Quantity, StockItemId, TenantId};
use tradebook_invoicing::{Invoice, InvoiceDocument, InvoiceDraft, InvoiceKind};
use tradebook_reporting::{ReportPeriod, SalesSummary, summarize};

use crate::customer_store::CustomerStore;
use crate::invoice_store::InvoiceStore;
use crate::stock_ledger::{LedgerError, StockLedger};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// One or more line items could not be fulfilled. The invoice was not
    /// persisted; decrements already applied to other lines were refilled.
    #[error("not enough stock for {} line item(s)", failed_items.len())]
    InsufficientStock {
        failed_items: Vec<StockItemId>,
        /// Lines whose compensating refill itself failed (storage fault
        /// mid-compensation). Logged for operator reconciliation.
        unrestored_items: Vec<StockItemId>,
    },

    #[error("customer not found")]
    UnknownCustomer,

    #[error("storage unavailable: {0}")]
    Transient(String),
}

impl From<StoreError> for BillingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => BillingError::Domain(DomainError::NotFound),
            StoreError::Conflict(msg) => BillingError::Domain(DomainError::conflict(msg)),
            StoreError::Corrupt(msg) | StoreError::Transient(msg) => BillingError::Transient(msg),
        }
    }
}

/// Invoice workflow over the ledger and the row stores.
pub struct BillingService {
    ledger: Arc<dyn StockLedger>,
    invoices: Arc<dyn InvoiceStore>,
    customers: Arc<dyn CustomerStore>,
}

impl BillingService {
    pub fn new(
        ledger: Arc<dyn StockLedger>,
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
    ) -> Self {
        Self {
            ledger,
            invoices,
            customers,
        }
    }

    /// Issue an invoice or quotation.
    ///
    /// Invoices decrement stock once per line before being persisted;
    /// quotations are persisted directly and never touch the ledger.
    pub async fn issue_invoice(
        &self,
        tenant_id: TenantId,
        draft: InvoiceDraft,
    ) -> Result<Invoice, BillingError> {
        let invoice = Invoice::issue(tenant_id, InvoiceId::new(), draft, Utc::now())?;

        if self
            .customers
            .get(tenant_id, invoice.customer_id())
            .await?
            .is_none()
        {
            return Err(BillingError::UnknownCustomer);
        }

        if invoice.kind() == InvoiceKind::Quotation {
            self.invoices.insert(invoice.clone()).await?;
            return Ok(invoice);
        }

        // Attempt every line so all shortages surface in one response.
        let mut applied: Vec<(StockItemId, Quantity)> = Vec::new();
        let mut failed: Vec<StockItemId> = Vec::new();
        let mut storage_fault: Option<String> = None;
        for line in invoice.lines() {
            match self
                .ledger
                .reserve_and_decrement(tenant_id, line.item_id, line.quantity)
                .await
            {
                Ok(_) => applied.push((line.item_id, line.quantity)),
                Err(LedgerError::InsufficientStock) => failed.push(line.item_id),
                Err(e) => {
                    // Storage is unhealthy; stop attempting further lines.
                    storage_fault = Some(e.to_string());
                    break;
                }
            }
        }

        if let Some(msg) = storage_fault {
            self.compensate(tenant_id, &applied).await;
            return Err(BillingError::Transient(msg));
        }

        if !failed.is_empty() {
            let unrestored_items = self.compensate(tenant_id, &applied).await;
            return Err(BillingError::InsufficientStock {
                failed_items: failed,
                unrestored_items,
            });
        }

        if let Err(e) = self.invoices.insert(invoice.clone()).await {
            self.compensate(tenant_id, &applied).await;
            return Err(e.into());
        }

        tracing::info!(
            invoice_id = %invoice.id(),
            lines = invoice.lines().len(),
            total = %invoice.total_amount(),
            "invoice issued"
        );
        Ok(invoice)
    }

    /// Refill the decrements applied before an aborted issue.
    ///
    /// Best-effort: a refill that fails is reported back and logged so
    /// operators can reconcile the ledger.
    async fn compensate(
        &self,
        tenant_id: TenantId,
        applied: &[(StockItemId, Quantity)],
    ) -> Vec<StockItemId> {
        let mut unrestored = Vec::new();
        for (item_id, quantity) in applied {
            if let Err(e) = self.ledger.refill(tenant_id, *item_id, *quantity).await {
                tracing::error!(
                    %item_id,
                    %quantity,
                    error = %e,
                    "failed to restore stock after aborted invoice"
                );
                unrestored.push(*item_id);
            }
        }
        unrestored
    }

    /// Register a payment and persist the updated invoice.
    pub async fn register_payment(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self
            .invoices
            .get(tenant_id, invoice_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        invoice.register_payment(amount)?;
        self.invoices.update(invoice.clone()).await?;
        Ok(invoice)
    }

    /// Void an invoice (or withdraw a quotation).
    ///
    /// Voiding does not restock: the goods left the shelf when the invoice
    /// was issued, and returns are a separate stock-management operation.
    pub async fn void_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        reason: Option<String>,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self
            .invoices
            .get(tenant_id, invoice_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        invoice.void(reason)?;
        self.invoices.update(invoice.clone()).await?;
        Ok(invoice)
    }

    /// Compose the render-ready document for an invoice.
    pub async fn invoice_document(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceDocument, BillingError> {
        let invoice = self
            .invoices
            .get(tenant_id, invoice_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let customer = self
            .customers
            .get(tenant_id, invoice.customer_id())
            .await?
            .ok_or(BillingError::UnknownCustomer)?;

        Ok(InvoiceDocument::compose(&invoice, &customer)?)
    }

    /// Sales summary over the tenant's stored invoices.
    pub async fn sales_summary(
        &self,
        tenant_id: TenantId,
        period: ReportPeriod,
    ) -> Result<SalesSummary, BillingError> {
        let invoices = self.invoices.list(tenant_id).await?;
        Ok(summarize(&invoices, period))
    }
}
