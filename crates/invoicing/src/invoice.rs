use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::{CustomerId, DomainError, DomainResult, InvoiceId, Quantity, StockItemId, TenantId};

/// Whether a document bills stock (invoice) or merely offers it (quotation).
///
/// Quotations never consume stock and accept no payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Invoice,
    Quotation,
}

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Open,
    Paid,
    Void,
}

/// Unvalidated input for one invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDraft {
    pub item_id: StockItemId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Unvalidated input for issuing an invoice or quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: CustomerId,
    pub kind: InvoiceKind,
    pub lines: Vec<LineDraft>,
    pub due_date: DateTime<Utc>,
}

/// One validated line: a stock item reference and a billed quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub item_id: StockItemId,
    pub description: String,
    pub quantity: Quantity,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// An issued invoice or quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    kind: InvoiceKind,
    status: InvoiceStatus,
    lines: Vec<InvoiceLine>,
    issued_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
    total_amount: Decimal,
    total_paid: Decimal,
    void_reason: Option<String>,
}

impl Invoice {
    /// Validate a draft and compute its totals.
    ///
    /// Pure: whether the billed stock is actually available is decided by the
    /// ledger at issue time, not here.
    pub fn issue(
        tenant_id: TenantId,
        id: InvoiceId,
        draft: InvoiceDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.lines.is_empty() {
            return Err(DomainError::validation("cannot issue invoice without lines"));
        }
        if draft.due_date < now {
            return Err(DomainError::validation("due date cannot be in the past"));
        }

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut total = Decimal::ZERO;
        for (idx, line) in draft.lines.into_iter().enumerate() {
            let quantity = Quantity::positive(line.quantity)
                .map_err(|_| DomainError::validation("invoice line quantity must be positive"))?;
            if line.unit_price <= Decimal::ZERO {
                return Err(DomainError::validation("invoice line unit_price must be positive"));
            }

            let line_total = line
                .quantity
                .checked_mul(line.unit_price)
                .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;

            lines.push(InvoiceLine {
                line_no: (idx + 1) as u32,
                item_id: line.item_id,
                description: line.description.trim().to_string(),
                quantity,
                unit_price: line.unit_price,
                line_total,
            });
        }

        Ok(Self {
            id,
            tenant_id,
            customer_id: draft.customer_id,
            kind: draft.kind,
            status: InvoiceStatus::Open,
            lines,
            issued_at: now,
            due_date: draft.due_date,
            total_amount: total,
            total_paid: Decimal::ZERO,
            void_reason: None,
        })
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn total_paid(&self) -> Decimal {
        self.total_paid
    }

    pub fn void_reason(&self) -> Option<&str> {
        self.void_reason.as_deref()
    }

    pub fn outstanding_amount(&self) -> Decimal {
        self.total_amount - self.total_paid
    }

    /// Invariant: void invoices and quotations accept no payment.
    pub fn can_accept_payment(&self) -> bool {
        self.kind == InvoiceKind::Invoice
            && self.status != InvoiceStatus::Void
            && self.outstanding_amount() > Decimal::ZERO
    }

    /// Register a payment against an open invoice.
    pub fn register_payment(&mut self, amount: Decimal) -> DomainResult<()> {
        if self.kind == InvoiceKind::Quotation {
            return Err(DomainError::invariant("quotations cannot accept payments"));
        }
        if !self.can_accept_payment() {
            return Err(DomainError::invariant(
                "cannot register payment on void or fully paid invoice",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("payment amount must be positive"));
        }

        let new_total_paid = self
            .total_paid
            .checked_add(amount)
            .ok_or_else(|| DomainError::invariant("payment total overflow"))?;
        if new_total_paid > self.total_amount {
            return Err(DomainError::invariant("cannot overpay invoice"));
        }

        self.total_paid = new_total_paid;
        if self.total_paid >= self.total_amount {
            self.status = InvoiceStatus::Paid;
        }
        Ok(())
    }

    /// Void the invoice (or withdraw the quotation).
    pub fn void(&mut self, reason: Option<String>) -> DomainResult<()> {
        if self.status == InvoiceStatus::Void {
            return Err(DomainError::conflict("invoice is already void"));
        }
        self.status = InvoiceStatus::Void;
        self.void_reason = reason;
        Ok(())
    }
}
