//! Render-ready invoice document composition.
//!
//! The PDF renderer is an external collaborator: it receives this structure
//! and owns layout/styling. Composing the document is a pure join of an
//! invoice and its customer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::{DomainError, DomainResult, InvoiceId};
use tradebook_parties::Customer;

use crate::invoice::{Invoice, InvoiceKind, InvoiceStatus};

/// Addressee block for the rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentParty {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub line_no: u32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Everything a renderer needs to produce the PDF for one invoice/quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_id: InvoiceId,
    pub kind: InvoiceKind,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub customer: DocumentParty,
    pub lines: Vec<DocumentLine>,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub amount_due: Decimal,
}

impl InvoiceDocument {
    /// Join an invoice with its customer.
    ///
    /// Fails if the customer is not the invoice's addressee or belongs to a
    /// different tenant.
    pub fn compose(invoice: &Invoice, customer: &Customer) -> DomainResult<Self> {
        if customer.id() != invoice.customer_id() {
            return Err(DomainError::invariant("customer does not match invoice"));
        }
        if customer.tenant_id() != invoice.tenant_id() {
            return Err(DomainError::invariant("customer tenant does not match invoice"));
        }

        Ok(Self {
            invoice_id: invoice.id(),
            kind: invoice.kind(),
            status: invoice.status(),
            issued_at: invoice.issued_at(),
            due_date: invoice.due_date(),
            customer: DocumentParty {
                name: customer.name().to_string(),
                email: customer.contact().email.clone(),
                phone: customer.contact().phone.clone(),
                billing_address: customer.contact().billing_address.clone(),
            },
            lines: invoice
                .lines()
                .iter()
                .map(|l| DocumentLine {
                    line_no: l.line_no,
                    description: l.description.clone(),
                    quantity: l.quantity.as_decimal(),
                    unit_price: l.unit_price,
                    line_total: l.line_total,
                })
                .collect(),
            total_amount: invoice.total_amount(),
            total_paid: invoice.total_paid(),
            amount_due: invoice.outstanding_amount(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceDraft, LineDraft};
    use chrono::Duration;
    use tradebook_core::{CustomerId, StockItemId, TenantId};
    use tradebook_parties::{ContactInfo, CustomerDraft};

    fn test_customer(tenant_id: TenantId) -> Customer {
        Customer::create(
            tenant_id,
            CustomerId::new(),
            CustomerDraft {
                name: "Acme Supplies".to_string(),
                contact: ContactInfo {
                    email: Some("billing@acme.example".to_string()),
                    phone: None,
                    billing_address: Some("1 Main St".to_string()),
                },
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn test_invoice(tenant_id: TenantId, customer_id: CustomerId) -> Invoice {
        Invoice::issue(
            tenant_id,
            InvoiceId::new(),
            InvoiceDraft {
                customer_id,
                kind: InvoiceKind::Invoice,
                lines: vec![LineDraft {
                    item_id: StockItemId::new(),
                    description: "Espresso beans 1kg".to_string(),
                    quantity: Decimal::new(2, 0),
                    unit_price: Decimal::new(1050, 2),
                }],
                due_date: Utc::now() + Duration::days(30),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn compose_joins_invoice_and_customer() {
        let tenant_id = TenantId::new();
        let customer = test_customer(tenant_id);
        let invoice = test_invoice(tenant_id, customer.id());

        let doc = InvoiceDocument::compose(&invoice, &customer).unwrap();
        assert_eq!(doc.invoice_id, invoice.id());
        assert_eq!(doc.customer.name, "Acme Supplies");
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.lines[0].line_total, Decimal::new(2100, 2));
        assert_eq!(doc.amount_due, invoice.total_amount());
    }

    #[test]
    fn compose_rejects_wrong_customer() {
        let tenant_id = TenantId::new();
        let customer = test_customer(tenant_id);
        let invoice = test_invoice(tenant_id, CustomerId::new());

        let err = InvoiceDocument::compose(&invoice, &customer).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn compose_rejects_cross_tenant_customer() {
        let customer = test_customer(TenantId::new());
        let invoice = test_invoice(TenantId::new(), customer.id());

        let err = InvoiceDocument::compose(&invoice, &customer).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }
}
