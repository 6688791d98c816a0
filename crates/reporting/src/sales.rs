use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradebook_core::{CustomerId, DomainError, DomainResult, StockItemId};
use tradebook_invoicing::{Invoice, InvoiceKind, InvoiceStatus};

/// Half-open reporting window: `from <= issued_at < to`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Self> {
        if to <= from {
            return Err(DomainError::validation("report period must end after it starts"));
        }
        Ok(Self { from, to })
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// Revenue rollup for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRevenue {
    pub customer_id: CustomerId,
    pub invoice_count: u64,
    pub revenue: Decimal,
}

/// Sales rollup for one stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub item_id: StockItemId,
    pub quantity_sold: Decimal,
    pub revenue: Decimal,
}

/// Period summary over billed invoices.
///
/// Quotations and void invoices are excluded: neither represents a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub period: ReportPeriod,
    pub invoice_count: u64,
    pub gross_revenue: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
    pub by_customer: Vec<CustomerRevenue>,
    pub by_item: Vec<ItemSales>,
}

/// Aggregate the invoices issued within `period`.
pub fn summarize(invoices: &[Invoice], period: ReportPeriod) -> SalesSummary {
    let billed = invoices.iter().filter(|inv| {
        inv.kind() == InvoiceKind::Invoice
            && inv.status() != InvoiceStatus::Void
            && period.contains(inv.issued_at())
    });

    let mut invoice_count = 0u64;
    let mut gross_revenue = Decimal::ZERO;
    let mut collected = Decimal::ZERO;
    let mut customers: BTreeMap<uuid::Uuid, CustomerRevenue> = BTreeMap::new();
    let mut items: BTreeMap<uuid::Uuid, ItemSales> = BTreeMap::new();

    for inv in billed {
        invoice_count += 1;
        gross_revenue += inv.total_amount();
        collected += inv.total_paid();

        let entry = customers
            .entry(*inv.customer_id().as_uuid())
            .or_insert_with(|| CustomerRevenue {
                customer_id: inv.customer_id(),
                invoice_count: 0,
                revenue: Decimal::ZERO,
            });
        entry.invoice_count += 1;
        entry.revenue += inv.total_amount();

        for line in inv.lines() {
            let entry = items
                .entry(*line.item_id.as_uuid())
                .or_insert_with(|| ItemSales {
                    item_id: line.item_id,
                    quantity_sold: Decimal::ZERO,
                    revenue: Decimal::ZERO,
                });
            entry.quantity_sold += line.quantity.as_decimal();
            entry.revenue += line.line_total;
        }
    }

    let mut by_customer: Vec<_> = customers.into_values().collect();
    by_customer.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    let mut by_item: Vec<_> = items.into_values().collect();
    by_item.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    SalesSummary {
        period,
        invoice_count,
        gross_revenue,
        collected,
        outstanding: gross_revenue - collected,
        by_customer,
        by_item,
    }
}
