//! Sales reporting module.
//!
//! Pure aggregation over billed invoices; no IO. The API layer fetches the
//! invoice rows and hands them here.

pub mod sales;

pub use sales::{CustomerRevenue, ItemSales, ReportPeriod, SalesSummary, summarize};
