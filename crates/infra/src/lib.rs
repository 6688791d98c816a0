//! Infrastructure layer: storage implementations and the billing orchestration.
//!
//! Every store comes in two flavors behind one trait: an in-memory
//! implementation for dev/tests and a Postgres implementation for
//! production. Both uphold the same contract; the stock ledger's contract —
//! the conditional check-and-decrement — is the safety-critical piece.

pub mod billing;
pub mod customer_store;
pub mod invoice_store;
pub mod stock_ledger;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use billing::{BillingError, BillingService};
pub use customer_store::{CustomerStore, InMemoryCustomerStore, PostgresCustomerStore};
pub use invoice_store::{InMemoryInvoiceStore, InvoiceStore, PostgresInvoiceStore};
pub use stock_ledger::{InMemoryStockLedger, LedgerError, PostgresStockLedger, StockLedger};
pub use store::StoreError;
