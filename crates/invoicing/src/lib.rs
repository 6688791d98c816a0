//! Invoicing domain module.
//!
//! This crate contains business rules for invoices and quotations,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Stock decrements are the billing orchestration's concern; an
//! `Invoice` only records what was billed.

pub mod document;
pub mod invoice;

pub use document::{DocumentLine, DocumentParty, InvoiceDocument};
pub use invoice::{Invoice, InvoiceDraft, InvoiceKind, InvoiceLine, InvoiceStatus, LineDraft};
