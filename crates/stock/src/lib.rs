//! Stock domain module.
//!
//! This crate contains business rules for stock items (ledger entries),
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). The *atomicity* of the check-and-decrement under concurrency is
//! the storage layer's responsibility; the rules for what a valid item and a
//! valid mutation look like live here.

pub mod item;

pub use item::{NewStockItem, StockItem};
