//! Cross-module tests for the stock ledger contract.
//!
//! These run against the in-memory implementation on a multi-threaded
//! runtime so the decrements genuinely race. The Postgres implementation
//! upholds the same contract through the conditional UPDATE's affected-row
//! semantics.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use tradebook_core::{Quantity, StockItemId, TenantId};
use tradebook_stock::{NewStockItem, StockItem};

use crate::stock_ledger::{InMemoryStockLedger, LedgerError, StockLedger};

fn qty(mantissa: i64, scale: u32) -> Quantity {
    Quantity::new(Decimal::new(mantissa, scale)).unwrap()
}

async fn seed(ledger: &InMemoryStockLedger, tenant_id: TenantId, on_hand: Quantity) -> StockItemId {
    let item = StockItem::create(
        tenant_id,
        StockItemId::new(),
        NewStockItem {
            name: "Espresso beans 1kg".to_string(),
            sku: None,
            initial_quantity: on_hand,
        },
        Utc::now(),
    )
    .unwrap();
    let id = item.id();
    ledger.create_item(item).await.unwrap();
    id
}

async fn on_hand(ledger: &InMemoryStockLedger, tenant_id: TenantId, item_id: StockItemId) -> Quantity {
    ledger
        .get(tenant_id, item_id)
        .await
        .unwrap()
        .unwrap()
        .quantity_on_hand()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn two_concurrent_decrements_of_seven_from_ten_admit_exactly_one() {
    let ledger = Arc::new(InMemoryStockLedger::new());
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(10, 0)).await;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(
                async move { ledger.reserve_and_decrement(tenant_id, item_id, qty(7, 0)).await },
            )
        })
        .collect();

    let mut successes = Vec::new();
    let mut failures = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(rest) => successes.push(rest),
            Err(LedgerError::InsufficientStock) => failures += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, vec![qty(3, 0)]);
    assert_eq!(failures, 1);
    assert_eq!(on_hand(&ledger, tenant_id, item_id).await, qty(3, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn twenty_concurrent_decrements_of_five_drain_a_hundred_to_zero() {
    let ledger = Arc::new(InMemoryStockLedger::new());
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(100, 0)).await;

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(
                async move { ledger.reserve_and_decrement(tenant_id, item_id, qty(5, 0)).await },
            )
        })
        .collect();

    let mut observed = Vec::new();
    for task in tasks {
        let rest = task.await.unwrap().expect("all twenty must succeed");
        assert!(rest.as_decimal() >= Decimal::ZERO);
        observed.push(rest);
    }

    // Each decrement is an instantaneous transition, so the twenty observed
    // post-decrement values must be exactly {95, 90, ..., 0} in some order.
    observed.sort();
    let expected: Vec<_> = (0..20i64).map(|i| qty(i * 5, 0)).collect();
    assert_eq!(observed, expected);
    assert!(on_hand(&ledger, tenant_id, item_id).await.is_zero());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_readers_never_observe_negative_stock() {
    let ledger = Arc::new(InMemoryStockLedger::new());
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(50, 0)).await;

    let writers: Vec<_> = (0..100)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(
                async move { ledger.reserve_and_decrement(tenant_id, item_id, qty(1, 0)).await },
            )
        })
        .collect();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let item = ledger.get(tenant_id, item_id).await.unwrap().unwrap();
                    assert!(item.quantity_on_hand().as_decimal() >= Decimal::ZERO);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let mut successes = 0;
    for task in writers {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    for task in readers {
        task.await.unwrap();
    }

    // 100 attempts against 50 on hand: exactly 50 can win.
    assert_eq!(successes, 50);
    assert!(on_hand(&ledger, tenant_id, item_id).await.is_zero());
}

#[tokio::test]
async fn wrong_tenant_fails_as_insufficient_regardless_of_quantity() {
    let ledger = InMemoryStockLedger::new();
    let owner = TenantId::new();
    let intruder = TenantId::new();
    let item_id = seed(&ledger, owner, qty(1_000, 0)).await;

    let err = ledger
        .reserve_and_decrement(intruder, item_id, qty(1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock));
    assert_eq!(on_hand(&ledger, owner, item_id).await, qty(1_000, 0));
}

#[tokio::test]
async fn failed_decrement_leaves_the_row_untouched() {
    let ledger = InMemoryStockLedger::new();
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(500, 2)).await;

    let before = ledger.get(tenant_id, item_id).await.unwrap().unwrap();
    let err = ledger
        .reserve_and_decrement(tenant_id, item_id, qty(501, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock));

    let after = ledger.get(tenant_id, item_id).await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn exact_boundary_succeeds_and_one_hundredth_more_fails() {
    let ledger = InMemoryStockLedger::new();
    let tenant_id = TenantId::new();

    // Requesting exactly the quantity on hand leaves zero.
    let item_id = seed(&ledger, tenant_id, qty(5, 0)).await;
    let rest = ledger
        .reserve_and_decrement(tenant_id, item_id, qty(5, 0))
        .await
        .unwrap();
    assert!(rest.is_zero());

    // An emptied entry rejects even 0.01.
    let err = ledger
        .reserve_and_decrement(tenant_id, item_id, qty(1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock));

    // One hundredth above the on-hand quantity fails outright.
    let other = seed(&ledger, tenant_id, qty(500, 2)).await;
    let err = ledger
        .reserve_and_decrement(tenant_id, other, qty(501, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock));
    assert_eq!(on_hand(&ledger, tenant_id, other).await, qty(500, 2));
}

#[tokio::test]
async fn zero_and_missing_requests_are_rejected_without_storage_effects() {
    let ledger = InMemoryStockLedger::new();
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(10, 0)).await;

    let err = ledger
        .reserve_and_decrement(tenant_id, item_id, Quantity::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Invalid(_)));

    let err = ledger
        .reserve_and_decrement(tenant_id, StockItemId::new(), qty(1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock));

    assert_eq!(on_hand(&ledger, tenant_id, item_id).await, qty(10, 0));
}

#[tokio::test]
async fn refill_restores_what_a_decrement_took() {
    let ledger = InMemoryStockLedger::new();
    let tenant_id = TenantId::new();
    let item_id = seed(&ledger, tenant_id, qty(10, 0)).await;

    ledger
        .reserve_and_decrement(tenant_id, item_id, qty(4, 0))
        .await
        .unwrap();
    let total = ledger.refill(tenant_id, item_id, qty(4, 0)).await.unwrap();

    assert_eq!(total, qty(10, 0));
    assert!(matches!(
        ledger.refill(tenant_id, StockItemId::new(), qty(1, 0)).await,
        Err(LedgerError::NotFound)
    ));
}
