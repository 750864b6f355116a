mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{identity, test_service_with_catalog};
use smmpanel::application::AppError;

/// Concurrent orders on one identity must never over-debit: exactly the
/// orders that fit under the starting balance succeed, the rest fail with
/// InsufficientBalance.
#[tokio::test]
async fn test_concurrent_orders_never_overdraw() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let service = Arc::new(service);
    let alice = identity("alice");

    // Balance covers exactly 5 orders of 1 unit at 2.00 each
    service.deposit(&alice, 1000).await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        let caller = alice.clone();
        let service_id = catalog.basic_service_id;
        handles.push(tokio::spawn(async move {
            service
                .place_order(&caller, service_id, &format!("https://x/{}", i), 1)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientBalance { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(succeeded, 5, "exactly the orders that fit must succeed");
    assert_eq!(insufficient, 3);
    assert_eq!(service.get_balance(&alice).await?, 0);

    let orders = service.get_my_orders(&alice).await?;
    assert_eq!(orders.len(), 5);
    let total_debited: i64 = orders.iter().map(|o| o.cost_cents).sum();
    assert_eq!(total_debited, 1000);

    // Ids are strictly increasing in creation order
    for pair in orders.windows(2) {
        assert!(pair[0].id < pair[1].id);
    }
    Ok(())
}

/// Deposits racing with orders on one identity must serialize: the final
/// balance reflects every applied update.
#[tokio::test]
async fn test_concurrent_deposit_and_order_both_apply() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let service = Arc::new(service);
    let alice = identity("alice");

    service.deposit(&alice, 200).await?;

    let deposit_handle = {
        let service = Arc::clone(&service);
        let caller = alice.clone();
        tokio::spawn(async move { service.deposit(&caller, 300).await })
    };
    let order_handle = {
        let service = Arc::clone(&service);
        let caller = alice.clone();
        let service_id = catalog.basic_service_id;
        tokio::spawn(async move { service.place_order(&caller, service_id, "https://x", 1).await })
    };

    deposit_handle.await??;
    order_handle.await??;

    // 200 + 300 - 200: both the credit and the debit are reflected
    assert_eq!(service.get_balance(&alice).await?, 300);
    Ok(())
}

/// Operations on unrelated identities proceed independently.
#[tokio::test]
async fn test_independent_identities_do_not_interfere() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..4 {
        let service = Arc::clone(&service);
        let service_id = catalog.basic_service_id;
        handles.push(tokio::spawn(async move {
            let caller = identity(&format!("user-{}", i));
            service.deposit(&caller, 1000).await?;
            service
                .place_order(&caller, service_id, "https://x", 2)
                .await?;
            service.get_balance(&caller).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await??, 600);
    }
    Ok(())
}
