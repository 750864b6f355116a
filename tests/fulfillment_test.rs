mod common;

use anyhow::Result;
use common::{grant_admin, identity, test_service_with_catalog};
use smmpanel::application::AppError;
use smmpanel::domain::OrderStatus;

#[tokio::test]
async fn test_admin_completes_pending_order() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let admin = grant_admin(&service, "admin").await?;
    let alice = identity("alice");

    service.deposit(&alice, 1000).await?;
    let order = service
        .place_order(&alice, catalog.basic_service_id, "https://x", 1)
        .await?;

    service.complete_order(&admin, order.id).await?;
    assert_eq!(
        service.get_order(order.id).await?.status,
        OrderStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn test_admin_fails_pending_order() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let admin = grant_admin(&service, "admin").await?;
    let alice = identity("alice");

    service.deposit(&alice, 1000).await?;
    let order = service
        .place_order(&alice, catalog.basic_service_id, "https://x", 1)
        .await?;

    service.fail_order(&admin, order.id).await?;
    assert_eq!(
        service.get_order(order.id).await?.status,
        OrderStatus::Failed
    );
    Ok(())
}

#[tokio::test]
async fn test_terminal_orders_do_not_transition() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let admin = grant_admin(&service, "admin").await?;
    let alice = identity("alice");

    service.deposit(&alice, 1000).await?;
    let order = service
        .place_order(&alice, catalog.basic_service_id, "https://x", 1)
        .await?;
    service.complete_order(&admin, order.id).await?;

    // Completed is terminal: neither completing again nor failing works
    let err = service.complete_order(&admin, order.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Completed
        }
    ));

    let err = service.fail_order(&admin, order.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Failed
        }
    ));

    assert_eq!(
        service.get_order(order.id).await?.status,
        OrderStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn test_fulfillment_requires_admin() -> Result<()> {
    let (service, catalog, _temp) = test_service_with_catalog().await?;
    let alice = identity("alice");

    service.deposit(&alice, 1000).await?;
    let order = service
        .place_order(&alice, catalog.basic_service_id, "https://x", 1)
        .await?;

    // Not even the order's owner may drive fulfillment
    let err = service.complete_order(&alice, order.id).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert_eq!(
        service.get_order(order.id).await?.status,
        OrderStatus::Pending
    );
    Ok(())
}

#[tokio::test]
async fn test_transition_unknown_order() -> Result<()> {
    let (service, _catalog, _temp) = test_service_with_catalog().await?;
    let admin = grant_admin(&service, "admin").await?;

    let err = service.complete_order(&admin, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}
