mod common;

use anyhow::Result;
use common::{grant_admin, identity, test_service};
use smmpanel::application::AppError;

#[tokio::test]
async fn test_initialize_seeds_default_catalog() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let admin = grant_admin(&service, "admin").await?;

    service.initialize(&admin).await?;

    let categories = service.get_categories().await?;
    assert!(!categories.is_empty());

    // Categories come back in creation (id) order
    let ids: Vec<_> = categories.iter().map(|c| c.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    // Every category has at least one service, services in id order
    for category in &categories {
        let services = service.get_services_by_category(category.id).await?;
        assert!(!services.is_empty(), "category {} has no services", category.name);
        for svc in &services {
            assert_eq!(svc.category_id, category.id);
            assert!(svc.price_per_unit_cents > 0);
            assert!(svc.min_quantity <= svc.max_quantity);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_initialize_is_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let admin = grant_admin(&service, "admin").await?;

    service.initialize(&admin).await?;
    let categories_once = service.get_categories().await?;
    let services_once = service
        .get_services_by_category(categories_once[0].id)
        .await?;

    service.initialize(&admin).await?;
    let categories_twice = service.get_categories().await?;
    let services_twice = service
        .get_services_by_category(categories_twice[0].id)
        .await?;

    assert_eq!(categories_once.len(), categories_twice.len());
    assert_eq!(services_once.len(), services_twice.len());
    Ok(())
}

#[tokio::test]
async fn test_initialize_requires_admin() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = identity("plain-user");
    service.create_account(&user).await?;

    let err = service.initialize(&user).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    // Nothing was seeded
    assert!(service.get_categories().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_category_yields_empty_services() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let admin = grant_admin(&service, "admin").await?;
    service.initialize(&admin).await?;

    let services = service.get_services_by_category(9999).await?;
    assert!(services.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_get_category_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_category(42).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}
