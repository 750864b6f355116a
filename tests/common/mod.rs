// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use smmpanel::application::PanelService;
use smmpanel::domain::Identity;
use smmpanel::Repository;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(PanelService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = PanelService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Ids of the fixture catalog installed by `test_service_with_catalog`
pub struct TestCatalog {
    pub category_id: i64,
    /// 2.00 per unit, quantity 1-100
    pub basic_service_id: i64,
    /// 0.50 per unit, quantity 10-20
    pub narrow_service_id: i64,
}

/// Helper to create a test service plus a small deterministic catalog
pub async fn test_service_with_catalog() -> Result<(PanelService, TestCatalog, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let path = db_path.to_str().unwrap();

    let service = PanelService::init(path).await?;

    // Fixture rows go in through a second repository handle on the same file
    let repo = Repository::connect(&format!("sqlite:{}", path)).await?;
    let category_id = repo
        .insert_category("Instagram", "Instagram growth services")
        .await?;
    let basic_service_id = repo
        .insert_service(category_id, "Basic Likes", "Likes on a post", 200, 1, 100)
        .await?;
    let narrow_service_id = repo
        .insert_service(category_id, "Story Views", "Views on a story", 50, 10, 20)
        .await?;

    Ok((
        service,
        TestCatalog {
            category_id,
            basic_service_id,
            narrow_service_id,
        },
        temp_dir,
    ))
}

/// A caller identity for tests
pub fn identity(principal: &str) -> Identity {
    Identity::new(principal)
}

/// Helper to create an admin identity on a fresh service
pub async fn grant_admin(service: &PanelService, principal: &str) -> Result<Identity> {
    let admin = Identity::new(principal);
    service.bootstrap_admin(&admin).await?;
    Ok(admin)
}
