use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type CategoryId = i64;
pub type ServiceId = i64;

/// A group of related services (e.g. "Instagram", "YouTube").
/// Immutable once created; the catalog is admin-populated via the seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An orderable SMM service. Price is per unit; quantity is bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmmService {
    pub id: ServiceId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    /// Price for a single unit, in cents. Always positive.
    pub price_per_unit_cents: Cents,
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl SmmService {
    pub fn quantity_in_bounds(&self, quantity: i64) -> bool {
        quantity >= self.min_quantity && quantity <= self.max_quantity
    }

    /// Total cost for a quantity. Frozen into the order at placement time.
    pub fn cost_cents(&self, quantity: i64) -> Cents {
        self.price_per_unit_cents * quantity
    }
}

/// A category row for the seed catalog, before ids and timestamps exist.
pub struct CategorySeed {
    pub name: &'static str,
    pub description: &'static str,
}

/// A service row for the seed catalog. `category` is an index into the
/// category seed list, resolved to a real id at insert time.
pub struct ServiceSeed {
    pub category: usize,
    pub name: &'static str,
    pub description: &'static str,
    pub price_per_unit_cents: Cents,
    pub min_quantity: i64,
    pub max_quantity: i64,
}

/// The default catalog installed by the admin seed operation.
pub fn default_catalog() -> (Vec<CategorySeed>, Vec<ServiceSeed>) {
    let categories = vec![
        CategorySeed {
            name: "Instagram",
            description: "Followers, likes and views for Instagram profiles",
        },
        CategorySeed {
            name: "YouTube",
            description: "Views, subscribers and watch time for YouTube channels",
        },
        CategorySeed {
            name: "TikTok",
            description: "Followers, likes and views for TikTok accounts",
        },
        CategorySeed {
            name: "X (Twitter)",
            description: "Followers and reposts for X accounts",
        },
    ];

    let services = vec![
        ServiceSeed {
            category: 0,
            name: "Instagram Followers",
            description: "High-quality followers, gradual delivery",
            price_per_unit_cents: 3,
            min_quantity: 100,
            max_quantity: 50_000,
        },
        ServiceSeed {
            category: 0,
            name: "Instagram Likes",
            description: "Likes on a single post",
            price_per_unit_cents: 1,
            min_quantity: 50,
            max_quantity: 20_000,
        },
        ServiceSeed {
            category: 1,
            name: "YouTube Views",
            description: "Worldwide views, retention optimized",
            price_per_unit_cents: 2,
            min_quantity: 500,
            max_quantity: 100_000,
        },
        ServiceSeed {
            category: 1,
            name: "YouTube Subscribers",
            description: "Channel subscribers, slow drip",
            price_per_unit_cents: 15,
            min_quantity: 50,
            max_quantity: 5_000,
        },
        ServiceSeed {
            category: 2,
            name: "TikTok Followers",
            description: "Followers for a TikTok account",
            price_per_unit_cents: 4,
            min_quantity: 100,
            max_quantity: 30_000,
        },
        ServiceSeed {
            category: 2,
            name: "TikTok Views",
            description: "Views on a single video",
            price_per_unit_cents: 1,
            min_quantity: 1_000,
            max_quantity: 500_000,
        },
        ServiceSeed {
            category: 3,
            name: "X Followers",
            description: "Followers for an X account",
            price_per_unit_cents: 5,
            min_quantity: 100,
            max_quantity: 25_000,
        },
    ];

    (categories, services)
}
