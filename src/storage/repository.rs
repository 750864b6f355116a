use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    CategoryId, CategorySeed, Cents, EntryKind, Identity, LedgerEntry, OrderId, OrderStatus,
    ServiceCategory, ServiceId, ServiceOrder, ServiceSeed, SmmService, UserProfile, UserRole,
};

use super::MIGRATION_001_INITIAL;

/// Result of the atomic debit-and-record step of order placement.
#[derive(Debug)]
pub enum PlaceOrderOutcome {
    Placed(ServiceOrder),
    /// The guarded debit matched no row: the balance does not cover the cost.
    InsufficientBalance { balance: Cents },
}

/// Repository for persisting and querying accounts, the catalog and orders.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    /// WAL mode keeps catalog reads concurrent with order writes; the busy
    /// timeout makes concurrent writers on one identity queue instead of fail.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Create a zero-balance account for an identity. No-op if one exists.
    pub async fn create_account(&self, identity: &Identity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (identity, balance_cents, created_at)
            VALUES (?, 0, ?)
            ON CONFLICT (identity) DO NOTHING
            "#,
        )
        .bind(identity.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create account")?;
        Ok(())
    }

    /// Get the balance for an identity. An identity with no account has
    /// balance 0 - never an error.
    pub async fn get_balance(&self, identity: &Identity) -> Result<Cents> {
        let row = sqlx::query("SELECT balance_cents FROM accounts WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch balance")?;

        Ok(row.map(|r| r.get("balance_cents")).unwrap_or(0))
    }

    /// Credit an account and record the deposit entry in one transaction.
    /// Creates the account implicitly on first deposit.
    pub async fn deposit(&self, entry: &LedgerEntry) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin deposit")?;

        sqlx::query(
            r#"
            INSERT INTO accounts (identity, balance_cents, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (identity)
            DO UPDATE SET balance_cents = balance_cents + excluded.balance_cents
            "#,
        )
        .bind(entry.identity.as_str())
        .bind(entry.amount_cents)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to credit account")?;

        Self::insert_entry(&mut tx, entry).await?;

        tx.commit().await.context("Failed to commit deposit")?;
        Ok(())
    }

    /// List the ledger entries for an identity, in recorded order.
    pub async fn list_entries_for_identity(&self, identity: &Identity) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, identity, kind, amount_cents, order_id, recorded_at
            FROM ledger_entries
            WHERE identity = ?
            ORDER BY rowid
            "#,
        )
        .bind(identity.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ledger entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn insert_entry(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        entry: &LedgerEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, identity, kind, amount_cents, order_id, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.identity.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.amount_cents)
        .bind(entry.order_id)
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to record ledger entry")?;
        Ok(())
    }

    // ========================
    // Profile operations
    // ========================

    /// Save (create or update) the profile for an identity.
    pub async fn upsert_profile(&self, identity: &Identity, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (identity, name, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (identity)
            DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at
            "#,
        )
        .bind(identity.as_str())
        .bind(&profile.name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save profile")?;
        Ok(())
    }

    /// Get the profile for an identity, if one was ever saved.
    pub async fn get_profile(&self, identity: &Identity) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT name FROM profiles WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch profile")?;

        Ok(row.map(|r| UserProfile { name: r.get("name") }))
    }

    // ========================
    // Role operations
    // ========================

    /// Get the explicitly assigned role for an identity, if any.
    /// Defaulting for unassigned identities is policy and lives in the
    /// application layer.
    pub async fn get_role(&self, identity: &Identity) -> Result<Option<UserRole>> {
        let row = sqlx::query("SELECT role FROM roles WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch role")?;

        match row {
            Some(row) => {
                let role_str: String = row.get("role");
                let role = UserRole::from_str(&role_str)
                    .ok_or_else(|| anyhow::anyhow!("Invalid role: {}", role_str))?;
                Ok(Some(role))
            }
            None => Ok(None),
        }
    }

    /// Assign a role to an identity (insert or replace).
    pub async fn set_role(&self, identity: &Identity, role: UserRole) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (identity, role, assigned_at)
            VALUES (?, ?, ?)
            ON CONFLICT (identity)
            DO UPDATE SET role = excluded.role, assigned_at = excluded.assigned_at
            "#,
        )
        .bind(identity.as_str())
        .bind(role.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to assign role")?;
        Ok(())
    }

    /// Count identities holding the admin role.
    pub async fn count_admins(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM roles WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count admins")?;
        Ok(row.get("count"))
    }

    /// An identity is registered once it has an account or a profile.
    pub async fn identity_is_registered(&self, identity: &Identity) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (SELECT 1 FROM accounts WHERE identity = ?1)
                OR EXISTS (SELECT 1 FROM profiles WHERE identity = ?1) as registered
            "#,
        )
        .bind(identity.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to check registration")?;

        Ok(row.get::<i64, _>("registered") != 0)
    }

    // ========================
    // Catalog operations
    // ========================

    /// Seed the default catalog if and only if the store is empty.
    /// Returns true if rows were inserted, false if the catalog already
    /// existed (the idempotent no-op path).
    pub async fn seed_catalog(
        &self,
        categories: &[CategorySeed],
        services: &[ServiceSeed],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin seed")?;

        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM categories")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count categories")?
            .get("count");

        if count > 0 {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        let mut category_ids = Vec::with_capacity(categories.len());

        for seed in categories {
            let row = sqlx::query(
                r#"
                INSERT INTO categories (name, description, created_at)
                VALUES (?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(seed.name)
            .bind(seed.description)
            .bind(&now)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert category")?;
            category_ids.push(row.get::<i64, _>("id"));
        }

        for seed in services {
            sqlx::query(
                r#"
                INSERT INTO services
                    (category_id, name, description, price_per_unit_cents,
                     min_quantity, max_quantity, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(category_ids[seed.category])
            .bind(seed.name)
            .bind(seed.description)
            .bind(seed.price_per_unit_cents)
            .bind(seed.min_quantity)
            .bind(seed.max_quantity)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert service")?;
        }

        tx.commit().await.context("Failed to commit seed")?;
        Ok(true)
    }

    /// Insert a single category; returns its assigned id.
    pub async fn insert_category(&self, name: &str, description: &str) -> Result<CategoryId> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, description, created_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert category")?;
        Ok(row.get("id"))
    }

    /// Insert a single service; returns its assigned id.
    pub async fn insert_service(
        &self,
        category_id: CategoryId,
        name: &str,
        description: &str,
        price_per_unit_cents: Cents,
        min_quantity: i64,
        max_quantity: i64,
    ) -> Result<ServiceId> {
        let row = sqlx::query(
            r#"
            INSERT INTO services
                (category_id, name, description, price_per_unit_cents,
                 min_quantity, max_quantity, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(price_per_unit_cents)
        .bind(min_quantity)
        .bind(max_quantity)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert service")?;
        Ok(row.get("id"))
    }

    /// List all categories in creation (id) order.
    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    /// Get a category by id.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<ServiceCategory>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch category")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    /// List services for a category in id order.
    /// An unknown category yields an empty list, not an error.
    pub async fn list_services_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<SmmService>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, name, description, price_per_unit_cents,
                   min_quantity, max_quantity, created_at
            FROM services
            WHERE category_id = ?
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list services")?;

        rows.iter().map(Self::row_to_service).collect()
    }

    /// Get a service by id.
    pub async fn get_service(&self, id: ServiceId) -> Result<Option<SmmService>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, name, description, price_per_unit_cents,
                   min_quantity, max_quantity, created_at
            FROM services
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch service")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_service(&row)?)),
            None => Ok(None),
        }
    }

    // ========================
    // Order operations
    // ========================

    /// Atomically debit the account and persist the order with its ledger
    /// entry. The debit is a single guarded UPDATE, so the balance check
    /// and the subtraction leave no interleaving window; if it matches no
    /// row the transaction is dropped and nothing was written.
    pub async fn place_order(
        &self,
        identity: &Identity,
        service_id: ServiceId,
        link: &str,
        quantity: i64,
        cost_cents: Cents,
    ) -> Result<PlaceOrderOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin order")?;

        let debited = sqlx::query(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents - ?2
            WHERE identity = ?1 AND balance_cents >= ?2
            "#,
        )
        .bind(identity.as_str())
        .bind(cost_cents)
        .execute(&mut *tx)
        .await
        .context("Failed to debit account")?;

        if debited.rows_affected() == 0 {
            // No row matched: either no account or not enough funds.
            let balance: Cents = sqlx::query(
                "SELECT COALESCE((SELECT balance_cents FROM accounts WHERE identity = ?), 0) as balance",
            )
            .bind(identity.as_str())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read balance")?
            .get("balance");

            return Ok(PlaceOrderOutcome::InsufficientBalance { balance });
        }

        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO orders (identity, service_id, link, quantity, cost_cents, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(identity.as_str())
        .bind(service_id)
        .bind(link)
        .bind(quantity)
        .bind(cost_cents)
        .bind(OrderStatus::Pending.as_str())
        .bind(created_at.to_rfc3339())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert order")?;
        let order_id: OrderId = row.get("id");

        let entry = LedgerEntry::order_debit(identity.clone(), cost_cents, order_id);
        Self::insert_entry(&mut tx, &entry).await?;

        tx.commit().await.context("Failed to commit order")?;

        Ok(PlaceOrderOutcome::Placed(ServiceOrder {
            id: order_id,
            user: identity.clone(),
            service_id,
            link: link.to_string(),
            quantity,
            cost_cents,
            status: OrderStatus::Pending,
            created_at,
        }))
    }

    /// Get an order by id.
    pub async fn get_order(&self, id: OrderId) -> Result<Option<ServiceOrder>> {
        let row = sqlx::query(
            r#"
            SELECT id, identity, service_id, link, quantity, cost_cents, status, created_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(&row)?)),
            None => Ok(None),
        }
    }

    /// List an identity's orders in creation (id) order.
    pub async fn list_orders_for_identity(&self, identity: &Identity) -> Result<Vec<ServiceOrder>> {
        let rows = sqlx::query(
            r#"
            SELECT id, identity, service_id, link, quantity, cost_cents, status, created_at
            FROM orders
            WHERE identity = ?
            ORDER BY id
            "#,
        )
        .bind(identity.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list orders")?;

        rows.iter().map(Self::row_to_order).collect()
    }

    /// Move an order from one status to another. The old status is part of
    /// the WHERE clause, so a concurrent transition loses harmlessly.
    /// Returns true if the row was updated.
    pub async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to update order status")?;

        Ok(result.rows_affected() == 1)
    }

    fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<ServiceOrder> {
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(ServiceOrder {
            id: row.get("id"),
            user: Identity::new(row.get::<String, _>("identity")),
            service_id: row.get("service_id"),
            link: row.get("link"),
            quantity: row.get("quantity"),
            cost_cents: row.get("cost_cents"),
            status: OrderStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid order status: {}", status_str))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<ServiceCategory> {
        let created_at_str: String = row.get("created_at");
        Ok(ServiceCategory {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_service(row: &sqlx::sqlite::SqliteRow) -> Result<SmmService> {
        let created_at_str: String = row.get("created_at");
        Ok(SmmService {
            id: row.get("id"),
            category_id: row.get("category_id"),
            name: row.get("name"),
            description: row.get("description"),
            price_per_unit_cents: row.get("price_per_unit_cents"),
            min_quantity: row.get("min_quantity"),
            max_quantity: row.get("max_quantity"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            identity: Identity::new(row.get::<String, _>("identity")),
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            order_id: row.get("order_id"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
