use tracing::info;

use crate::domain::{
    default_catalog, CategoryId, Cents, Identity, LedgerEntry, OrderId, OrderStatus,
    ServiceCategory, ServiceId, ServiceOrder, SmmService, UserProfile, UserRole,
};
use crate::storage::{PlaceOrderOutcome, Repository};

use super::AppError;

/// Application service providing the identity-scoped panel operations.
/// This is the single entry point for any client (CLI, RPC layer, tests);
/// it sequences access control, catalog reads and ledger writes.
pub struct PanelService {
    repo: Repository,
}

impl PanelService {
    /// Create a new panel service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account ledger
    // ========================

    /// Create a zero-balance account for the caller. No-op if one exists.
    pub async fn create_account(&self, caller: &Identity) -> Result<(), AppError> {
        self.repo.create_account(caller).await?;
        Ok(())
    }

    /// Credit the caller's balance. Deposits are caller-declared - there is
    /// no payment proof to verify at this boundary - so any positive amount
    /// succeeds unconditionally.
    pub async fn deposit(&self, caller: &Identity, amount_cents: Cents) -> Result<(), AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Deposit amount must be positive".to_string(),
            ));
        }

        let entry = LedgerEntry::deposit(caller.clone(), amount_cents);
        self.repo.deposit(&entry).await?;

        info!(identity = %caller, amount_cents, "deposit credited");
        Ok(())
    }

    /// Get the caller's balance. 0 for an identity with no account.
    pub async fn get_balance(&self, caller: &Identity) -> Result<Cents, AppError> {
        Ok(self.repo.get_balance(caller).await?)
    }

    /// The caller's balance history, in recorded order.
    pub async fn get_ledger_history(&self, caller: &Identity) -> Result<Vec<LedgerEntry>, AppError> {
        Ok(self.repo.list_entries_for_identity(caller).await?)
    }

    // ========================
    // Profiles
    // ========================

    /// Save (create or update) the caller's profile.
    pub async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: UserProfile,
    ) -> Result<(), AppError> {
        self.repo.upsert_profile(caller, &profile).await?;
        Ok(())
    }

    /// Get the caller's profile; None if never saved.
    pub async fn get_caller_user_profile(
        &self,
        caller: &Identity,
    ) -> Result<Option<UserProfile>, AppError> {
        Ok(self.repo.get_profile(caller).await?)
    }

    /// Get any identity's profile; None if never saved.
    pub async fn get_user_profile(
        &self,
        user: &Identity,
    ) -> Result<Option<UserProfile>, AppError> {
        Ok(self.repo.get_profile(user).await?)
    }

    // ========================
    // Access control
    // ========================

    /// Resolve the caller's role. An explicitly assigned role wins;
    /// otherwise a registered identity is a user and an unknown one a guest.
    pub async fn get_caller_user_role(&self, caller: &Identity) -> Result<UserRole, AppError> {
        if let Some(role) = self.repo.get_role(caller).await? {
            return Ok(role);
        }
        if self.repo.identity_is_registered(caller).await? {
            Ok(UserRole::User)
        } else {
            Ok(UserRole::Guest)
        }
    }

    pub async fn is_caller_admin(&self, caller: &Identity) -> Result<bool, AppError> {
        Ok(self.get_caller_user_role(caller).await? == UserRole::Admin)
    }

    /// Assign a role to a target identity. Admin only.
    pub async fn assign_caller_user_role(
        &self,
        caller: &Identity,
        target: &Identity,
        role: UserRole,
    ) -> Result<(), AppError> {
        self.require_admin(caller).await?;
        self.repo.set_role(target, role).await?;

        info!(admin = %caller, target = %target, role = %role, "role assigned");
        Ok(())
    }

    /// Grant the very first admin. Refused once any admin exists; after
    /// that, role changes go through the gated assignment operation.
    pub async fn bootstrap_admin(&self, identity: &Identity) -> Result<(), AppError> {
        if self.repo.count_admins().await? > 0 {
            return Err(AppError::PermissionDenied(
                "an admin already exists; use role assignment".to_string(),
            ));
        }
        self.repo.set_role(identity, UserRole::Admin).await?;

        info!(identity = %identity, "bootstrap admin granted");
        Ok(())
    }

    /// Authorization gate for administrative operations. Reads the role
    /// from storage on every call, so a revoked admin loses access
    /// immediately - no cached authorization.
    async fn require_admin(&self, caller: &Identity) -> Result<(), AppError> {
        if self.is_caller_admin(caller).await? {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "admin role required".to_string(),
            ))
        }
    }

    // ========================
    // Catalog
    // ========================

    /// List all categories in creation order.
    pub async fn get_categories(&self) -> Result<Vec<ServiceCategory>, AppError> {
        Ok(self.repo.list_categories().await?)
    }

    /// Get a category by id.
    pub async fn get_category(&self, id: CategoryId) -> Result<ServiceCategory, AppError> {
        self.repo
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {}", id)))
    }

    /// List services in a category. Empty for an unknown category.
    pub async fn get_services_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<SmmService>, AppError> {
        Ok(self.repo.list_services_by_category(category_id).await?)
    }

    /// Seed the default catalog. Admin only, idempotent: populates the
    /// catalog iff it is empty, otherwise a no-op that duplicates nothing.
    pub async fn initialize(&self, caller: &Identity) -> Result<(), AppError> {
        self.require_admin(caller).await?;

        let (categories, services) = default_catalog();
        let seeded = self.repo.seed_catalog(&categories, &services).await?;

        if seeded {
            info!(admin = %caller, "default catalog seeded");
        }
        Ok(())
    }

    // ========================
    // Orders
    // ========================

    /// Validate and place an order: resolve the service, check quantity
    /// bounds and link, then debit the account and record the order as one
    /// atomic unit. On any failure nothing is written.
    pub async fn place_order(
        &self,
        caller: &Identity,
        service_id: ServiceId,
        link: &str,
        quantity: i64,
    ) -> Result<ServiceOrder, AppError> {
        let service = self
            .repo
            .get_service(service_id)
            .await?
            .ok_or(AppError::ServiceNotFound(service_id))?;

        if !service.quantity_in_bounds(quantity) {
            return Err(AppError::QuantityOutOfRange {
                min: service.min_quantity,
                max: service.max_quantity,
                got: quantity,
            });
        }

        if link.trim().is_empty() {
            return Err(AppError::InvalidLink);
        }

        // Cost is frozen here; later price changes never touch this order.
        let cost_cents = service.cost_cents(quantity);

        match self
            .repo
            .place_order(caller, service_id, link, quantity, cost_cents)
            .await?
        {
            PlaceOrderOutcome::Placed(order) => {
                info!(
                    identity = %caller,
                    order_id = order.id,
                    service_id,
                    quantity,
                    cost_cents,
                    "order placed"
                );
                Ok(order)
            }
            PlaceOrderOutcome::InsufficientBalance { balance } => {
                Err(AppError::InsufficientBalance {
                    balance,
                    required: cost_cents,
                })
            }
        }
    }

    /// The caller's orders in creation order. Read-only.
    pub async fn get_my_orders(&self, caller: &Identity) -> Result<Vec<ServiceOrder>, AppError> {
        Ok(self.repo.list_orders_for_identity(caller).await?)
    }

    /// Get an order by id.
    pub async fn get_order(&self, id: OrderId) -> Result<ServiceOrder, AppError> {
        self.repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", id)))
    }

    /// Mark an order completed. Admin only (fulfillment surface).
    pub async fn complete_order(&self, caller: &Identity, id: OrderId) -> Result<(), AppError> {
        self.transition_order(caller, id, OrderStatus::Completed).await
    }

    /// Mark an order failed. Admin only (fulfillment surface).
    pub async fn fail_order(&self, caller: &Identity, id: OrderId) -> Result<(), AppError> {
        self.transition_order(caller, id, OrderStatus::Failed).await
    }

    async fn transition_order(
        &self,
        caller: &Identity,
        id: OrderId,
        to: OrderStatus,
    ) -> Result<(), AppError> {
        self.require_admin(caller).await?;

        let order = self.get_order(id).await?;
        if !order.status.can_transition_to(to) {
            return Err(AppError::InvalidStatusTransition {
                from: order.status,
                to,
            });
        }

        // The guarded update makes a concurrent double-transition lose.
        let updated = self.repo.update_order_status(id, order.status, to).await?;
        if !updated {
            let current = self.get_order(id).await?;
            return Err(AppError::InvalidStatusTransition {
                from: current.status,
                to,
            });
        }

        info!(admin = %caller, order_id = id, status = %to, "order transitioned");
        Ok(())
    }
}
