use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::PanelService;
use crate::domain::{format_cents, parse_cents, Identity, UserRole};

/// Smmpanel - account ledger and order processing for an SMM panel
///
/// The caller identity is supplied per invocation; in production the
/// surrounding trust layer verifies it before it reaches this core.
#[derive(Parser)]
#[command(name = "smmpanel")]
#[command(about = "Account ledger and order-processing core for an SMM panel")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "smmpanel.db")]
    pub database: String,

    /// Caller identity (opaque principal)
    #[arg(short, long, global = true)]
    pub caller: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init {
        /// Identity to grant the first admin role to
        #[arg(long)]
        admin: Option<String>,
    },

    /// Seed the default catalog (admin only, idempotent)
    Seed,

    /// Create a zero-balance account for the caller
    CreateAccount,

    /// Credit the caller's balance
    Deposit {
        /// Amount to credit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Show the caller's balance
    Balance,

    /// Show the caller's balance history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Profile management commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Role management commands
    #[command(subcommand)]
    Role(RoleCommands),

    /// List service categories
    Categories,

    /// List services in a category
    Services {
        /// Category id
        category_id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Order commands
    #[command(subcommand)]
    Order(OrderCommands),
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show a profile (the caller's by default)
    Show {
        /// Identity to look up instead of the caller
        #[arg(long)]
        user: Option<String>,
    },

    /// Save the caller's profile
    Set {
        /// Display name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// Show the caller's role
    Show,

    /// Assign a role to an identity (admin only)
    Assign {
        /// Target identity
        user: String,

        /// Role: admin, user, guest
        role: String,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Place an order for a service
    Place {
        /// Service id
        service_id: i64,

        /// Target link (profile or post URL)
        link: String,

        /// Quantity of units
        quantity: i64,
    },

    /// List the caller's orders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one order
    Show {
        /// Order id
        id: i64,
    },

    /// Mark an order completed (admin only)
    Complete {
        /// Order id
        id: i64,
    },

    /// Mark an order failed (admin only)
    Fail {
        /// Order id
        id: i64,
    },
}

impl Cli {
    fn caller(&self) -> Result<Identity> {
        let principal = self
            .caller
            .as_deref()
            .context("Missing caller identity. Pass --caller <identity>")?;
        Ok(Identity::new(principal))
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init { admin } => {
                let service = PanelService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);

                if let Some(principal) = admin {
                    let identity = Identity::new(principal.as_str());
                    service.bootstrap_admin(&identity).await?;
                    println!("Granted admin role to: {}", identity);
                }
            }

            Commands::Seed => {
                let service = PanelService::connect(&self.database).await?;
                service.initialize(&self.caller()?).await?;

                let categories = service.get_categories().await?;
                println!("Catalog ready: {} categories", categories.len());
            }

            Commands::CreateAccount => {
                let service = PanelService::connect(&self.database).await?;
                let caller = self.caller()?;
                service.create_account(&caller).await?;
                println!("Account ready for: {}", caller);
            }

            Commands::Deposit { amount } => {
                let service = PanelService::connect(&self.database).await?;
                let caller = self.caller()?;
                let amount_cents =
                    parse_cents(amount).context("Invalid amount format. Use '50.00' or '50'")?;

                service.deposit(&caller, amount_cents).await?;

                let balance = service.get_balance(&caller).await?;
                println!(
                    "Deposited {}. New balance: {}",
                    format_cents(amount_cents),
                    format_cents(balance)
                );
            }

            Commands::Balance => {
                let service = PanelService::connect(&self.database).await?;
                let balance = service.get_balance(&self.caller()?).await?;
                println!("Balance: {}", format_cents(balance));
            }

            Commands::History { json } => {
                let service = PanelService::connect(&self.database).await?;
                let entries = service.get_ledger_history(&self.caller()?).await?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else if entries.is_empty() {
                    println!("No balance history.");
                } else {
                    for entry in entries {
                        let order = entry
                            .order_id
                            .map(|id| format!(" (order {})", id))
                            .unwrap_or_default();
                        println!(
                            "{}  {:<11}  {}{}",
                            entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                            entry.kind.to_string(),
                            format_cents(entry.amount_cents),
                            order
                        );
                    }
                }
            }

            Commands::Profile(profile_cmd) => {
                let service = PanelService::connect(&self.database).await?;
                run_profile_command(&service, &self.caller()?, profile_cmd).await?;
            }

            Commands::Role(role_cmd) => {
                let service = PanelService::connect(&self.database).await?;
                run_role_command(&service, &self.caller()?, role_cmd).await?;
            }

            Commands::Categories => {
                let service = PanelService::connect(&self.database).await?;
                let categories = service.get_categories().await?;

                if categories.is_empty() {
                    println!("Catalog is empty. Run 'seed' as an admin.");
                } else {
                    for category in categories {
                        println!("{:>4}  {:<16} {}", category.id, category.name, category.description);
                    }
                }
            }

            Commands::Services { category_id, json } => {
                let service = PanelService::connect(&self.database).await?;
                let category = service.get_category(*category_id).await?;
                let services = service.get_services_by_category(*category_id).await?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&services)?);
                } else {
                    println!("{} - {}", category.name, category.description);
                    for svc in services {
                        println!(
                            "{:>4}  {:<24} {}/unit  qty {}-{}",
                            svc.id,
                            svc.name,
                            format_cents(svc.price_per_unit_cents),
                            svc.min_quantity,
                            svc.max_quantity
                        );
                    }
                }
            }

            Commands::Order(order_cmd) => {
                let service = PanelService::connect(&self.database).await?;
                run_order_command(&service, &self.caller()?, order_cmd).await?;
            }
        }

        Ok(())
    }
}

async fn run_profile_command(
    service: &PanelService,
    caller: &Identity,
    cmd: &ProfileCommands,
) -> Result<()> {
    match cmd {
        ProfileCommands::Show { user } => {
            let (identity, profile) = match user {
                Some(principal) => {
                    let target = Identity::new(principal.as_str());
                    let profile = service.get_user_profile(&target).await?;
                    (target, profile)
                }
                None => (caller.clone(), service.get_caller_user_profile(caller).await?),
            };

            match profile {
                Some(profile) => println!("{}: {}", identity, profile.name),
                None => println!("{}: no profile set", identity),
            }
        }

        ProfileCommands::Set { name } => {
            service
                .save_caller_user_profile(caller, crate::domain::UserProfile::new(name.as_str()))
                .await?;
            println!("Profile saved: {}", name);
        }
    }
    Ok(())
}

async fn run_role_command(
    service: &PanelService,
    caller: &Identity,
    cmd: &RoleCommands,
) -> Result<()> {
    match cmd {
        RoleCommands::Show => {
            let role = service.get_caller_user_role(caller).await?;
            println!("{}: {}", caller, role);
        }

        RoleCommands::Assign { user, role } => {
            let parsed = UserRole::from_str(role).with_context(|| {
                format!("Invalid role '{}'. Valid roles: admin, user, guest", role)
            })?;

            let target = Identity::new(user.as_str());
            service
                .assign_caller_user_role(caller, &target, parsed)
                .await?;
            println!("Assigned {} to {}", parsed, target);
        }
    }
    Ok(())
}

async fn run_order_command(
    service: &PanelService,
    caller: &Identity,
    cmd: &OrderCommands,
) -> Result<()> {
    match cmd {
        OrderCommands::Place {
            service_id,
            link,
            quantity,
        } => {
            let order = service
                .place_order(caller, *service_id, link, *quantity)
                .await?;
            println!(
                "Order {} placed: {} x{} for {} ({})",
                order.id,
                order.link,
                order.quantity,
                format_cents(order.cost_cents),
                order.status
            );
        }

        OrderCommands::List { json } => {
            let orders = service.get_my_orders(caller).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&orders)?);
            } else if orders.is_empty() {
                println!("No orders yet.");
            } else {
                for order in orders {
                    println!(
                        "{:>5}  {:<9}  svc {:<4}  x{:<7}  {}  {}",
                        order.id,
                        order.status.to_string(),
                        order.service_id,
                        order.quantity,
                        format_cents(order.cost_cents),
                        order.link
                    );
                }
            }
        }

        OrderCommands::Show { id } => {
            let order = service.get_order(*id).await?;
            println!("Order {}", order.id);
            println!("  user:     {}", order.user);
            println!("  service:  {}", order.service_id);
            println!("  link:     {}", order.link);
            println!("  quantity: {}", order.quantity);
            println!("  cost:     {}", format_cents(order.cost_cents));
            println!("  status:   {}", order.status);
            println!("  placed:   {}", order.created_at.format("%Y-%m-%d %H:%M:%S"));
        }

        OrderCommands::Complete { id } => {
            service.complete_order(caller, *id).await?;
            println!("Order {} completed", id);
        }

        OrderCommands::Fail { id } => {
            service.fail_order(caller, *id).await?;
            println!("Order {} failed", id);
        }
    }
    Ok(())
}
