use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use rolegate::accounts::{self, NewAccount};
use rolegate::authz::{Action, Gate, IdentityContext, PolicyResource};
use rolegate::deployment;

#[derive(Parser, Debug)]
#[command(author, version, about = "rolegate admin tool", long_about = None)]
struct Cli {
    /// Role registry JSON document; defaults to ROLE_REGISTRY_PATH, then the built-in registry
    #[arg(long, global = true)]
    registry: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every registered role with its capabilities
    Roles,
    /// Validate the role registry against the policy table and, when DATABASE_URL is set, stored account roles
    Validate,
    /// Evaluate a single access decision
    Check {
        #[arg(long)]
        action: Action,
        #[arg(long = "type")]
        resource_type: String,
        /// Role of the acting principal; omit for a principal without a role
        #[arg(long, conflicts_with = "anonymous")]
        role: Option<String>,
        /// Evaluate for an unauthenticated caller
        #[arg(long)]
        anonymous: bool,
        /// The target is owned by the acting principal
        #[arg(long)]
        owner_self: bool,
        /// The target is the acting principal itself
        #[arg(long)]
        self_target: bool,
    },
    /// Create an account with an explicit role (e.g. the first Admin)
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// Apply pending migrations
    MigrateRun,
}

/// Stand-in target for `check`: `id` resolves to the target itself, any other field to `owner`.
struct Target {
    id: Uuid,
    owner: Option<Uuid>,
}

impl PolicyResource for Target {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, field: &str) -> Option<Option<Uuid>> {
        match field {
            "id" => Some(Some(self.id)),
            _ => Some(self.owner),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD, then fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();
    let registry_path = cli
        .registry
        .or_else(|| std::env::var("ROLE_REGISTRY_PATH").ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from));

    match cli.command {
        Commands::Roles => {
            let gate = load_gate(registry_path.as_deref())?;
            println!("{:<12} {:<40} {}", "Role", "Capabilities", "Description");
            for role in gate.registry().roles() {
                let capabilities = role
                    .capabilities
                    .iter()
                    .map(|capability| capability.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{:<12} {:<40} {}",
                    role.name,
                    capabilities,
                    role.description.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Validate => {
            let gate = load_gate(registry_path.as_deref())?;
            for resource_type in gate.catalog().resource_types() {
                let actions = gate
                    .catalog()
                    .actions_for(resource_type)
                    .iter()
                    .map(|action| action.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{:<16} {}", resource_type, actions);
            }

            if std::env::var("DATABASE_URL").is_ok() {
                let pool = get_pool().await?;
                accounts::verify_stored_roles(&pool, gate.registry())
                    .await
                    .context("stored account roles do not match the registry")?;
                println!("Stored account roles ok");
            } else {
                println!("DATABASE_URL not set; stored account roles not checked");
            }
            println!(
                "Configuration ok: {} roles, {} resource types",
                gate.registry().len(),
                gate.table().iter().count()
            );
        }
        Commands::Check {
            action,
            resource_type,
            role,
            anonymous,
            owner_self,
            self_target,
        } => {
            let gate = load_gate(registry_path.as_deref())?;
            let principal = Uuid::new_v4();

            let identity = if anonymous {
                IdentityContext::anonymous()
            } else {
                IdentityContext::authenticated(principal, role.as_deref(), gate.registry())?
            };

            let stand_in = Target {
                id: if self_target { principal } else { Uuid::new_v4() },
                owner: Some(if owner_self { principal } else { Uuid::new_v4() }),
            };

            // Collection actions have no target.
            let target = match action {
                Action::List | Action::Create => None,
                _ => Some(&stand_in as &dyn PolicyResource),
            };

            let decision = gate.evaluate(&identity, action, target, &resource_type);
            println!("{decision}");
        }
        Commands::CreateUser {
            username,
            email,
            password,
            role,
        } => {
            let gate = load_gate(registry_path.as_deref())?;
            let pool = get_pool().await?;
            get_migrator().await?.run(&pool).await?;

            let account = NewAccount {
                username,
                email,
                password,
            };
            let user = accounts::create_account(&pool, gate.registry(), account, role.as_deref()).await?;
            println!(
                "Created user {} ({}) with role {}",
                user.username,
                user.id,
                user.role.as_deref().unwrap_or("<none>")
            );
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

fn load_gate(registry_path: Option<&Path>) -> anyhow::Result<Gate> {
    let registry = deployment::load_registry(registry_path).context("failed to load role registry")?;
    deployment::gate(registry).context("access configuration is invalid")
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = SqliteConnectOptions::from_str(&database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
