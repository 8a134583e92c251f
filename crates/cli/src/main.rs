//! Firmdesk CLI - Database migrations and admin access tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! fd-cli migrate
//!
//! # List authorization records
//! fd-cli admin list
//!
//! # Run the access check for an identity, inserting the missing record
//! fd-cli admin check --identity-id 2b1f... --email ops@example.com --privileged --fix
//!
//! # Change a record's role
//! fd-cli admin set-role --id 4 --role super_admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin list` - List authorization records
//! - `admin check` - Classify an identity against the authorization records
//! - `admin set-role` - Change a record's role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fd-cli")]
#[command(author, version, about = "Firmdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Inspect and repair admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List authorization records
    List,
    /// Run the access check for an identity
    Check {
        /// Identity provider user id
        #[arg(long)]
        identity_id: String,

        /// Email on the provider account
        #[arg(short, long)]
        email: String,

        /// Given name
        #[arg(long)]
        first_name: Option<String>,

        /// Family name
        #[arg(long)]
        last_name: Option<String>,

        /// Treat the identity as carrying the privilege claim
        #[arg(long)]
        privileged: bool,

        /// Insert the missing record when the check reports an inconsistency
        #[arg(long)]
        fix: bool,
    },
    /// Change an authorization record's role
    SetRole {
        /// Admin record id
        #[arg(long)]
        id: i32,

        /// New role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::admin().await?,
        Commands::Admin { action } => match action {
            AdminAction::List => commands::admin::list().await?,
            AdminAction::Check {
                identity_id,
                email,
                first_name,
                last_name,
                privileged,
                fix,
            } => {
                let args = commands::admin::CheckArgs {
                    identity_id,
                    email,
                    first_name,
                    last_name,
                    privileged,
                    fix,
                };
                commands::admin::check(args).await?;
            }
            AdminAction::SetRole { id, role } => {
                commands::admin::set_role(id, &role).await?;
            }
        },
    }
    Ok(())
}
