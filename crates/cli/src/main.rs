//! MarketLink CLI - Talk to the MarketLink API from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in as a shop (session is kept in .marketlink/session.json)
//! ml-cli login --role shop -e shop@example.com -p secret
//!
//! # Fetch a resource whose route varies between deployments
//! ml-cli fetch shop-returns
//!
//! # Raw request against the API root
//! ml-cli request GET /users/me
//!
//! # Normalize media references
//! ml-cli media localhost:5000/uploads/a.png demo/image/upload/b.jpg
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` - Manage per-role sessions
//! - `session` - Show which roles are signed in
//! - `request` - Send one request through the request core
//! - `fetch` - Resolve a catalogued resource
//! - `return` - Create returns and update their status
//! - `media` - Normalize media URLs
//! - `urls` - Show the resolved backend and API roots
//!
//! # Environment Variables
//!
//! - `MARKETLINK_SESSION_FILE` - Session file (default: `.marketlink/session.json`)
//! - `SENTRY_DSN` - Sentry DSN (optional)
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (optional)
//! - Backend URL variables are documented in `marketlink_client::config`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use marketlink_core::Role;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "ml-cli")]
#[command(author, version, about = "MarketLink API tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session for a role
    Login {
        /// Role to log in as (user, shop, admin)
        #[arg(short, long, default_value = "user")]
        role: Role,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register an account and store its session
    Register {
        /// Role to register as (user, shop, admin)
        #[arg(short, long, default_value = "user")]
        role: Role,

        /// Registration payload as JSON
        #[arg(long)]
        json: String,
    },
    /// Drop stored sessions
    Logout {
        /// Only this role
        #[arg(short, long, conflicts_with = "all")]
        role: Option<Role>,

        /// Every role
        #[arg(long)]
        all: bool,
    },
    /// Show stored sessions (tokens are never printed)
    Session,
    /// Send one request
    Request {
        /// HTTP method
        method: String,

        /// Path (relative to the API root) or absolute URL
        path: String,

        /// JSON body
        #[arg(long)]
        json: Option<String>,

        /// Extra header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Authenticate as this role instead of the active one
        #[arg(short, long)]
        role: Option<Role>,

        /// Send without a bearer token
        #[arg(long)]
        no_auth: bool,

        /// Clear every role's session if the token is rejected
        #[arg(long)]
        clear_all: bool,
    },
    /// Fetch a catalogued resource
    Fetch {
        #[command(subcommand)]
        resource: commands::api::Resource,
    },
    /// Manage returns
    Return {
        #[command(subcommand)]
        action: commands::api::ReturnAction,
    },
    /// Normalize media URLs
    Media {
        /// URLs or paths to normalize
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Show the resolved backend and API roots
    Urls,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|v| !v.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry SENTRY_DSN as well as the backend URL
    dotenvy::dotenv().ok();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketlink_client=info,marketlink_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    // Returning keeps the Sentry guard alive until it flushes on drop.
    exit_code(&run(cli).await)
}

fn exit_code(result: &Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::load()?;

    match cli.command {
        Commands::Login {
            role,
            email,
            password,
        } => commands::session::login(&ctx, role, email, password.into()).await?,
        Commands::Register { role, json } => commands::session::register(&ctx, role, &json).await?,
        Commands::Logout { role, all } => commands::session::logout(&ctx, role, all)?,
        Commands::Session => commands::session::show(&ctx)?,
        Commands::Request {
            method,
            path,
            json,
            headers,
            role,
            no_auth,
            clear_all,
        } => {
            let options = commands::api::RequestOptions {
                json,
                headers,
                role,
                no_auth,
                clear_all,
            };
            commands::api::request(&ctx, &method, &path, options).await?;
        }
        Commands::Fetch { resource } => commands::api::fetch(&ctx, resource).await?,
        Commands::Return { action } => commands::api::returns(&ctx, action).await?,
        Commands::Urls => commands::print_json(&serde_json::json!({
            "backend_root": ctx.config.urls.backend_root(),
            "api_root": ctx.config.urls.api_root(),
            "cdn_root": ctx.config.cdn_url,
            "session_file": ctx.session_file.display().to_string(),
        }))?,
        Commands::Media { inputs } => commands::media::normalize(&ctx, &inputs),
    }
    Ok(())
}
