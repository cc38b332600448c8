// Publikator - monitoring and survey server
// Entry point, admin commands and HTTP server startup

use anyhow::Context;
use clap::{Parser, Subcommand};
use publikator::app;
use publikator::config::{Settings, KNOWN_PERMISSIONS};
use publikator::routes::create_router;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "publikator")]
#[command(about = "Monitoring and survey server")]
#[command(version)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(short, long, env = "PUBLIKATOR_CONFIG", default_value = "publikator.json")]
    config: PathBuf,

    /// SQLite database path (overrides settings file)
    #[arg(short, long, env = "PUBLIKATOR_DATABASE")]
    database: Option<PathBuf>,

    /// Listen address (overrides settings file)
    #[arg(short, long, env = "PUBLIKATOR_BIND")]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user account
    CreateUser {
        username: String,
        /// Grant every permission
        #[arg(long)]
        superuser: bool,
    },
    /// Grant a permission to an existing user
    Grant {
        username: String,
        permission: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load settings from {:?}", cli.config))?;

    // Apply CLI overrides
    if let Some(database) = cli.database {
        settings.database = database;
    }
    if let Some(bind) = cli.bind {
        settings.bind = bind;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Publikator {}", env!("CARGO_PKG_VERSION"));

    let bind = &settings.bind;
    let state = app::setup(&settings).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let listener = tokio::net::TcpListener::bind(bind.as_str())
                .await
                .with_context(|| format!("Failed to bind {}", bind))?;
            tracing::info!("Listening on http://{}", bind);

            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Server stopped");
        }
        Command::CreateUser {
            username,
            superuser,
        } => {
            let user = state.repo.create_user(&username, superuser).await?;
            println!("Created user {} with id {}", user.username, user.id);
        }
        Command::Grant {
            username,
            permission,
        } => {
            if !KNOWN_PERMISSIONS.contains(&permission.as_str()) {
                anyhow::bail!(
                    "Unknown permission {}; expected one of: {}",
                    permission,
                    KNOWN_PERMISSIONS.join(", ")
                );
            }
            let user = state.repo.get_user_by_username(&username).await?;
            state.repo.grant_permission(user.id, &permission).await?;
            println!("Granted {} to {}", permission, user.username);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
