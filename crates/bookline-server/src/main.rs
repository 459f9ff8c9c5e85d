//! Bookline Server — application entry point.
//!
//! Initializes logging, loads configuration from the environment,
//! connects to SurrealDB, runs migrations, and performs the first-run
//! admin bootstrap. HTTP transport and routing are provided by the
//! embedding deployment, not by this binary.

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bookline_auth::config::AuthConfig;
use bookline_auth::service::AuthService;
use bookline_core::error::{BooklineError, BooklineResult};
use bookline_db::repository::SurrealUserRepository;
use bookline_db::{DbConfig, DbManager};

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("bookline=info".parse().unwrap()),
        )
        .json()
        .init();

    info!("Starting Bookline server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(1);
    }

    info!("Bookline server stopped.");
}

async fn run() -> BooklineResult<()> {
    let db_config = DbConfig {
        url: env_or("BOOKLINE_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("BOOKLINE_DB_NAMESPACE", "bookline"),
        database: env_or("BOOKLINE_DB_NAME", "main"),
        username: env_or("BOOKLINE_DB_USER", "root"),
        password: env_or("BOOKLINE_DB_PASS", "root"),
    };

    // The token secret is process-wide configuration, never a source
    // literal.
    let token_secret = env::var("BOOKLINE_TOKEN_SECRET")
        .map_err(|_| BooklineError::Internal("BOOKLINE_TOKEN_SECRET must be set".into()))?;
    let pepper = env::var("BOOKLINE_PASSWORD_PEPPER").ok();
    let auth_config = AuthConfig {
        token_secret,
        pepper: pepper.clone(),
        ..Default::default()
    };

    let manager = DbManager::connect(&db_config).await?;
    bookline_db::run_migrations(manager.client()).await?;

    let user_repo = match pepper {
        Some(p) => SurrealUserRepository::with_pepper(manager.client().clone(), p),
        None => SurrealUserRepository::new(manager.client().clone()),
    };
    let auth = AuthService::new(user_repo, auth_config);

    // First-run bootstrap, only when credentials are supplied.
    match (
        env::var("BOOKLINE_ADMIN_EMAIL"),
        env::var("BOOKLINE_ADMIN_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => {
            let name = env_or("BOOKLINE_ADMIN_NAME", "Administrator");
            match auth.ensure_admin(&name, &email, &password).await? {
                Some(admin) => info!(email = %admin.email, "Bootstrap admin created"),
                None => info!("Admin already present, bootstrap skipped"),
            }
        }
        _ => info!("No bootstrap admin configured"),
    }

    info!("Bookline core initialized");
    Ok(())
}
