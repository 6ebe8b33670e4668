//! IDENTRA Server — Application entry point.

use tracing_subscriber::EnvFilter;

use identra_auth::{AccountService, AuthConfig, LoginService, PasswordService};
use identra_db::repository::{
    SurrealAuditLogRepository, SurrealPasswordHistoryRepository, SurrealUserRepository,
};
use identra_db::{DbConfig, DbManager};

/// Build the auth configuration from `IDENTRA_*` environment
/// variables, falling back to defaults for anything unset.
fn auth_config_from_env() -> AuthConfig {
    let mut config = AuthConfig::default();
    if let Ok(pem) = std::env::var("IDENTRA_JWT_PRIVATE_KEY_PEM") {
        config.jwt_private_key_pem = pem;
    }
    if let Ok(pem) = std::env::var("IDENTRA_JWT_PUBLIC_KEY_PEM") {
        config.jwt_public_key_pem = pem;
    }
    if let Ok(issuer) = std::env::var("IDENTRA_JWT_ISSUER") {
        config.jwt_issuer = issuer;
    }
    if let Ok(pepper) = std::env::var("IDENTRA_PASSWORD_PEPPER") {
        config.pepper = Some(pepper);
    }
    config
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("identra=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting IDENTRA server...");

    let db_config = DbConfig::from_env();
    let db = match DbManager::connect(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = identra_db::run_migrations(db.client()).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let auth_config = auth_config_from_env();

    let user_repo = SurrealUserRepository::new(db.client().clone());
    let history_repo = SurrealPasswordHistoryRepository::new(db.client().clone());
    let audit_repo = SurrealAuditLogRepository::new(db.client().clone());

    let _login = LoginService::new(user_repo.clone(), audit_repo.clone(), auth_config.clone());
    let _passwords = PasswordService::new(
        user_repo.clone(),
        history_repo.clone(),
        auth_config.clone(),
    );
    let _accounts = AccountService::new(
        user_repo,
        history_repo,
        audit_repo,
        auth_config.password_history_window,
    );

    tracing::info!("Service layer initialized");

    // TODO: mount the REST API on top of the service layer.

    tracing::info!("IDENTRA server stopped.");
}
