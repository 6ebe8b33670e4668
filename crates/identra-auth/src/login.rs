//! Login — credential verification and access-token issuance.

use tracing::warn;
use uuid::Uuid;

use identra_core::error::{IdentraError, IdentraResult};
use identra_core::models::audit::{AuditOutcome, CreateAuditLogEntry};
use identra_core::models::user::AccountStatus;
use identra_core::repository::{AuditLogRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub ip_address: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user_id: Uuid,
}

/// Authenticates users and issues access tokens.
pub struct LoginService<U: UserRepository, A: AuditLogRepository> {
    user_repo: U,
    audit: A,
    config: AuthConfig,
}

impl<U: UserRepository, A: AuditLogRepository> LoginService<U, A> {
    pub fn new(user_repo: U, audit: A, config: AuthConfig) -> Self {
        Self {
            user_repo,
            audit,
            config,
        }
    }

    /// Authenticate with username + password and issue a token.
    ///
    /// An unknown username, an account without a credential, and a
    /// wrong password all report the same `InvalidCredentials` error.
    pub async fn login(&self, input: LoginInput) -> IdentraResult<LoginOutput> {
        // 1. Look up the user. An unknown username is not audited —
        //    there is no actor id to attribute the attempt to.
        let user = match self.user_repo.get_by_username(&input.username).await {
            Ok(user) => user,
            Err(IdentraError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        // 2. Verify the password.
        let Some(stored_hash) = user.password_hash.as_deref().filter(|h| !h.is_empty()) else {
            self.record_attempt(user.id, &input, AuditOutcome::Failure)
                .await;
            return Err(AuthError::InvalidCredentials.into());
        };

        let valid = password::verify_password(
            &input.password,
            stored_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            self.record_attempt(user.id, &input, AuditOutcome::Failure)
                .await;
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Only active accounts may log in.
        if user.status != AccountStatus::Active {
            self.record_attempt(user.id, &input, AuditOutcome::Denied)
                .await;
            return Err(AuthError::AccountInactive.into());
        }

        // 4. Issue the access token.
        let access_token = token::issue_access_token(user.id, &user.roles, &self.config)?;

        self.record_attempt(user.id, &input, AuditOutcome::Success)
            .await;

        Ok(LoginOutput {
            access_token,
            expires_in: self.config.access_token_lifetime_secs,
            user_id: user.id,
        })
    }

    async fn record_attempt(&self, user_id: Uuid, input: &LoginInput, outcome: AuditOutcome) {
        let entry = CreateAuditLogEntry {
            actor_id: user_id,
            action: "user.login".to_string(),
            target_id: Some(user_id),
            outcome,
            ip_address: input.ip_address.clone(),
            metadata: None,
        };
        if let Err(e) = self.audit.append(entry).await {
            warn!(error = %e, "failed to append login audit entry");
        }
    }
}
