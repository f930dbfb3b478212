use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_decoy, verify_password},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::AppError,
};

/// Stores user identities with salted password hashes.
///
/// Hashing and verification are CPU heavy, so they run on the blocking pool.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Fails with [`AppError::Conflict`] if the email is already registered.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        raw_password: &str,
    ) -> Result<User, AppError> {
        if self.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }

        let plain = raw_password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("join hash_password")??;

        // The UNIQUE constraint still catches a concurrent signup with the same email.
        let user = self
            .users
            .create(NewUser {
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash,
            })
            .await?;
        debug!(user_id = %user.id, "user stored");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_email(email).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn verify_password(&self, user: &User, raw_password: &str) -> Result<bool, AppError> {
        let plain = raw_password.to_owned();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .context("join verify_password")??;
        Ok(ok)
    }

    /// Costs the same as [`Self::verify_password`] for a login whose email is unknown.
    pub async fn verify_unknown(&self, raw_password: &str) -> Result<bool, AppError> {
        let plain = raw_password.to_owned();
        let ok = tokio::task::spawn_blocking(move || verify_decoy(&plain))
            .await
            .context("join verify_decoy")?;
        Ok(ok)
    }
}
