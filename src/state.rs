use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{
    jwt::JwtKeys,
    password,
    repo::{PgUserStore, UserStore},
    services::CredentialStore,
};
use crate::config::AppConfig;
use crate::transactions::repo::{PgTransactionStore, TransactionStore};

/// Shared, read-only application state. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub credentials: CredentialStore,
    pub transactions: Arc<dyn TransactionStore>,
}

impl AppState {
    /// Connects the pool and wires the Postgres-backed stores.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        tokio::task::spawn_blocking(password::prepare_decoy)
            .await
            .context("prepare decoy password hash")?;

        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let transactions =
            Arc::new(PgTransactionStore::new(db.clone())) as Arc<dyn TransactionStore>;
        Ok((Self::from_parts(Arc::new(config), users, transactions), db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            keys: JwtKeys::new(&config.jwt),
            credentials: CredentialStore::new(users),
            transactions,
            config,
        }
    }
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TransactionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.transactions.clone()
    }
}
