use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::store::StoreResult;

/// Handles the creation and retrieval of users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    ///
    /// [`StoreError::DuplicateEmail`]: crate::store::StoreError::DuplicateEmail
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        // Dropping `tx` without commit rolls the insert back.
        let mut tx = self.db.begin().await?;
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;
    use crate::store::StoreError;

    /// Keeps users in a vector; enough for handler tests.
    #[derive(Default)]
    pub struct InMemoryUserStore {
        users: Mutex<Vec<User>>,
    }

    impl InMemoryUserStore {
        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn remove(&self, id: Uuid) {
            self.users.lock().unwrap().retain(|u| u.id != id);
        }
    }

    #[async_trait]
    impl UserStore for InMemoryUserStore {
        async fn create(&self, user: NewUser) -> StoreResult<User> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            let created = User {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(created.clone());
            Ok(created)
        }

        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == id).cloned())
        }
    }
}
