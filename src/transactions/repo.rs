use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::StoreResult;
use crate::transactions::repo_types::{
    NewTransaction, Transaction, TransactionPatch, TransactionRow,
};

/// Persistence for transactions. Every operation is scoped to the owning user: a row that
/// belongs to someone else behaves exactly like a row that does not exist.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, user_id: Uuid, tx: NewTransaction) -> StoreResult<Transaction>;

    /// All of the user's transactions, newest `date` first, then newest `created_at`.
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Transaction>>;

    /// Applies the supplied fields and returns the updated row, or `None` if not found.
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<Option<Transaction>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgTransactionStore {
    db: PgPool,
}

impl PgTransactionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn create(&self, user_id: Uuid, new: NewTransaction) -> StoreResult<Transaction> {
        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (user_id, amount, category, description, date, type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, amount, category, description, date, type, created_at
            "#,
        )
        .bind(user_id)
        .bind(new.amount)
        .bind(&new.category)
        .bind(&new.description)
        .bind(new.date)
        .bind(new.kind.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        row.try_into()
    }

    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let mut conn = self.db.acquire().await?;
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, category, description, date, type, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, category, description, date, type, created_at
            FROM transactions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<Option<Transaction>> {
        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
               SET amount      = COALESCE($3, amount),
                   category    = COALESCE($4, category),
                   description = COALESCE($5, description),
                   date        = COALESCE($6, date),
                   type        = COALESCE($7, type)
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, amount, category, description, date, type, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.amount)
        .bind(patch.category)
        .bind(patch.description)
        .bind(patch.date)
        .bind(patch.kind.map(|k| k.as_str()))
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        row.map(Transaction::try_from).transpose()
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.db.begin().await?;
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
