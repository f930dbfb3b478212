use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::store::StoreError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

/// A transaction as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row shape in the `transactions` table; `type` is stored as text.
#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: Date,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            amount: r.amount,
            category: r.category,
            description: r.description,
            date: r.date,
            kind: r.kind.parse().map_err(StoreError::InvalidRow)?,
            created_at: r.created_at,
        })
    }
}

/// Validated fields for a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: Date,
    pub kind: TransactionType,
}

/// Validated subset of fields to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<Date>,
    pub kind: Option<TransactionType>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.kind.is_none()
    }

    pub fn apply(&self, tx: &mut Transaction) {
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(category) = &self.category {
            tx.category = category.clone();
        }
        if let Some(description) = &self.description {
            tx.description = description.clone();
        }
        if let Some(date) = self.date {
            tx.date = date;
        }
        if let Some(kind) = self.kind {
            tx.kind = kind;
        }
    }
}
