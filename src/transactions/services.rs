use rust_decimal::Decimal;

use crate::{
    error::AppError,
    transactions::{
        dto::{ListFilter, Summary},
        repo_types::{Transaction, TransactionType},
    },
    validation::parse_transaction_type,
};

/// A validated [`ListFilter`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Filter {
    pub kind: Option<TransactionType>,
    /// Lowercased search term.
    pub search: Option<String>,
}

impl TryFrom<&ListFilter> for Filter {
    type Error = AppError;

    fn try_from(q: &ListFilter) -> Result<Self, Self::Error> {
        let kind = q
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty() && k.trim() != "all")
            .map(parse_transaction_type)
            .transpose()?;
        let search = q
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Ok(Self { kind, search })
    }
}

impl Filter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                tx.description.to_lowercase().contains(term)
                    || tx.category.to_lowercase().contains(term)
            }
            None => true,
        }
    }

    /// Keeps the order of `txs`.
    pub fn apply(&self, txs: Vec<Transaction>) -> Vec<Transaction> {
        txs.into_iter().filter(|t| self.matches(t)).collect()
    }
}

pub fn summarize(txs: &[Transaction]) -> Summary {
    let (total_income, total_expense) =
        txs.iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.kind {
                TransactionType::Income => (inc + t.amount, exp),
                TransactionType::Expense => (inc, exp + t.amount),
            });
    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        count: txs.len(),
    }
}
