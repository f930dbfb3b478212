use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /transactions` and `PUT /transactions/{id}`.
///
/// `amount` is kept as raw JSON so both `50.5` and `"50.50"` are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Query string of `GET /transactions`.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
