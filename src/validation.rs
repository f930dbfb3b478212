//! Request validators.
//!
//! Pure functions that turn request bodies into validated values. They run before any
//! store call, so a failure never leaves partial state behind.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::{macros::format_description, Date};

use crate::{
    auth::dto::{LoginRequest, SignupRequest},
    error::AppError,
    transactions::{
        dto::TransactionRequest,
        repo_types::{NewTransaction, TransactionPatch, TransactionType},
    },
};

/// NUMERIC(12,2) holds values strictly below 10^10.
const MAX_AMOUNT: i64 = 10_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A request body that parsed as a JSON object.
pub type JsonObject = Map<String, Value>;

/// Maps a JSON object onto a request type by field name.
///
/// Bodies are extracted as [`JsonObject`] first so an array can never fill fields by position.
pub fn from_object<T: DeserializeOwned>(object: JsonObject) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::invalid(format!("Invalid JSON body: {e}")))
}

/// Returns the value if it is present and not blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

pub fn validate_signup(req: &SignupRequest) -> Result<SignupInput, AppError> {
    let (Some(username), Some(email), Some(password)) = (
        present(&req.username),
        present(&req.email),
        present(&req.password),
    ) else {
        return Err(AppError::invalid("Missing required fields"));
    };

    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::invalid("Invalid email"));
    }

    Ok(SignupInput {
        username: username.trim().to_string(),
        email,
        password: password.to_string(),
    })
}

pub fn validate_login(req: &LoginRequest) -> Result<LoginInput, AppError> {
    let (Some(email), Some(password)) = (present(&req.email), present(&req.password)) else {
        return Err(AppError::invalid("Missing email or password"));
    };
    Ok(LoginInput {
        email: normalize_email(email),
        password: password.to_string(),
    })
}

pub fn parse_transaction_type(raw: &str) -> Result<TransactionType, AppError> {
    TransactionType::from_str(raw.trim())
        .map_err(|_| AppError::invalid(r#"Type must be either "income" or "expense""#))
}

/// Accepts a JSON number or a numeric string, rounded to cents.
pub fn parse_amount(raw: &Value) -> Result<Decimal, AppError> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(AppError::invalid("Amount must be a number")),
    };
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AppError::invalid("Amount must be a number"))?
        .round_dp(2);

    if amount <= Decimal::ZERO {
        return Err(AppError::invalid("Amount must be greater than 0"));
    }
    if amount >= Decimal::from(MAX_AMOUNT) {
        return Err(AppError::invalid("Amount is too large"));
    }
    Ok(amount)
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid("Date must be in YYYY-MM-DD format"))
}

fn parse_category(raw: &str) -> Result<String, AppError> {
    let category = raw.trim();
    if category.is_empty() {
        return Err(AppError::invalid("Category must not be empty"));
    }
    Ok(category.to_string())
}

pub fn validate_new_transaction(req: &TransactionRequest) -> Result<NewTransaction, AppError> {
    let (Some(amount), Some(category), Some(description), Some(date), Some(kind)) = (
        req.amount.as_ref().filter(|v| !v.is_null()),
        req.category.as_deref(),
        req.description.as_deref(),
        req.date.as_deref(),
        req.kind.as_deref(),
    ) else {
        return Err(AppError::invalid("Missing required fields"));
    };

    Ok(NewTransaction {
        kind: parse_transaction_type(kind)?,
        amount: parse_amount(amount)?,
        category: parse_category(category)?,
        description: description.trim().to_string(),
        date: parse_date(date)?,
    })
}

pub fn validate_transaction_patch(req: &TransactionRequest) -> Result<TransactionPatch, AppError> {
    let patch = TransactionPatch {
        kind: req.kind.as_deref().map(parse_transaction_type).transpose()?,
        amount: req
            .amount
            .as_ref()
            .filter(|v| !v.is_null())
            .map(parse_amount)
            .transpose()?,
        category: req.category.as_deref().map(parse_category).transpose()?,
        description: req.description.as_deref().map(|d| d.trim().to_string()),
        date: req.date.as_deref().map(parse_date).transpose()?,
    };
    if patch.is_empty() {
        return Err(AppError::invalid("No fields to update"));
    }
    Ok(patch)
}
