use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    transactions::{
        dto::{ListFilter, MessageResponse, Summary, TransactionRequest},
        repo::TransactionStore,
        repo_types::Transaction,
        services::{summarize, Filter},
    },
    validation::{from_object, validate_new_transaction, validate_transaction_patch, JsonObject},
};

type Store = Arc<dyn TransactionStore>;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/summary", get(transaction_summary))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

/// Ids that are not UUIDs cannot name a transaction, so they are simply not found.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::transaction_not_found())
}

#[instrument(skip(store, user, query), fields(user_id = %user.id))]
pub async fn list_transactions(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let Query(query) = query?;
    let filter = Filter::try_from(&query)?;
    let txs = store.list(user.id).await?;
    Ok(Json(filter.apply(txs)))
}

#[instrument(skip(store, user), fields(user_id = %user.id))]
pub async fn transaction_summary(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
) -> Result<Json<Summary>, AppError> {
    let txs = store.list(user.id).await?;
    Ok(Json(summarize(&txs)))
}

#[instrument(skip(store, user), fields(user_id = %user.id))]
pub async fn get_transaction(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let id = parse_id(&id)?;
    store
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(AppError::transaction_not_found)
}

#[instrument(skip(store, user, payload), fields(user_id = %user.id))]
pub async fn create_transaction(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let Json(body) = payload?;
    let payload: TransactionRequest = from_object(body)?;
    let new = validate_new_transaction(&payload)?;
    let tx = store.create(user.id, new).await?;
    info!(transaction_id = %tx.id, "transaction created");
    Ok((StatusCode::CREATED, Json(tx)))
}

#[instrument(skip(store, user, payload), fields(user_id = %user.id))]
pub async fn update_transaction(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<JsonObject>, JsonRejection>,
) -> Result<Json<Transaction>, AppError> {
    let Json(body) = payload?;
    let payload: TransactionRequest = from_object(body)?;
    let patch = validate_transaction_patch(&payload)?;
    let id = parse_id(&id)?;
    let tx = store
        .update(user.id, id, patch)
        .await?
        .ok_or_else(AppError::transaction_not_found)?;
    info!(transaction_id = %tx.id, "transaction updated");
    Ok(Json(tx))
}

#[instrument(skip(store, user), fields(user_id = %user.id))]
pub async fn delete_transaction(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    if !store.delete(user.id, id).await? {
        return Err(AppError::transaction_not_found());
    }
    info!(transaction_id = %id, "transaction deleted");
    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".into(),
    }))
}
