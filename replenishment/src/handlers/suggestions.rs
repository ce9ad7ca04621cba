//! Suggestion CRUD endpoints: list, update-while-pending, reject, approve, clear (spec §4.8, §4.9).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Suggestion, SuggestionEdit, SuggestionStatus};
use crate::repositories::SuggestionFilter;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub store_id: Option<String>,
    pub status: Option<SuggestionStatus>,
    pub product_id: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Suggestion>>> {
    let filter = SuggestionFilter {
        store_id: query.store_id,
        status: query.status,
        product_id: query.product_id,
    };
    let suggestions = state.suggestion_store.list(filter).await?;
    Ok(Json(suggestions))
}

pub async fn update_pending(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edit): Json<SuggestionEdit>,
) -> Result<Json<Option<Suggestion>>> {
    let updated = state.suggestion_store.update_pending(id, edit).await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct IdsBody {
    pub ids: Vec<Uuid>,
}

pub async fn reject(State(state): State<AppState>, Json(body): Json<IdsBody>) -> Result<Json<()>> {
    state.suggestion_store.reject(&body.ids).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    pub ids: Vec<Uuid>,
    pub store_id: String,
    #[serde(default)]
    pub generate_po: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub purchase_order_ids: Vec<Uuid>,
    pub skipped: Vec<SkippedSuggestionBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSuggestionBody {
    pub suggestion_id: Uuid,
    pub reason: String,
}

pub async fn approve(
    State(state): State<AppState>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<ApproveResponse>> {
    let outcome = state.po_converter.approve(&body.store_id, &body.ids, body.generate_po).await?;
    Ok(Json(ApproveResponse {
        purchase_order_ids: outcome.created.iter().map(|(po, _)| po.id).collect(),
        skipped: outcome
            .skipped
            .into_iter()
            .map(|s| SkippedSuggestionBody { suggestion_id: s.suggestion_id, reason: s.reason })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearQuery {
    pub store_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub deleted: u64,
}

pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>> {
    let deleted = state.suggestion_store.clear(&query.store_id).await?;
    Ok(Json(ClearResponse { deleted }))
}
