//! Sale creation and refund endpoints, backed by the FEFO Sale Allocator (spec §4.10).

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewSale, Sale};
use crate::AppState;

fn generate_sale_number() -> String {
    format!("SALE-{}", Uuid::new_v4().simple())
}

pub async fn create(State(state): State<AppState>, Json(new_sale): Json<NewSale>) -> Result<Json<Sale>> {
    let sale = state.fefo_allocator.create_sale(generate_sale_number(), new_sale).await?;
    Ok(Json(sale))
}

pub async fn refund(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<Sale>> {
    let sale = state.fefo_allocator.refund_sale(sale_id, None).await?;
    Ok(Json(sale))
}
