//! Goods-received-note endpoint, backed by the GRN Ingestor (spec §4.11).

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::services::{GrnReceipt, NewGrn};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnReceiptBody {
    pub grn_number: String,
    pub total_cost: rust_decimal::Decimal,
    pub vat_amount: rust_decimal::Decimal,
    pub total_with_vat: rust_decimal::Decimal,
}

impl From<GrnReceipt> for GrnReceiptBody {
    fn from(r: GrnReceipt) -> Self {
        Self {
            grn_number: r.grn_number,
            total_cost: r.total_cost,
            vat_amount: r.vat_amount,
            total_with_vat: r.total_with_vat,
        }
    }
}

pub async fn receive(
    State(state): State<AppState>,
    Json(grn): Json<NewGrn>,
) -> Result<Json<GrnReceiptBody>> {
    let receipt = state.grn_ingestor.receive(grn).await?;
    Ok(Json(receipt.into()))
}
