//! `POST /generate` — runs the Recommendation Assembler for a store (spec §6).

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::MAX_COVERAGE_DAYS;
use crate::error::{Error, Result};
use crate::services::{GenerationRequest, SkuResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequestBody {
    pub store_id: String,
    #[serde(default = "default_coverage_days")]
    pub coverage_days: u32,
    #[serde(default = "default_service_level")]
    pub service_level: f64,
    #[serde(default = "default_analysis_period_days")]
    pub analysis_period_days: u32,
    #[serde(default = "default_true")]
    pub include_supplier_comparison: bool,
    pub worker_count: Option<usize>,
}

fn default_coverage_days() -> u32 {
    7
}
fn default_service_level() -> f64 {
    0.95
}
fn default_analysis_period_days() -> u32 {
    30
}
fn default_true() -> bool {
    true
}

const ALLOWED_COVERAGE_DAYS: [u32; 6] = [1, 7, 14, 30, 60, 90];

fn validate(body: &GenerateRequestBody) -> Result<()> {
    if !ALLOWED_COVERAGE_DAYS.contains(&body.coverage_days) {
        return Err(Error::Validation(format!(
            "coverageDays must be one of {:?}, got {}",
            ALLOWED_COVERAGE_DAYS, body.coverage_days
        )));
    }
    if !(0.5..=0.999).contains(&body.service_level) {
        return Err(Error::Validation("serviceLevel must be in [0.5, 0.999]".to_string()));
    }
    if !(7..=365).contains(&body.analysis_period_days) {
        return Err(Error::Validation("analysisPeriodDays must be in [7, 365]".to_string()));
    }
    if body.store_id.trim().is_empty() {
        return Err(Error::Validation("storeId must not be empty".to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummaryBody {
    pub total_products: usize,
    pub critical_products: usize,
    pub low_stock_products: usize,
    pub good_stock_products: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponseBody {
    pub items: Vec<SkuResult>,
    pub summary: GenerationSummaryBody,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequestBody>,
) -> Result<Json<GenerateResponseBody>> {
    validate(&body)?;

    let (_tx, rx) = watch::channel(false);
    let request = GenerationRequest {
        store_id: body.store_id,
        coverage_days: body.coverage_days.min(MAX_COVERAGE_DAYS as u32),
        service_level: body.service_level,
        analysis_period_days: body.analysis_period_days,
        include_supplier_comparison: body.include_supplier_comparison,
        worker_count: body.worker_count,
    };

    let result = state.assembler.generate(request, rx).await?;

    Ok(Json(GenerateResponseBody {
        items: result.items,
        summary: GenerationSummaryBody {
            total_products: result.summary.total_products,
            critical_products: result.summary.critical_products,
            low_stock_products: result.summary.low_stock_products,
            good_stock_products: result.summary.good_stock_products,
        },
    }))
}
