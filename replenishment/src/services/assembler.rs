//! Recommendation Assembler: orchestrates forecast, coverage, and supplier optimization
//! per SKU (spec §4.7). Per-SKU work is embarrassingly parallel; fan-out is bounded by a
//! semaphore sized to the request's worker count (default 8) and is atomic at the request
//! level — on cancellation no suggestions are persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use pharmos_shared::events::{DomainEvent, EventPublisher};

use crate::domain::{self, Candidate};
use crate::error::Result;
use crate::models::{
    ActionCode, CoverageScenario, DemandPattern, Product, Suggestion, SuggestionReason,
    SuggestionStatus, SupplierOption, Trend, UrgencyLevel,
};
use crate::repositories::{CatalogRepository, InventoryRepository, SuggestionRepository};
use crate::services::sales_history::SalesHistoryReader;

const DEFAULT_WORKER_COUNT: usize = 8;
const HORIZON_PERIODS: [u32; 3] = [1, 7, 30];

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub store_id: String,
    pub coverage_days: u32,
    pub service_level: f64,
    pub analysis_period_days: u32,
    pub include_supplier_comparison: bool,
    pub worker_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMessage {
    pub message: String,
    pub action: ActionCode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuResult {
    pub sku: String,
    pub product_id: Uuid,
    pub current_stock: i64,
    pub days_remaining: f64,
    pub urgency: UrgencyLevel,
    pub pattern: DemandPattern,
    pub pattern_confidence: f64,
    pub trend: Trend,
    pub forecasted_daily_demand: f64,
    pub recommended_order_qty: i64,
    pub rop: i64,
    pub coverage_scenarios: Vec<CoverageScenario>,
    pub supplier_options: Vec<SupplierOption>,
    pub savings_vs_max: Decimal,
    pub savings_percent: f64,
    pub recommendation: RecommendationMessage,
    pub next_delivery_date: Option<NaiveDate>,
    pub suggestion_id: Option<Uuid>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub total_products: usize,
    pub critical_products: usize,
    pub low_stock_products: usize,
    pub good_stock_products: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub items: Vec<SkuResult>,
    pub summary: GenerationSummary,
}

pub struct RecommendationAssembler {
    catalog: Arc<dyn CatalogRepository>,
    inventory: Arc<dyn InventoryRepository>,
    sales_history: Arc<SalesHistoryReader>,
    suggestions: Arc<dyn SuggestionRepository>,
    events: Arc<EventPublisher>,
}

impl RecommendationAssembler {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        inventory: Arc<dyn InventoryRepository>,
        sales_history: Arc<SalesHistoryReader>,
        suggestions: Arc<dyn SuggestionRepository>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self { catalog, inventory, sales_history, suggestions, events }
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<GenerationResult> {
        let today = Utc::now().date_naive();
        let products = self.catalog.active_products(&request.store_id).await?;
        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        let history = self
            .sales_history
            .history(&request.store_id, &product_ids, request.analysis_period_days, today)
            .await?;

        let worker_count = request.worker_count.unwrap_or(DEFAULT_WORKER_COUNT).max(1);
        let semaphore = Arc::new(Semaphore::new(worker_count));

        let mut handles = Vec::with_capacity(products.len());
        for product in products {
            if *cancel.borrow() {
                break;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let series = history.get(&product.id).cloned().unwrap_or_default();
            let catalog = self.catalog.clone();
            let inventory = self.inventory.clone();
            let request = request.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                if *cancel.borrow() {
                    return None;
                }
                Some(process_sku(&product, series, today, &request, catalog, inventory).await)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(err) => tracing::warn!(%err, "sku task panicked"),
            }
        }

        if *cancel.borrow() {
            return Ok(GenerationResult { items: Vec::new(), summary: GenerationSummary::default() });
        }

        let mut summary = GenerationSummary { total_products: results.len(), ..Default::default() };
        for item in &results {
            match item.urgency {
                UrgencyLevel::Critical | UrgencyLevel::Urgent => summary.critical_products += 1,
                UrgencyLevel::Low => summary.low_stock_products += 1,
                UrgencyLevel::Good | UrgencyLevel::Overstocked => summary.good_stock_products += 1,
            }
        }

        self.persist_and_tag(&request.store_id, request.analysis_period_days, &mut results).await?;

        Ok(GenerationResult { items: results, summary })
    }

    async fn persist_and_tag(
        &self,
        store_id: &str,
        analysis_period_days: u32,
        results: &mut [SkuResult],
    ) -> Result<()> {
        for item in results.iter_mut() {
            if item.error.is_some() {
                continue;
            }
            let suggestion = Suggestion {
                id: Uuid::new_v4(),
                product_id: item.product_id,
                store_id: store_id.to_string(),
                supplier_id: item.supplier_options.iter().find(|o| o.recommended).map(|o| o.supplier_id),
                status: SuggestionStatus::Pending,
                rop: item.rop,
                order_qty: item.recommended_order_qty,
                analysis_period_days,
                stock_duration_days: item.days_remaining,
                urgency: item.urgency,
                next_delivery_date: item.next_delivery_date,
                scenarios: item.coverage_scenarios.clone(),
                reason: SuggestionReason {
                    pattern: item.pattern,
                    confidence: item.pattern_confidence,
                    trend: item.trend.clone(),
                    forecasted_daily_demand: item.forecasted_daily_demand,
                    urgency: item.urgency,
                    action: item.recommendation.action,
                    message: item.recommendation.message.clone(),
                    supplier_options: item.supplier_options.clone(),
                    savings_vs_max: item.savings_vs_max,
                    savings_percent: item.savings_percent,
                },
                note: None,
                created_at: Utc::now(),
            };
            self.suggestions.insert(&suggestion).await?;
            item.suggestion_id = Some(suggestion.id);

            if let Ok(builder) = DomainEvent::builder(
                "suggestion_generated",
                suggestion.id,
                "suggestion",
                store_id.to_string(),
            )
            .data(serde_json::json!({ "product_id": suggestion.product_id, "urgency": suggestion.urgency }))
            {
                if let Err(err) = self.events.publish(&builder.build()).await {
                    tracing::warn!(%err, "failed to publish suggestion_generated event");
                }
            }
        }
        Ok(())
    }
}

async fn process_sku(
    product: &Product,
    series: Vec<f64>,
    today: NaiveDate,
    request: &GenerationRequest,
    catalog: Arc<dyn CatalogRepository>,
    inventory: Arc<dyn InventoryRepository>,
) -> SkuResult {
    let fallback = |message: String| SkuResult {
        sku: product.sku.clone(),
        product_id: product.id,
        current_stock: 0,
        days_remaining: 0.0,
        urgency: UrgencyLevel::Good,
        pattern: DemandPattern::Steady,
        pattern_confidence: 0.0,
        trend: Trend { direction: crate::models::TrendDirection::Steady, slope: 0.0, r2: 0.0 },
        forecasted_daily_demand: 0.0,
        recommended_order_qty: 0,
        rop: 0,
        coverage_scenarios: Vec::new(),
        supplier_options: Vec::new(),
        savings_vs_max: Decimal::ZERO,
        savings_percent: 0.0,
        recommendation: RecommendationMessage {
            message: message.clone(),
            action: ActionCode::Monitor,
        },
        next_delivery_date: None,
        suggestion_id: None,
        error: Some(message),
    };

    let current_stock = match inventory.current_stock(product.id, &request.store_id).await {
        Ok(v) => v,
        Err(err) => return fallback(format!("failed to read current stock: {err}")),
    };

    let supplier_prices = match catalog.suppliers_for_product(product.id).await {
        Ok(v) => v,
        Err(err) => return fallback(format!("failed to read supplier prices: {err}")),
    };
    if supplier_prices.is_empty() {
        return fallback("no active supplier for this product".to_string());
    }

    let anchor_weekday = weekday_index(today - chrono::Duration::days(series.len().max(1) as i64 - 1));
    let lead_time_for_forecast = supplier_prices.iter().map(|s| s.supplier.lead_time_days as i64).min().unwrap_or(1);
    let forecast = domain::run_forecast(&series, anchor_weekday, lead_time_for_forecast, request.service_level);

    let coverage = domain::current_coverage(current_stock, forecast.mean_daily_demand, today);
    let urgency = UrgencyLevel::from_days_remaining(coverage.days_remaining);

    let default_moq = supplier_prices.iter().map(|s| s.moq as i64).min().unwrap_or(1);
    let scenarios = domain::scenarios(
        current_stock,
        forecast.mean_daily_demand,
        forecast.safety_stock,
        supplier_prices[0].unit_cost,
        default_moq,
        &HORIZON_PERIODS,
    );

    let requested_qty = domain::order_quantity(
        current_stock,
        forecast.mean_daily_demand,
        request.coverage_days,
        forecast.safety_stock,
        default_moq,
    );

    let candidates: Vec<Candidate<'_>> = supplier_prices
        .iter()
        .map(|sp| Candidate { supplier: &sp.supplier, unit_price: sp.unit_cost })
        .collect();

    let optimizer_result = if request.include_supplier_comparison {
        domain::optimize(&candidates, requested_qty.max(1), coverage.days_remaining, today)
    } else {
        domain::optimize(&candidates[..1.min(candidates.len())], requested_qty.max(1), coverage.days_remaining, today)
    };

    let recommended = optimizer_result.options.iter().find(|o| o.recommended);
    let effective_urgency = match recommended {
        Some(opt) if opt.risk == crate::models::RiskLevel::Critical => UrgencyLevel::Critical,
        _ => urgency,
    };

    let lead_time = recommended
        .and_then(|o| supplier_prices.iter().find(|sp| sp.supplier.id == o.supplier_id))
        .map(|sp| sp.supplier.lead_time_days as f64)
        .unwrap_or(lead_time_for_forecast as f64);

    let rop = (forecast.mean_daily_demand * lead_time + forecast.safety_stock as f64).ceil() as i64;

    let recommended_moq = recommended
        .and_then(|o| supplier_prices.iter().find(|sp| sp.supplier.id == o.supplier_id))
        .map(|sp| sp.moq as i64)
        .unwrap_or(default_moq);

    let order_qty = round_up_to_multiple(requested_qty, recommended_moq);

    let action = effective_urgency.action();
    let message = describe_recommendation(effective_urgency, &forecast.pattern, coverage.days_remaining);
    let next_delivery_date = recommended.map(|o| o.delivery_date);

    SkuResult {
        sku: product.sku.clone(),
        product_id: product.id,
        current_stock,
        days_remaining: coverage.days_remaining,
        urgency: effective_urgency,
        pattern: forecast.pattern,
        pattern_confidence: forecast.pattern_confidence,
        trend: forecast.trend,
        forecasted_daily_demand: forecast.mean_daily_demand,
        recommended_order_qty: order_qty,
        rop,
        coverage_scenarios: scenarios,
        supplier_options: optimizer_result.options,
        savings_vs_max: optimizer_result.savings_vs_max,
        savings_percent: optimizer_result.savings_percent,
        recommendation: RecommendationMessage { message, action },
        next_delivery_date,
        suggestion_id: None,
        error: None,
    }
}

fn round_up_to_multiple(qty: i64, moq: i64) -> i64 {
    let moq = moq.max(1);
    if qty == 0 {
        0
    } else {
        ((qty + moq - 1) / moq) * moq
    }
}

fn weekday_index(date: NaiveDate) -> usize {
    use chrono::Datelike;
    date.weekday().num_days_from_monday() as usize
}

fn describe_recommendation(urgency: UrgencyLevel, pattern: &DemandPattern, days_remaining: f64) -> String {
    match urgency {
        UrgencyLevel::Critical => format!("Stock critical: {:.1} days remaining, order immediately", days_remaining),
        UrgencyLevel::Urgent => format!("Stock urgent: {:.1} days remaining, order today", days_remaining),
        UrgencyLevel::Low => format!("Stock low: {:.1} days remaining, order soon", days_remaining),
        UrgencyLevel::Good => format!("Stock healthy ({:?} demand): {:.1} days remaining", pattern, days_remaining),
        UrgencyLevel::Overstocked => format!("Overstocked: {:.1} days remaining, reduce future orders", days_remaining),
    }
}
