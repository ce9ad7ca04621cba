//! Pharmacy Replenishment Decision Engine: forecasting, coverage, supplier
//! optimization, and the transactional writers (sales, GRN, purchase orders)
//! that surround them.

pub mod domain;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod retry;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use services::{FefoAllocator, GrnIngestor, InventoryLedger, PoConverter, RecommendationAssembler, SuggestionStore};

#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<RecommendationAssembler>,
    pub suggestion_store: Arc<SuggestionStore>,
    pub po_converter: Arc<PoConverter>,
    pub fefo_allocator: Arc<FefoAllocator>,
    pub grn_ingestor: Arc<GrnIngestor>,
    pub inventory_ledger: Arc<InventoryLedger>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(handlers::generation::generate))
        .route("/suggestions", get(handlers::suggestions::list))
        .route("/suggestions", delete(handlers::suggestions::clear))
        .route("/suggestions/:id", patch(handlers::suggestions::update_pending))
        .route("/suggestions/reject", post(handlers::suggestions::reject))
        .route("/suggestions/approve", post(handlers::suggestions::approve))
        .route("/sales", post(handlers::sales::create))
        .route("/sales/:id/refund", post(handlers::sales::refund))
        .route("/grn", post(handlers::grn::receive))
        .with_state(state)
}
