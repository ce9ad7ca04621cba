use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pharmos_replenishment::repositories::{
    PgCatalogRepository, PgInventoryRepository, PgPurchaseOrderRepository, PgSalesRepository,
    PgSuggestionRepository,
};
use pharmos_replenishment::services::{
    FefoAllocator, GrnIngestor, InventoryLedger, PoConverter, RecommendationAssembler,
    SalesHistoryReader, SuggestionStore,
};
use pharmos_replenishment::{create_router, AppState};
use pharmos_shared::database::{ConnectionPool, DatabaseConfig};
use pharmos_shared::events::EventPublisher;
use pharmos_shared::AppConfig;

mod health;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmos=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    config.validate().map_err(|err| format!("invalid configuration: {err}"))?;
    info!("configuration loaded");

    let pool_config: DatabaseConfig = config.database_pool_config();
    let pool = ConnectionPool::new(pool_config).await?.pool().clone();
    info!("database connected");

    let events = match EventPublisher::new(&config.redis.url).await {
        Ok(publisher) => {
            info!("redis event publisher connected");
            Arc::new(publisher)
        }
        Err(err) => {
            tracing::warn!(%err, "failed to connect to redis, falling back to mock publisher");
            Arc::new(EventPublisher::mock())
        }
    };

    let inventory_repo = Arc::new(PgInventoryRepository::new(pool.clone()));
    let catalog_repo = Arc::new(PgCatalogRepository::new(pool.clone()));
    let sales_repo = Arc::new(PgSalesRepository::new(pool.clone()));
    let suggestion_repo = Arc::new(PgSuggestionRepository::new(pool.clone()));
    let po_repo = Arc::new(PgPurchaseOrderRepository::new(pool.clone()));

    let sales_history = Arc::new(SalesHistoryReader::new(sales_repo.clone()));

    let assembler = Arc::new(RecommendationAssembler::new(
        catalog_repo.clone(),
        inventory_repo.clone(),
        sales_history,
        suggestion_repo.clone(),
        events.clone(),
    ));
    let suggestion_store = Arc::new(SuggestionStore::new(suggestion_repo.clone()));
    let po_converter = Arc::new(PoConverter::new(
        pool.clone(),
        suggestion_repo.clone(),
        po_repo.clone(),
        catalog_repo.clone(),
        events.clone(),
    ));
    let fefo_allocator = Arc::new(FefoAllocator::new(
        pool.clone(),
        inventory_repo.clone(),
        sales_repo.clone(),
        events.clone(),
    ));
    let grn_ingestor = Arc::new(GrnIngestor::new(
        pool.clone(),
        inventory_repo.clone(),
        po_repo.clone(),
        events.clone(),
    ));
    let inventory_ledger = Arc::new(InventoryLedger::new(inventory_repo.clone(), events.clone()));

    let state = AppState {
        assembler,
        suggestion_store,
        po_converter,
        fefo_allocator,
        grn_ingestor,
        inventory_ledger,
    };

    health::init_health_monitoring();

    let app = Router::new()
        .nest("/api/v1/replenishment", create_router(state))
        .route("/health", axum::routing::get(health::health_check))
        .route("/ready", axum::routing::get(health::readiness_check))
        .route("/live", axum::routing::get(health::liveness_check))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive())
                .layer(axum::Extension(pool.clone())),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("pharmacy replenishment engine starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
