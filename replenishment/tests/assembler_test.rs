//! Integration tests for the Recommendation Assembler against fake repositories
//! (spec §4.7) — no live Postgres needed since the repository traits are the seam.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use pharmos_replenishment::error::Result;
use pharmos_replenishment::models::{
    Batch, DeliverySchedule, NewMovement, Product, ProductStatus, Sale, SaleLine, StockMovement,
    Suggestion, SuggestionEdit, SuggestionStatus, Supplier,
};
use pharmos_replenishment::repositories::{
    CatalogRepository, InventoryRepository, SalesRepository, SuggestionFilter,
    SuggestionRepository, SupplierPrice,
};
use pharmos_replenishment::services::{GenerationRequest, RecommendationAssembler, SalesHistoryReader};
use pharmos_shared::events::EventPublisher;

struct FakeCatalog {
    products: Vec<Product>,
    suppliers: HashMap<Uuid, Vec<SupplierPrice>>,
}

#[async_trait]
impl CatalogRepository for FakeCatalog {
    async fn active_products(&self, _store_id: &str) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn product_by_id(&self, product_id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn suppliers_for_product(&self, product_id: Uuid) -> Result<Vec<SupplierPrice>> {
        Ok(self.suppliers.get(&product_id).cloned().unwrap_or_default())
    }
}

struct FakeInventory {
    stock: HashMap<Uuid, i64>,
}

#[async_trait]
impl InventoryRepository for FakeInventory {
    async fn current_stock(&self, product_id: Uuid, _store_id: &str) -> Result<i64> {
        Ok(*self.stock.get(&product_id).unwrap_or(&0))
    }

    async fn batches_by_fefo(&self, _product_id: Uuid, _store_id: &str) -> Result<Vec<Batch>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn batch_by_id_for_update(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _batch_id: Uuid,
    ) -> Result<Option<Batch>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn apply_movement_in_tx(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _movement: NewMovement,
    ) -> Result<(Batch, StockMovement)> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn find_or_create_batch_in_tx(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _product_id: Uuid,
        _store_id: &str,
        _supplier_id: Option<Uuid>,
        _batch_number: &str,
        _expiry_date: Option<NaiveDate>,
        _unit_cost: Decimal,
    ) -> Result<Batch> {
        unimplemented!("not exercised by assembler tests")
    }
}

struct FakeSales {
    series: HashMap<Uuid, Vec<f64>>,
}

#[async_trait]
impl SalesRepository for FakeSales {
    async fn history(
        &self,
        _store_id: &str,
        product_ids: &[Uuid],
        _window_days: u32,
        _today: NaiveDate,
    ) -> Result<HashMap<Uuid, Vec<f64>>> {
        Ok(product_ids
            .iter()
            .map(|id| (*id, self.series.get(id).cloned().unwrap_or_default()))
            .collect())
    }

    async fn insert_sale_in_tx(&self, _tx: &mut Transaction<'_, Postgres>, _sale: &Sale) -> Result<()> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn insert_sale_line_in_tx(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _line: &SaleLine,
    ) -> Result<()> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn sale_by_id(&self, _sale_id: Uuid) -> Result<Option<Sale>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn sale_lines(&self, _sale_id: Uuid) -> Result<Vec<SaleLine>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn sale_by_id_for_update(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _sale_id: Uuid,
    ) -> Result<Option<Sale>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn mark_refunded_in_tx(&self, _tx: &mut Transaction<'_, Postgres>, _sale_id: Uuid) -> Result<()> {
        unimplemented!("not exercised by assembler tests")
    }
}

#[derive(Default)]
struct FakeSuggestions {
    inserted: Mutex<Vec<Suggestion>>,
}

#[async_trait]
impl SuggestionRepository for FakeSuggestions {
    async fn insert(&self, suggestion: &Suggestion) -> Result<()> {
        self.inserted.lock().unwrap().push(suggestion.clone());
        Ok(())
    }

    async fn list(&self, _filter: &SuggestionFilter) -> Result<Vec<Suggestion>> {
        Ok(self.inserted.lock().unwrap().clone())
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<Suggestion>> {
        Ok(self.inserted.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn update_edit(&self, _id: Uuid, _edit: &SuggestionEdit) -> Result<Option<Suggestion>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn set_status(&self, _id: Uuid, _status: SuggestionStatus) -> Result<()> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn delete_for_store(&self, _store_id: &str) -> Result<u64> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn lock_pending_by_ids_in_tx(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _ids: &[Uuid],
    ) -> Result<Vec<Suggestion>> {
        unimplemented!("not exercised by assembler tests")
    }

    async fn set_status_in_tx(
        &self,
        _tx: &mut Transaction<'_, Postgres>,
        _id: Uuid,
        _status: SuggestionStatus,
    ) -> Result<()> {
        unimplemented!("not exercised by assembler tests")
    }
}

fn product(sku: &str) -> Product {
    Product { id: Uuid::new_v4(), sku: sku.to_string(), name: sku.to_string(), unit: "box".to_string(), status: ProductStatus::Active }
}

fn supplier_price(lead_time_days: i32) -> SupplierPrice {
    SupplierPrice {
        supplier: Supplier {
            id: Uuid::new_v4(),
            name: "Main Distributor".to_string(),
            lead_time_days,
            delivery_schedule: DeliverySchedule::Daily,
            minimum_order_quantity: 10,
            cutoff_time: None,
            active: true,
        },
        unit_cost: Decimal::new(500, 2),
        moq: 10,
    }
}

#[tokio::test]
async fn generate_classifies_urgency_and_skips_unsourced_products() {
    let healthy = product("HEALTHY-1");
    let critical = product("CRITICAL-1");
    let unsourced = product("UNSOURCED-1");

    let catalog = Arc::new(FakeCatalog {
        products: vec![healthy.clone(), critical.clone(), unsourced.clone()],
        suppliers: HashMap::from([
            (healthy.id, vec![supplier_price(3)]),
            (critical.id, vec![supplier_price(3)]),
        ]),
    });
    let inventory = Arc::new(FakeInventory {
        stock: HashMap::from([(healthy.id, 100), (critical.id, 2), (unsourced.id, 50)]),
    });
    let sales = Arc::new(FakeSales {
        series: HashMap::from([
            (healthy.id, vec![5.0; 14]),
            (critical.id, vec![5.0; 14]),
            (unsourced.id, vec![5.0; 14]),
        ]),
    });
    let suggestions = Arc::new(FakeSuggestions::default());
    let events = Arc::new(EventPublisher::mock());

    let assembler = RecommendationAssembler::new(
        catalog,
        inventory,
        Arc::new(SalesHistoryReader::new(sales)),
        suggestions.clone(),
        events,
    );

    let request = GenerationRequest {
        store_id: "store-1".to_string(),
        coverage_days: 30,
        service_level: 0.95,
        analysis_period_days: 14,
        include_supplier_comparison: true,
        worker_count: Some(2),
    };
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let result = assembler.generate(request, rx).await.expect("generation should succeed");

    assert_eq!(result.items.len(), 3);
    assert_eq!(result.summary.total_products, 3);

    let healthy_result = result.items.iter().find(|i| i.sku == "HEALTHY-1").unwrap();
    assert!(healthy_result.error.is_none());
    assert!(healthy_result.suggestion_id.is_some());

    let critical_result = result.items.iter().find(|i| i.sku == "CRITICAL-1").unwrap();
    assert_eq!(critical_result.urgency, pharmos_replenishment::models::UrgencyLevel::Critical);
    assert!(critical_result.recommended_order_qty > 0);
    assert!(critical_result.suggestion_id.is_some());

    let unsourced_result = result.items.iter().find(|i| i.sku == "UNSOURCED-1").unwrap();
    assert!(unsourced_result.error.is_some());
    assert!(unsourced_result.suggestion_id.is_none());

    // Only the two sourced products get persisted as suggestions.
    assert_eq!(suggestions.inserted.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn generate_respects_cancellation_before_persisting_anything() {
    let healthy = product("HEALTHY-2");
    let catalog = Arc::new(FakeCatalog {
        products: vec![healthy.clone()],
        suppliers: HashMap::from([(healthy.id, vec![supplier_price(3)])]),
    });
    let inventory = Arc::new(FakeInventory { stock: HashMap::from([(healthy.id, 100)]) });
    let sales = Arc::new(FakeSales { series: HashMap::from([(healthy.id, vec![5.0; 14])]) });
    let suggestions = Arc::new(FakeSuggestions::default());
    let events = Arc::new(EventPublisher::mock());

    let assembler = RecommendationAssembler::new(
        catalog,
        inventory,
        Arc::new(SalesHistoryReader::new(sales)),
        suggestions.clone(),
        events,
    );

    let request = GenerationRequest {
        store_id: "store-1".to_string(),
        coverage_days: 30,
        service_level: 0.95,
        analysis_period_days: 14,
        include_supplier_comparison: true,
        worker_count: Some(2),
    };
    let (tx, rx) = tokio::sync::watch::channel(false);
    tx.send(true).unwrap();

    let result = assembler.generate(request, rx).await.expect("cancellation is not an error");

    assert!(result.items.is_empty());
    assert_eq!(suggestions.inserted.lock().unwrap().len(), 0);
}
