pub mod catalog_repository;
pub mod inventory_repository;
pub mod purchase_order_repository;
pub mod sales_repository;
pub mod suggestion_repository;

pub use catalog_repository::{CatalogRepository, PgCatalogRepository, SupplierPrice};
pub use inventory_repository::{InventoryRepository, PgInventoryRepository};
pub use purchase_order_repository::{PgPurchaseOrderRepository, PurchaseOrderRepository};
pub use sales_repository::{PgSalesRepository, SalesRepository};
pub use suggestion_repository::{PgSuggestionRepository, SuggestionFilter, SuggestionRepository};
