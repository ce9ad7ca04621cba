pub mod inventory;
pub mod product;
pub mod purchase_order;
pub mod sale;
pub mod suggestion;

pub use inventory::{Batch, MovementReference, MovementType, NewMovement, StockMovement};
pub use product::{DeliverySchedule, Product, ProductStatus, ProductSupplier, Supplier};
pub use purchase_order::{NewPOLine, NewPurchaseOrder, POLine, POStatus, PurchaseOrder};
pub use sale::{NewSale, NewSaleLine, Sale, SaleLine, SaleStatus};
pub use suggestion::{
    ActionCode, CoverageScenario, DemandPattern, RiskLevel, Suggestion, SuggestionEdit,
    SuggestionReason, SuggestionStatus, SupplierOption, Trend, TrendDirection, UrgencyLevel,
};
