pub mod assembler;
pub mod fefo_allocator;
pub mod grn_ingestor;
pub mod inventory_ledger;
pub mod po_converter;
pub mod sales_history;
pub mod suggestion_store;

pub use assembler::{GenerationRequest, GenerationResult, GenerationSummary, RecommendationAssembler, SkuResult};
pub use fefo_allocator::FefoAllocator;
pub use grn_ingestor::{GrnIngestor, GrnReceipt, NewGrn, NewGrnLine};
pub use inventory_ledger::InventoryLedger;
pub use po_converter::{ConversionOutcome, PoConverter, SkippedSuggestion};
pub use sales_history::SalesHistoryReader;
pub use suggestion_store::SuggestionStore;
