pub mod generation;
pub mod grn;
pub mod sales;
pub mod suggestions;
