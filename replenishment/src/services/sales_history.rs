//! Produces per-SKU daily demand series over a window (spec §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::repositories::SalesRepository;

pub struct SalesHistoryReader {
    repo: Arc<dyn SalesRepository>,
}

impl SalesHistoryReader {
    pub fn new(repo: Arc<dyn SalesRepository>) -> Self {
        Self { repo }
    }

    /// Output always has exactly `window_days` entries per product, oldest-first,
    /// zero-filled for missing days (spec §4.2 contract).
    pub async fn history(
        &self,
        store_id: &str,
        product_ids: &[Uuid],
        window_days: u32,
        today: NaiveDate,
    ) -> Result<HashMap<Uuid, Vec<f64>>> {
        self.repo.history(store_id, product_ids, window_days, today).await
    }
}
