//! Suggestion Store: list, edit (PENDING only), reject, bulk-clear (spec §4.8). The only
//! writer of the suggestions table, per spec §5's shared-resource policy.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Suggestion, SuggestionEdit, SuggestionStatus};
use crate::repositories::{SuggestionFilter, SuggestionRepository};

pub struct SuggestionStore {
    repo: Arc<dyn SuggestionRepository>,
}

impl SuggestionStore {
    pub fn new(repo: Arc<dyn SuggestionRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: SuggestionFilter) -> Result<Vec<Suggestion>> {
        self.repo.list(&filter).await
    }

    pub async fn update_pending(&self, id: Uuid, edit: SuggestionEdit) -> Result<Option<Suggestion>> {
        self.repo.update_edit(id, &edit).await
    }

    pub async fn reject(&self, ids: &[Uuid]) -> Result<()> {
        for id in ids {
            if let Some(suggestion) = self.repo.by_id(*id).await? {
                if suggestion.status == SuggestionStatus::Pending {
                    self.repo.set_status(*id, SuggestionStatus::Rejected).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn clear(&self, store_id: &str) -> Result<u64> {
        self.repo.delete_for_store(store_id).await
    }
}
