//! Approval -> PO Converter: atomically approves suggestions and groups them into one
//! DRAFT purchase order per supplier (spec §4.9). The only writer of purchase_orders/po_lines.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use pharmos_shared::events::{DomainEvent, EventPublisher};

use crate::error::{Error, Result};
use crate::models::{NewPOLine, NewPurchaseOrder, POLine, PurchaseOrder, Suggestion, SuggestionStatus};
use crate::repositories::{CatalogRepository, PurchaseOrderRepository, SuggestionRepository};
use crate::retry;

pub struct ConversionOutcome {
    pub created: Vec<(PurchaseOrder, Vec<POLine>)>,
    pub skipped: Vec<SkippedSuggestion>,
}

#[derive(Debug, Clone)]
pub struct SkippedSuggestion {
    pub suggestion_id: Uuid,
    pub reason: String,
}

pub struct PoConverter {
    pool: PgPool,
    suggestions: Arc<dyn SuggestionRepository>,
    purchase_orders: Arc<dyn PurchaseOrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    events: Arc<EventPublisher>,
}

impl PoConverter {
    pub fn new(
        pool: PgPool,
        suggestions: Arc<dyn SuggestionRepository>,
        purchase_orders: Arc<dyn PurchaseOrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self { pool, suggestions, purchase_orders, catalog, events }
    }

    /// `ids` must currently be PENDING; approving without `generate_po` stops at APPROVED.
    /// Retries up to 3 times with jittered backoff if another request locks the same
    /// suggestions first; on exhaustion the last `ConcurrentModification` is returned.
    pub async fn approve(&self, store_id: &str, ids: &[Uuid], generate_po: bool) -> Result<ConversionOutcome> {
        retry::on_concurrent_modification(|| self.try_approve(store_id, ids, generate_po)).await
    }

    async fn try_approve(&self, store_id: &str, ids: &[Uuid], generate_po: bool) -> Result<ConversionOutcome> {
        let mut tx = self.pool.begin().await?;

        let locked = self.suggestions.lock_pending_by_ids_in_tx(&mut tx, ids).await?;
        if locked.is_empty() {
            return Err(Error::NoEligibleSuggestions);
        }
        if locked.len() != ids.len() {
            let found: std::collections::HashSet<Uuid> = locked.iter().map(|s| s.id).collect();
            let missing: Vec<Uuid> = ids.iter().filter(|id| !found.contains(id)).cloned().collect();
            return Err(Error::ConcurrentModification { ids: missing });
        }

        for suggestion in &locked {
            self.suggestions.set_status_in_tx(&mut tx, suggestion.id, SuggestionStatus::Approved).await?;
        }

        let mut created = Vec::new();
        let mut skipped = Vec::new();

        if generate_po {
            let by_supplier = group_by_supplier(&locked);

            for (supplier_id, group) in by_supplier {
                let supplier_prices = self.catalog.suppliers_for_product(group[0].product_id).await?;
                let supplier = supplier_prices.iter().find(|sp| sp.supplier.id == supplier_id);

                let Some(supplier) = supplier.filter(|sp| sp.supplier.is_active()) else {
                    for suggestion in &group {
                        skipped.push(SkippedSuggestion {
                            suggestion_id: suggestion.id,
                            reason: "recommended supplier is no longer active".to_string(),
                        });
                    }
                    continue;
                };

                let lines: Vec<NewPOLine> = group
                    .iter()
                    .map(|s| NewPOLine {
                        suggestion_id: s.id,
                        product_id: s.product_id,
                        qty_ordered: s.order_qty,
                        unit_cost: s
                            .reason
                            .supplier_options
                            .iter()
                            .find(|o| o.supplier_id == supplier_id)
                            .map(|o| o.unit_price)
                            .unwrap_or(supplier.unit_cost),
                    })
                    .collect();

                let expected_delivery_date =
                    Some(Utc::now().date_naive() + chrono::Duration::days(supplier.supplier.lead_time_days as i64));

                let new_po = NewPurchaseOrder {
                    store_id: store_id.to_string(),
                    supplier_id,
                    expected_delivery_date,
                    created_by: None,
                    lines,
                };

                let po_number = self.purchase_orders.next_po_number_in_tx(&mut tx, store_id).await?;
                let (po, po_lines) = self.purchase_orders.create_in_tx(&mut tx, po_number, &new_po).await?;

                for suggestion in &group {
                    self.suggestions
                        .set_status_in_tx(&mut tx, suggestion.id, SuggestionStatus::Ordered)
                        .await?;
                }

                created.push((po, po_lines));
            }
        }

        tx.commit().await?;

        for (po, _) in &created {
            if let Ok(builder) = DomainEvent::builder("purchase_order_created", po.id, "purchase_order", store_id.to_string())
                .data(serde_json::json!({ "po_number": po.po_number, "supplier_id": po.supplier_id }))
            {
                if let Err(err) = self.events.publish(&builder.build()).await {
                    tracing::warn!(%err, "failed to publish purchase_order_created event");
                }
            }
        }

        Ok(ConversionOutcome { created, skipped })
    }
}

fn group_by_supplier(suggestions: &[Suggestion]) -> HashMap<Uuid, Vec<Suggestion>> {
    let mut groups: HashMap<Uuid, Vec<Suggestion>> = HashMap::new();
    for suggestion in suggestions {
        if let Some(supplier_id) = suggestion.supplier_id {
            groups.entry(supplier_id).or_default().push(suggestion.clone());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoverageScenario, DemandPattern, SuggestionReason, TrendDirection, UrgencyLevel};
    use chrono::Utc;

    fn suggestion(supplier_id: Option<Uuid>) -> Suggestion {
        Suggestion {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            store_id: "store-1".to_string(),
            supplier_id,
            status: SuggestionStatus::Pending,
            rop: 10,
            order_qty: 20,
            analysis_period_days: 30,
            stock_duration_days: 5.0,
            urgency: UrgencyLevel::Urgent,
            next_delivery_date: None,
            scenarios: Vec::<CoverageScenario>::new(),
            reason: SuggestionReason {
                pattern: DemandPattern::Steady,
                confidence: 0.8,
                trend: crate::models::Trend { direction: TrendDirection::Steady, slope: 0.0, r2: 0.0 },
                forecasted_daily_demand: 4.0,
                urgency: UrgencyLevel::Urgent,
                action: crate::models::ActionCode::OrderToday,
                message: String::new(),
                supplier_options: Vec::new(),
                savings_vs_max: Decimal::ZERO,
                savings_percent: 0.0,
            },
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_by_supplier_and_drops_unassigned() {
        let supplier_a = Uuid::new_v4();
        let supplier_b = Uuid::new_v4();
        let suggestions = vec![
            suggestion(Some(supplier_a)),
            suggestion(Some(supplier_a)),
            suggestion(Some(supplier_b)),
            suggestion(None),
        ];

        let groups = group_by_supplier(&suggestions);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&supplier_a].len(), 2);
        assert_eq!(groups[&supplier_b].len(), 1);
    }

    #[test]
    fn empty_input_produces_no_groups() {
        assert!(group_by_supplier(&[]).is_empty());
    }
}
