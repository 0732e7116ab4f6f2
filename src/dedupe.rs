//! Collapses logically identical bulk changes before emission. The same
//! change can be reachable through more than one row path (a search term
//! matched both by text and by its associated keyword id, for example);
//! only the first occurrence survives, in original order.

use crate::model::BulkChange;
use std::collections::HashSet;

type CompositeKey = (
    &'static str,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<u64>,
);

fn composite_key(change: &BulkChange) -> CompositeKey {
    (
        change.entity.as_str(),
        change.campaign_id.clone(),
        change.ad_group_id.clone(),
        change.product_targeting_id.clone(),
        change.keyword_id.clone(),
        change.placement.clone(),
        change.keyword_text.clone(),
        change.targeting_expression.clone(),
        // Percentage participates in identity; bit pattern keeps the key
        // hashable without rounding surprises.
        change.percentage.map(f64::to_bits),
    )
}

pub fn dedupe(changes: Vec<BulkChange>) -> Vec<BulkChange> {
    let mut seen: HashSet<CompositeKey> = HashSet::with_capacity(changes.len());
    changes
        .into_iter()
        .filter(|change| seen.insert(composite_key(change)))
        .collect()
}
