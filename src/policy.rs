//! The bid policy engine. Deterministic, side-effect free: each closed
//! aggregate record maps to at most one recommendation from its own totals
//! plus the policy settings.
//!
//! The deviation between actual and ideal cost-per-click is the signal.
//! Negative deviation (paying more per click than the margin supports)
//! cuts the bid proportionally, floored at the platform's minimum viable
//! bid. Positive deviation (room to spend) raises the bid by a small step
//! whose size grows with conversion volume, because more units sold means
//! more confidence the extra spend converts. Zero deviation is no signal
//! and never moves a bid.

use crate::config::PolicySettings;
use crate::model::{
    Aggregates, BidRecord, BulkChange, BulkEntity, BulkOperation, DerivedMetrics, EvaluatedBid,
    EvaluatedPlacement, EvaluatedTerm, OptimizationSnapshot, TrafficTotals,
};

/// Search terms with at least this many clicks and no conversions get
/// flagged for negative targeting.
const NEGATIVE_CLICK_THRESHOLD: f64 = 10.0;

/// ASIN-shaped search terms start with this prefix (case-insensitive).
const ASIN_PREFIX: &str = "b0";

/// Derived metrics with the explicit zero-denominator convention: every
/// ratio is 0 when its denominator is 0, so `cpc_deviation == 0.0` always
/// reads as "no signal" and nothing downstream ever sees NaN or infinity.
pub fn derive_metrics(totals: &TrafficTotals, settings: &PolicySettings) -> DerivedMetrics {
    let roas = if totals.spend > 0.0 {
        totals.sales / totals.spend
    } else {
        0.0
    };
    let cpc = if totals.clicks > 0.0 {
        totals.spend / totals.clicks
    } else {
        0.0
    };
    let ideal_cpc = if totals.clicks > 0.0 {
        (totals.sales * settings.target_margin) / totals.clicks
    } else {
        0.0
    };
    let cpc_deviation = if cpc > 0.0 { (ideal_cpc - cpc) / cpc } else { 0.0 };
    DerivedMetrics {
        roas,
        cpc,
        ideal_cpc,
        cpc_deviation,
    }
}

/// Bid rule shared by keywords and product targets.
///
/// Overspending (negative deviation) with enough volume evidence (> 3
/// units) cuts the bid by the overshoot, floored at `min_bid`. Underspending
/// raises it by a volume-tiered step. Records with no usable base bid never
/// produce a change.
pub fn bid_adjustment(
    bid: f64,
    metrics: &DerivedMetrics,
    units: f64,
    settings: &PolicySettings,
) -> Option<f64> {
    if bid <= 0.0 {
        return None;
    }
    let deviation = metrics.cpc_deviation;
    if deviation < 0.0 && units > 3.0 {
        return Some((bid + bid * deviation).max(settings.min_bid));
    }
    if deviation > 0.0 {
        if (10.0..=50.0).contains(&units) {
            return Some(bid * 1.0075);
        }
        if units > 50.0 && units <= 100.0 {
            return Some(bid * 1.01);
        }
        if units > 100.0 {
            return Some(bid * 1.02);
        }
    }
    None
}

/// Placement rule: acts on the bid-adjustment percentage instead of an
/// absolute bid, only ever upward, with finer volume tiers and the
/// platform's hard percentage ceiling.
///
/// A placement with no existing adjustment (percentage 0) has nothing to
/// scale, so the new value is synthesized directly from the deviation: a
/// bootstrap, not an edge case of the scaling branch.
pub fn placement_adjustment(
    percentage: f64,
    metrics: &DerivedMetrics,
    units: f64,
    settings: &PolicySettings,
) -> Option<f64> {
    let deviation = metrics.cpc_deviation;
    if deviation <= 0.0 {
        return None;
    }
    let divisor = if (3.0..=10.0).contains(&units) {
        5.0
    } else if units > 10.0 && units <= 30.0 {
        4.0
    } else if units > 30.0 && units <= 50.0 {
        3.0
    } else if units > 50.0 {
        2.0
    } else {
        return None;
    };
    let raw = if percentage != 0.0 {
        percentage + percentage * (deviation / divisor)
    } else {
        (deviation * 100.0) / divisor
    };
    Some(raw.min(settings.max_placement_percentage).max(settings.min_bid))
}

/// Clicks without conversions: flag the term for negative targeting.
pub fn should_flag_negative(totals: &TrafficTotals) -> bool {
    totals.clicks >= NEGATIVE_CLICK_THRESHOLD && totals.units < 1.0
}

pub fn is_product_term(term: &str) -> bool {
    term.to_lowercase().starts_with(ASIN_PREFIX)
}

/// Product terms render as a targeting expression, keyword terms stay
/// literal text.
pub fn format_term(term: &str) -> String {
    if is_product_term(term) {
        format!("asin=\"{term}\"")
    } else {
        term.to_string()
    }
}

/// Evaluates every closed record, producing the snapshot the emitters
/// consume. Records pass through in aggregation order, with or without a
/// recommendation.
pub fn evaluate(aggregates: Aggregates, settings: &PolicySettings) -> OptimizationSnapshot {
    let evaluate_bid = |record: BidRecord| {
        let metrics = derive_metrics(&record.totals, settings);
        let new_bid = bid_adjustment(record.bid, &metrics, record.totals.units, settings);
        EvaluatedBid {
            record,
            metrics,
            new_bid,
        }
    };

    let product_targeting = aggregates
        .product_targeting
        .into_values()
        .map(evaluate_bid)
        .collect();
    let keywords = aggregates
        .keywords
        .into_values()
        .map(evaluate_bid)
        .collect();

    let placements = aggregates
        .placements
        .into_values()
        .map(|record| {
            let metrics = derive_metrics(&record.totals, settings);
            let new_percentage =
                placement_adjustment(record.percentage, &metrics, record.totals.units, settings);
            EvaluatedPlacement {
                record,
                metrics,
                new_percentage,
            }
        })
        .collect();

    let negative_terms = aggregates
        .negative_terms
        .into_values()
        .map(|record| {
            let metrics = derive_metrics(&record.totals, settings);
            let flagged = should_flag_negative(&record.totals);
            let is_product = is_product_term(&record.term);
            let formatted_term = format_term(&record.term);
            EvaluatedTerm {
                record,
                metrics,
                flagged,
                is_product_term: is_product,
                formatted_term,
            }
        })
        .collect();

    OptimizationSnapshot {
        product_targeting,
        keywords,
        placements,
        negative_terms,
    }
}

/// Projects the snapshot's recommendations into bulk-upload changes. The
/// entity label and operation fall out of which record variant and policy
/// branch produced the recommendation.
pub fn bulk_changes(snapshot: &OptimizationSnapshot) -> Vec<BulkChange> {
    let mut changes = Vec::new();

    for entry in &snapshot.product_targeting {
        if let Some(new_bid) = entry.new_bid {
            changes.push(BulkChange {
                entity: BulkEntity::ProductTargeting,
                operation: BulkOperation::Update,
                campaign_id: entry.record.campaign_id.clone(),
                ad_group_id: entry.record.ad_group_id.clone(),
                product_targeting_id: Some(entry.record.id.clone()),
                keyword_id: None,
                placement: None,
                bid: Some(new_bid),
                percentage: None,
                keyword_text: None,
                match_type: None,
                targeting_expression: None,
            });
        }
    }

    for entry in &snapshot.keywords {
        if let Some(new_bid) = entry.new_bid {
            changes.push(BulkChange {
                entity: BulkEntity::Keyword,
                operation: BulkOperation::Update,
                campaign_id: entry.record.campaign_id.clone(),
                ad_group_id: entry.record.ad_group_id.clone(),
                product_targeting_id: None,
                keyword_id: Some(entry.record.id.clone()),
                placement: None,
                bid: Some(new_bid),
                percentage: None,
                keyword_text: None,
                match_type: None,
                targeting_expression: None,
            });
        }
    }

    for entry in &snapshot.placements {
        if let Some(new_percentage) = entry.new_percentage {
            changes.push(BulkChange {
                entity: BulkEntity::BiddingAdjustment,
                operation: BulkOperation::Update,
                campaign_id: entry.record.campaign_id.clone(),
                ad_group_id: entry.record.ad_group_id.clone(),
                product_targeting_id: None,
                keyword_id: None,
                placement: Some(entry.record.placement.clone()),
                bid: None,
                percentage: Some(new_percentage),
                keyword_text: None,
                match_type: None,
                targeting_expression: None,
            });
        }
    }

    for entry in &snapshot.negative_terms {
        if !entry.flagged {
            continue;
        }
        if entry.is_product_term {
            changes.push(BulkChange {
                entity: BulkEntity::NegativeProductTargeting,
                operation: BulkOperation::Add,
                campaign_id: entry.record.campaign_id.clone(),
                ad_group_id: entry.record.ad_group_id.clone(),
                product_targeting_id: None,
                keyword_id: None,
                placement: None,
                bid: None,
                percentage: None,
                keyword_text: None,
                match_type: None,
                targeting_expression: Some(entry.formatted_term.clone()),
            });
        } else {
            changes.push(BulkChange {
                entity: BulkEntity::NegativeKeyword,
                operation: BulkOperation::Add,
                campaign_id: entry.record.campaign_id.clone(),
                ad_group_id: entry.record.ad_group_id.clone(),
                product_targeting_id: None,
                keyword_id: None,
                placement: None,
                bid: None,
                percentage: None,
                keyword_text: Some(entry.record.term.clone()),
                match_type: Some("negativeExact".to_string()),
                targeting_expression: None,
            });
        }
    }

    changes
}
