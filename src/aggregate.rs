//! Aggregation: collapses many export rows into one record per entity key.
//!
//! Upsert semantics: the first row seen for a key supplies the static
//! fields (ids, names, bid, expression); every row, first included, adds
//! its traffic numbers into the running totals. Accumulation is commutative
//! so row order never changes the totals; it only decides which row's
//! static fields win, and first-seen-wins is the intended behavior.

use crate::classify::{CampaignRowKind, RowView, columns};
use crate::model::{Aggregates, BidRecord, PlacementRecord, SearchTermRecord, TrafficTotals};

#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: Aggregates,
    rows_ingested: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_ingested(&self) -> u64 {
        self.rows_ingested
    }

    pub fn ingest_campaign_row(&mut self, kind: CampaignRowKind, row: &RowView) {
        match kind {
            CampaignRowKind::ProductTargeting => {
                self.upsert_bid_record(kind, row, columns::PRODUCT_TARGETING_ID)
            }
            CampaignRowKind::Keyword => self.upsert_bid_record(kind, row, columns::KEYWORD_ID),
            CampaignRowKind::Placement => self.upsert_placement(row),
        }
        self.rows_ingested += 1;
    }

    pub fn ingest_search_term_row(&mut self, row: &RowView) {
        let term = row.owned_text(columns::CUSTOMER_SEARCH_TERM);
        let record = self
            .buckets
            .negative_terms
            .entry(term.clone())
            .or_insert_with(|| SearchTermRecord {
                term,
                campaign_id: row.owned_text(columns::CAMPAIGN_ID),
                ad_group_id: row.owned_text(columns::AD_GROUP_ID),
                keyword_id: non_empty(row.text(columns::KEYWORD_ID)),
                campaign_name: row.owned_text(columns::CAMPAIGN_NAME),
                ad_group_name: row.owned_text(columns::AD_GROUP_NAME),
                totals: TrafficTotals::default(),
            });
        record.totals.accumulate(&row_totals(row));
        self.rows_ingested += 1;
    }

    pub fn finish(self) -> Aggregates {
        self.buckets
    }

    fn upsert_bid_record(&mut self, kind: CampaignRowKind, row: &RowView, key_column: &str) {
        let key = row.owned_text(key_column);
        let bucket = match kind {
            CampaignRowKind::ProductTargeting => &mut self.buckets.product_targeting,
            CampaignRowKind::Keyword => &mut self.buckets.keywords,
            CampaignRowKind::Placement => unreachable!("placements use upsert_placement"),
        };
        let record = bucket.entry(key.clone()).or_insert_with(|| {
            let default_bid = row.number(columns::DEFAULT_BID);
            BidRecord {
                id: key,
                campaign_id: row.owned_text(columns::CAMPAIGN_ID),
                ad_group_id: row.owned_text(columns::AD_GROUP_ID),
                bid: resolve_bid(row.number_opt(columns::BID), default_bid),
                default_bid,
                campaign_name: row.owned_text(columns::CAMPAIGN_NAME),
                ad_group_name: row.owned_text(columns::AD_GROUP_NAME),
                targeting_expression: row.owned_text(columns::TARGETING_EXPRESSION),
                totals: TrafficTotals::default(),
            }
        });
        record.totals.accumulate(&row_totals(row));
    }

    fn upsert_placement(&mut self, row: &RowView) {
        let key = row.owned_text(columns::PLACEMENT);
        let record = self
            .buckets
            .placements
            .entry(key.clone())
            .or_insert_with(|| PlacementRecord {
                placement: key,
                percentage: row.number(columns::PERCENTAGE),
                campaign_id: row.owned_text(columns::CAMPAIGN_ID),
                ad_group_id: row.owned_text(columns::AD_GROUP_ID),
                campaign_name: row.owned_text(columns::CAMPAIGN_NAME),
                ad_group_name: row.owned_text(columns::AD_GROUP_NAME),
                totals: TrafficTotals::default(),
            });
        record.totals.accumulate(&row_totals(row));
    }
}

/// Blank and zero bids fall back to the ad group default bid.
fn resolve_bid(bid: Option<f64>, default_bid: f64) -> f64 {
    match bid {
        Some(b) if b != 0.0 => b,
        _ => default_bid,
    }
}

fn row_totals(row: &RowView) -> TrafficTotals {
    TrafficTotals {
        impressions: row.number(columns::IMPRESSIONS),
        clicks: row.number(columns::CLICKS),
        spend: row.number(columns::SPEND),
        sales: row.number(columns::SALES),
        units: row.number(columns::UNITS),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
