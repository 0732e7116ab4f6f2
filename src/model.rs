//! Data model for one optimization run: raw cell values, aggregate records
//! per entity category, policy output, bulk-upload changes, and the wire
//! types returned by the HTTP surface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell as seen by the row pipeline. Formula results arrive as
/// plain values in the export, so there is no formula variant.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_text(&self) -> &str {
        match self {
            CellValue::Text(s) => s.as_str(),
            _ => "",
        }
    }

    /// Numeric view with the coercion the aggregator relies on: missing or
    /// non-numeric cells read as `None`, numeric text parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Running traffic totals shared by every aggregate record. Accumulation is
/// commutative; the totals are frozen once aggregation closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrafficTotals {
    pub impressions: f64,
    pub clicks: f64,
    pub spend: f64,
    pub sales: f64,
    pub units: f64,
}

impl TrafficTotals {
    pub fn accumulate(&mut self, other: &TrafficTotals) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.spend += other.spend;
        self.sales += other.sales;
        self.units += other.units;
    }
}

/// One keyword or product-targeting entity, keyed by its platform id.
/// Static fields are captured from the first contributing row.
#[derive(Debug, Clone, Serialize)]
pub struct BidRecord {
    pub id: String,
    pub campaign_id: String,
    pub ad_group_id: String,
    /// Resolved base bid: the row's own bid, falling back to the ad group
    /// default when the bid cell is blank or zero.
    pub bid: f64,
    pub default_bid: f64,
    pub campaign_name: String,
    pub ad_group_name: String,
    pub targeting_expression: String,
    pub totals: TrafficTotals,
}

/// One placement (bidding-adjustment) line, keyed by placement name.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementRecord {
    pub placement: String,
    /// Current placement bid-adjustment percentage.
    pub percentage: f64,
    pub campaign_id: String,
    pub ad_group_id: String,
    pub campaign_name: String,
    pub ad_group_name: String,
    pub totals: TrafficTotals,
}

/// One customer search term from the search-term report, keyed by the term
/// itself (case preserved for display).
#[derive(Debug, Clone, Serialize)]
pub struct SearchTermRecord {
    pub term: String,
    pub campaign_id: String,
    pub ad_group_id: String,
    pub keyword_id: Option<String>,
    pub campaign_name: String,
    pub ad_group_name: String,
    pub totals: TrafficTotals,
}

/// The four closed aggregation buckets, insertion-ordered.
#[derive(Debug, Default)]
pub struct Aggregates {
    pub product_targeting: IndexMap<String, BidRecord>,
    pub keywords: IndexMap<String, BidRecord>,
    pub placements: IndexMap<String, PlacementRecord>,
    pub negative_terms: IndexMap<String, SearchTermRecord>,
}

/// Advertising metrics derived once per record after aggregation closes.
/// Every ratio is defined as 0 when its denominator is 0; a deviation of
/// exactly 0 means "no signal" and triggers no policy branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub roas: f64,
    pub cpc: f64,
    pub ideal_cpc: f64,
    pub cpc_deviation: f64,
}

/// A keyword/targeting record together with its policy verdict.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedBid {
    pub record: BidRecord,
    pub metrics: DerivedMetrics,
    pub new_bid: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedPlacement {
    pub record: PlacementRecord,
    pub metrics: DerivedMetrics,
    pub new_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedTerm {
    pub record: SearchTermRecord,
    pub metrics: DerivedMetrics,
    /// Set when the term met the wasted-spend threshold.
    pub flagged: bool,
    /// ASIN-shaped term, targeted as a product rather than a keyword.
    pub is_product_term: bool,
    /// `asin="<term>"` for product terms, the literal term otherwise.
    pub formatted_term: String,
}

/// Everything the emitters need: all evaluated records, in aggregation
/// order, recommendations included and not. Read-only from here on.
#[derive(Debug, Default)]
pub struct OptimizationSnapshot {
    pub product_targeting: Vec<EvaluatedBid>,
    pub keywords: Vec<EvaluatedBid>,
    pub placements: Vec<EvaluatedPlacement>,
    pub negative_terms: Vec<EvaluatedTerm>,
}

/// Entity label in the bulk-operations sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkEntity {
    ProductTargeting,
    Keyword,
    BiddingAdjustment,
    NegativeKeyword,
    NegativeProductTargeting,
}

impl BulkEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkEntity::ProductTargeting => "Product Targeting",
            BulkEntity::Keyword => "Keyword",
            BulkEntity::BiddingAdjustment => "Bidding Adjustment",
            BulkEntity::NegativeKeyword => "Negative Keyword",
            BulkEntity::NegativeProductTargeting => "Negative Product Targeting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    /// Bid or percentage change on an existing target.
    Update,
    /// New negative keyword / negative product target.
    Add,
}

impl BulkOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOperation::Update => "Update",
            BulkOperation::Add => "Add",
        }
    }
}

/// One row of the bulk-upload sheet. Only fields relevant to the entity are
/// populated; the rest render as blank cells.
#[derive(Debug, Clone, Serialize)]
pub struct BulkChange {
    pub entity: BulkEntity,
    pub operation: BulkOperation,
    pub campaign_id: String,
    pub ad_group_id: String,
    pub product_targeting_id: Option<String>,
    pub keyword_id: Option<String>,
    pub placement: Option<String>,
    pub bid: Option<f64>,
    pub percentage: Option<f64>,
    pub keyword_text: Option<String>,
    pub match_type: Option<String>,
    pub targeting_expression: Option<String>,
}

/// The binary artifacts of a completed run.
pub struct RunArtifacts {
    pub optimization_log: Vec<u8>,
    pub bulk_upload: Vec<u8>,
    pub impact_report: Option<Vec<u8>>,
}

// =============================================================================
// HTTP wire types
// =============================================================================

pub const OPTIMIZATION_LOG_FILE: &str = "Optimization_Log.xlsx";
pub const BULK_UPLOAD_FILE: &str = "Amazon_Upload.xlsx";
pub const IMPACT_REPORT_FILE: &str = "Impact_Report.md";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub run_id: String,
    pub message: String,
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineArtifacts>,
}

/// Base64 `data:` URLs for callers that want the artifacts in the response
/// body instead of a download round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineArtifacts {
    pub optimization_log: String,
    pub bulk_upload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_report: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
