//! Row classification: header-indexed views over raw rows and the routing
//! predicates that decide which aggregation bucket a row feeds.

use crate::model::CellValue;
use std::collections::HashMap;

/// Column headers as they appear in the Amazon bulk export. Matched
/// literally after trimming.
pub mod columns {
    pub const ENTITY: &str = "Entity";
    pub const STATE: &str = "State";
    pub const CAMPAIGN_STATE: &str = "Campaign State (Informational only)";
    pub const CAMPAIGN_ID: &str = "Campaign ID";
    pub const AD_GROUP_ID: &str = "Ad Group ID";
    pub const CAMPAIGN_NAME: &str = "Campaign Name (Informational only)";
    pub const AD_GROUP_NAME: &str = "Ad Group Name (Informational only)";
    pub const PRODUCT_TARGETING_ID: &str = "Product Targeting ID";
    pub const KEYWORD_ID: &str = "Keyword ID";
    pub const PLACEMENT: &str = "Placement";
    pub const PERCENTAGE: &str = "Percentage";
    pub const BID: &str = "Bid";
    pub const DEFAULT_BID: &str = "Ad Group Default Bid (Informational only)";
    pub const TARGETING_EXPRESSION: &str =
        "Resolved Product Targeting Expression (Informational only)";
    pub const CUSTOMER_SEARCH_TERM: &str = "Customer Search Term";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const CLICKS: &str = "Clicks";
    pub const SPEND: &str = "Spend";
    pub const SALES: &str = "Sales";
    pub const UNITS: &str = "Units";
}

const ENTITY_PRODUCT_TARGETING: &str = "Product Targeting";
const ENTITY_KEYWORD: &str = "Keyword";
const ENTITY_BIDDING_ADJUSTMENT: &str = "Bidding Adjustment";
const STATE_ENABLED: &str = "enabled";

/// Column positions for one sheet, built from its header row.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_header_row(cells: &[CellValue]) -> Self {
        let mut positions = HashMap::with_capacity(cells.len());
        for (idx, cell) in cells.iter().enumerate() {
            let name = cell.as_text().trim();
            if !name.is_empty() {
                // First occurrence wins on duplicate headers.
                positions.entry(name.to_string()).or_insert(idx);
            }
        }
        Self { positions }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }
}

/// A data row zipped against its sheet's header index. Lives only as long
/// as the row is being processed.
pub struct RowView<'a> {
    header: &'a HeaderIndex,
    cells: &'a [CellValue],
}

impl<'a> RowView<'a> {
    pub fn new(header: &'a HeaderIndex, cells: &'a [CellValue]) -> Self {
        Self { header, cells }
    }

    pub fn cell(&self, column: &str) -> &CellValue {
        self.header
            .position(column)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&CellValue::Empty)
    }

    pub fn text(&self, column: &str) -> &str {
        self.cell(column).as_text()
    }

    pub fn owned_text(&self, column: &str) -> String {
        self.text(column).to_string()
    }

    /// Missing and non-numeric cells coerce to 0.
    pub fn number(&self, column: &str) -> f64 {
        self.number_opt(column).unwrap_or(0.0)
    }

    pub fn number_opt(&self, column: &str) -> Option<f64> {
        self.cell(column).as_number()
    }
}

/// Which aggregation bucket a campaign-sheet row feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignRowKind {
    ProductTargeting,
    Keyword,
    Placement,
}

/// Routes an enabled campaign row to its bucket. Disabled and irrelevant
/// rows return `None` and are dropped without comment; the export is full
/// of them.
pub fn classify_campaign_row(row: &RowView) -> Option<CampaignRowKind> {
    let entity = row.text(columns::ENTITY);
    match entity {
        ENTITY_PRODUCT_TARGETING if row.text(columns::STATE) == STATE_ENABLED => {
            Some(CampaignRowKind::ProductTargeting)
        }
        ENTITY_KEYWORD if row.text(columns::STATE) == STATE_ENABLED => {
            Some(CampaignRowKind::Keyword)
        }
        ENTITY_BIDDING_ADJUSTMENT
            if row.text(columns::CAMPAIGN_STATE) == STATE_ENABLED =>
        {
            Some(CampaignRowKind::Placement)
        }
        _ => None,
    }
}

/// Every enabled search-term row is a negative-term candidate; the keyword
/// versus product split happens later from the term's shape.
pub fn is_search_term_candidate(row: &RowView) -> bool {
    row.text(columns::CAMPAIGN_STATE) == STATE_ENABLED
}
