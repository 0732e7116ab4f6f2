//! In-memory workbook fixtures: build an Amazon-style bulk export with
//! umya, serialize it to bytes, feed it to the engine.

#![allow(dead_code)]

use umya_spreadsheet::Worksheet;

#[derive(Debug, Clone)]
pub enum V {
    S(String),
    N(f64),
    Blank,
}

pub fn s(value: &str) -> V {
    V::S(value.to_string())
}

pub fn n(value: f64) -> V {
    V::N(value)
}

/// Column positions in the campaigns fixture sheet.
pub mod campaign_col {
    pub const ENTITY: usize = 0;
    pub const STATE: usize = 1;
    pub const CAMPAIGN_STATE: usize = 2;
    pub const CAMPAIGN_ID: usize = 3;
    pub const AD_GROUP_ID: usize = 4;
    pub const CAMPAIGN_NAME: usize = 5;
    pub const AD_GROUP_NAME: usize = 6;
    pub const PRODUCT_TARGETING_ID: usize = 7;
    pub const KEYWORD_ID: usize = 8;
    pub const PLACEMENT: usize = 9;
    pub const PERCENTAGE: usize = 10;
    pub const BID: usize = 11;
    pub const DEFAULT_BID: usize = 12;
    pub const TARGETING_EXPRESSION: usize = 13;
    pub const IMPRESSIONS: usize = 14;
    pub const CLICKS: usize = 15;
    pub const SPEND: usize = 16;
    pub const SALES: usize = 17;
    pub const UNITS: usize = 18;
}

/// Column positions in the search-term fixture sheet.
pub mod term_col {
    pub const TERM: usize = 0;
    pub const CAMPAIGN_STATE: usize = 1;
    pub const CAMPAIGN_ID: usize = 2;
    pub const AD_GROUP_ID: usize = 3;
    pub const KEYWORD_ID: usize = 4;
    pub const CAMPAIGN_NAME: usize = 5;
    pub const AD_GROUP_NAME: usize = 6;
    pub const IMPRESSIONS: usize = 7;
    pub const CLICKS: usize = 8;
    pub const SPEND: usize = 9;
    pub const SALES: usize = 10;
    pub const UNITS: usize = 11;
}

pub const CAMPAIGN_HEADERS: [&str; 19] = [
    "Entity",
    "State",
    "Campaign State (Informational only)",
    "Campaign ID",
    "Ad Group ID",
    "Campaign Name (Informational only)",
    "Ad Group Name (Informational only)",
    "Product Targeting ID",
    "Keyword ID",
    "Placement",
    "Percentage",
    "Bid",
    "Ad Group Default Bid (Informational only)",
    "Resolved Product Targeting Expression (Informational only)",
    "Impressions",
    "Clicks",
    "Spend",
    "Sales",
    "Units",
];

pub const TERM_HEADERS: [&str; 12] = [
    "Customer Search Term",
    "Campaign State (Informational only)",
    "Campaign ID",
    "Ad Group ID",
    "Keyword ID",
    "Campaign Name (Informational only)",
    "Ad Group Name (Informational only)",
    "Impressions",
    "Clicks",
    "Spend",
    "Sales",
    "Units",
];

pub struct WorkbookBuilder {
    campaigns: Vec<Vec<V>>,
    terms: Vec<Vec<V>>,
    campaigns_title: Option<String>,
    terms_title: Option<String>,
}

impl Default for WorkbookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            campaigns: Vec::new(),
            terms: Vec::new(),
            campaigns_title: Some("Sponsored Products Campaigns".to_string()),
            terms_title: Some("SP Search Term Report".to_string()),
        }
    }

    pub fn campaigns_title(mut self, title: &str) -> Self {
        self.campaigns_title = Some(title.to_string());
        self
    }

    pub fn without_terms_sheet(mut self) -> Self {
        self.terms_title = None;
        self
    }

    pub fn without_campaigns_sheet(mut self) -> Self {
        self.campaigns_title = None;
        self
    }

    pub fn campaign_row(mut self, row: Vec<V>) -> Self {
        self.campaigns.push(row);
        self
    }

    pub fn term_row(mut self, row: Vec<V>) -> Self {
        self.terms.push(row);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut book = umya_spreadsheet::new_file();
        let mut renamed_default = false;

        if let Some(title) = &self.campaigns_title {
            let sheet = book
                .get_sheet_by_name_mut("Sheet1")
                .expect("default sheet");
            sheet.set_name(title.as_str());
            renamed_default = true;
            fill_sheet(sheet, &CAMPAIGN_HEADERS, &self.campaigns);
        }

        if let Some(title) = &self.terms_title {
            let sheet = if renamed_default {
                book.new_sheet(title.as_str()).expect("term sheet")
            } else {
                let sheet = book
                    .get_sheet_by_name_mut("Sheet1")
                    .expect("default sheet");
                sheet.set_name(title.as_str());
                sheet
            };
            fill_sheet(sheet, &TERM_HEADERS, &self.terms);
        }

        let mut buf: Vec<u8> = Vec::new();
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).expect("write workbook");
        buf
    }
}

fn fill_sheet(sheet: &mut Worksheet, headers: &[&str], rows: &[Vec<V>]) {
    for (idx, header) in headers.iter().enumerate() {
        sheet
            .get_cell_mut(&*cell_address(idx + 1, 1))
            .set_value(*header);
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            match value {
                V::S(text) => {
                    sheet
                        .get_cell_mut(&*cell_address(col_idx + 1, row_idx + 2))
                        .set_value(text);
                }
                V::N(num) => {
                    sheet
                        .get_cell_mut(&*cell_address(col_idx + 1, row_idx + 2))
                        .set_value_number(*num);
                }
                V::Blank => {}
            }
        }
    }
}

fn cell_address(column: usize, row: usize) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    format!("{name}{row}")
}

fn blank_row(len: usize) -> Vec<V> {
    (0..len).map(|_| V::Blank).collect()
}

/// Enabled keyword row with the given id, bid, and traffic.
pub fn keyword_row(
    id: &str,
    bid: f64,
    impressions: f64,
    clicks: f64,
    spend: f64,
    sales: f64,
    units: f64,
) -> Vec<V> {
    let mut row = blank_row(CAMPAIGN_HEADERS.len());
    row[campaign_col::ENTITY] = s("Keyword");
    row[campaign_col::STATE] = s("enabled");
    row[campaign_col::CAMPAIGN_STATE] = s("enabled");
    row[campaign_col::CAMPAIGN_ID] = s("C1");
    row[campaign_col::AD_GROUP_ID] = s("AG1");
    row[campaign_col::CAMPAIGN_NAME] = s("Campaign One");
    row[campaign_col::AD_GROUP_NAME] = s("Ad Group One");
    row[campaign_col::KEYWORD_ID] = s(id);
    row[campaign_col::BID] = n(bid);
    row[campaign_col::DEFAULT_BID] = n(0.5);
    row[campaign_col::IMPRESSIONS] = n(impressions);
    row[campaign_col::CLICKS] = n(clicks);
    row[campaign_col::SPEND] = n(spend);
    row[campaign_col::SALES] = n(sales);
    row[campaign_col::UNITS] = n(units);
    row
}

/// Enabled product targeting row.
pub fn product_targeting_row(
    id: &str,
    bid: f64,
    impressions: f64,
    clicks: f64,
    spend: f64,
    sales: f64,
    units: f64,
) -> Vec<V> {
    let mut row = blank_row(CAMPAIGN_HEADERS.len());
    row[campaign_col::ENTITY] = s("Product Targeting");
    row[campaign_col::STATE] = s("enabled");
    row[campaign_col::CAMPAIGN_STATE] = s("enabled");
    row[campaign_col::CAMPAIGN_ID] = s("C1");
    row[campaign_col::AD_GROUP_ID] = s("AG1");
    row[campaign_col::CAMPAIGN_NAME] = s("Campaign One");
    row[campaign_col::AD_GROUP_NAME] = s("Ad Group One");
    row[campaign_col::PRODUCT_TARGETING_ID] = s(id);
    row[campaign_col::TARGETING_EXPRESSION] = s("asin-expanded=\"B0EXAMPLE01\"");
    row[campaign_col::BID] = n(bid);
    row[campaign_col::DEFAULT_BID] = n(0.5);
    row[campaign_col::IMPRESSIONS] = n(impressions);
    row[campaign_col::CLICKS] = n(clicks);
    row[campaign_col::SPEND] = n(spend);
    row[campaign_col::SALES] = n(sales);
    row[campaign_col::UNITS] = n(units);
    row
}

/// Enabled bidding-adjustment row.
pub fn placement_row(
    placement: &str,
    percentage: f64,
    clicks: f64,
    spend: f64,
    sales: f64,
    units: f64,
) -> Vec<V> {
    let mut row = blank_row(CAMPAIGN_HEADERS.len());
    row[campaign_col::ENTITY] = s("Bidding Adjustment");
    row[campaign_col::CAMPAIGN_STATE] = s("enabled");
    row[campaign_col::CAMPAIGN_ID] = s("C1");
    row[campaign_col::CAMPAIGN_NAME] = s("Campaign One");
    row[campaign_col::PLACEMENT] = s(placement);
    row[campaign_col::PERCENTAGE] = n(percentage);
    row[campaign_col::IMPRESSIONS] = n(1000.0);
    row[campaign_col::CLICKS] = n(clicks);
    row[campaign_col::SPEND] = n(spend);
    row[campaign_col::SALES] = n(sales);
    row[campaign_col::UNITS] = n(units);
    row
}

/// Enabled search-term row.
pub fn search_term_row(term: &str, clicks: f64, spend: f64, sales: f64, units: f64) -> Vec<V> {
    let mut row = blank_row(TERM_HEADERS.len());
    row[term_col::TERM] = s(term);
    row[term_col::CAMPAIGN_STATE] = s("enabled");
    row[term_col::CAMPAIGN_ID] = s("C1");
    row[term_col::AD_GROUP_ID] = s("AG1");
    row[term_col::CAMPAIGN_NAME] = s("Campaign One");
    row[term_col::AD_GROUP_NAME] = s("Ad Group One");
    row[term_col::IMPRESSIONS] = n(500.0);
    row[term_col::CLICKS] = n(clicks);
    row[term_col::SPEND] = n(spend);
    row[term_col::SALES] = n(sales);
    row[term_col::UNITS] = n(units);
    row
}
