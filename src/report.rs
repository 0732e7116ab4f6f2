//! Artifact rendering. All three emitters are pure functions of the final
//! snapshot and deduplicated change list.

use crate::error::EngineError;
use crate::model::{BulkChange, EvaluatedBid, OptimizationSnapshot};
use crate::utils::cell_address;
use chrono::{DateTime, SecondsFormat, Utc};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Action text carried in the log for flagged search terms.
pub const NEGATIVE_ACTION_TEXT: &str =
    "To be added as Negative Search term to avoid wasted ad spend";

const PRODUCT_SPONSORED: &str = "Sponsored Products";

const BULK_UPLOAD_HEADERS: [&str; 13] = [
    "Product",
    "Entity",
    "Operation",
    "Campaign ID",
    "Ad Group ID",
    "Product Targeting ID",
    "Keyword ID",
    "Placement",
    "Bid",
    "Percentage",
    "Keyword Text",
    "Match Type",
    "Product Targeting Expression",
];

enum Field {
    Text(String),
    Number(f64),
    Blank,
}

impl Field {
    fn text(value: &str) -> Self {
        Field::Text(value.to_string())
    }

    fn opt_text(value: &Option<String>) -> Self {
        match value {
            Some(v) => Field::Text(v.clone()),
            None => Field::Blank,
        }
    }

    fn opt_number(value: Option<f64>) -> Self {
        match value {
            Some(v) => Field::Number(v),
            None => Field::Blank,
        }
    }
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) {
    for (idx, header) in headers.iter().enumerate() {
        sheet
            .get_cell_mut(&*cell_address(idx + 1, 1))
            .set_value(*header);
    }
}

fn write_row(sheet: &mut Worksheet, row: usize, fields: &[Field]) {
    for (idx, field) in fields.iter().enumerate() {
        match field {
            Field::Text(value) => {
                sheet
                    .get_cell_mut(&*cell_address(idx + 1, row))
                    .set_value(value);
            }
            Field::Number(value) => {
                sheet
                    .get_cell_mut(&*cell_address(idx + 1, row))
                    .set_value_number(*value);
            }
            Field::Blank => {}
        }
    }
}

fn book_to_bytes(book: &Spreadsheet) -> Result<Vec<u8>, EngineError> {
    let mut buf: Vec<u8> = Vec::new();
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut buf)
        .map_err(|e| EngineError::Render(format!("{e:?}")))?;
    Ok(buf)
}

/// The full audit log: one sheet per category, every record, raw and
/// derived columns side by side, recommendation or not.
pub fn optimization_log(snapshot: &OptimizationSnapshot) -> Result<Vec<u8>, EngineError> {
    let mut book = umya_spreadsheet::new_file();

    {
        let sheet = book
            .get_sheet_by_name_mut("Sheet1")
            .ok_or_else(|| EngineError::Render("default sheet missing".into()))?;
        sheet.set_name("Product Targeting IDs");
        write_bid_sheet(sheet, "Product Targeting ID", &snapshot.product_targeting);
    }

    {
        let sheet = new_sheet(&mut book, "Keyword ID")?;
        write_bid_sheet(sheet, "Keyword ID", &snapshot.keywords);
    }

    {
        let sheet = new_sheet(&mut book, "Placements")?;
        write_header(
            sheet,
            &[
                "Placement",
                "Percentage",
                "Campaign ID",
                "Ad Group ID",
                "Campaign Name",
                "Ad Group Name",
                "Impressions",
                "Clicks",
                "Spend",
                "Sales",
                "Units",
                "ROAS",
                "CPC",
                "Ideal CPC",
                "CPC Deviation",
                "New Percentage",
            ],
        );
        for (idx, entry) in snapshot.placements.iter().enumerate() {
            let r = &entry.record;
            write_row(
                sheet,
                idx + 2,
                &[
                    Field::text(&r.placement),
                    Field::Number(r.percentage),
                    Field::text(&r.campaign_id),
                    Field::text(&r.ad_group_id),
                    Field::text(&r.campaign_name),
                    Field::text(&r.ad_group_name),
                    Field::Number(r.totals.impressions),
                    Field::Number(r.totals.clicks),
                    Field::Number(r.totals.spend),
                    Field::Number(r.totals.sales),
                    Field::Number(r.totals.units),
                    Field::Number(entry.metrics.roas),
                    Field::Number(entry.metrics.cpc),
                    Field::Number(entry.metrics.ideal_cpc),
                    Field::Number(entry.metrics.cpc_deviation),
                    Field::opt_number(entry.new_percentage),
                ],
            );
        }
    }

    {
        let sheet = new_sheet(&mut book, "Negative KWs & Targets")?;
        write_header(
            sheet,
            &[
                "Customer Search Term",
                "Campaign ID",
                "Ad Group ID",
                "Keyword ID",
                "Campaign Name",
                "Ad Group Name",
                "Impressions",
                "Clicks",
                "Spend",
                "Sales",
                "Units",
                "ROAS",
                "CPC",
                "Action",
                "Formatted Term",
            ],
        );
        for (idx, entry) in snapshot.negative_terms.iter().enumerate() {
            let r = &entry.record;
            let action = if entry.flagged {
                Field::text(NEGATIVE_ACTION_TEXT)
            } else {
                Field::Blank
            };
            write_row(
                sheet,
                idx + 2,
                &[
                    Field::text(&r.term),
                    Field::text(&r.campaign_id),
                    Field::text(&r.ad_group_id),
                    Field::opt_text(&r.keyword_id),
                    Field::text(&r.campaign_name),
                    Field::text(&r.ad_group_name),
                    Field::Number(r.totals.impressions),
                    Field::Number(r.totals.clicks),
                    Field::Number(r.totals.spend),
                    Field::Number(r.totals.sales),
                    Field::Number(r.totals.units),
                    Field::Number(entry.metrics.roas),
                    Field::Number(entry.metrics.cpc),
                    action,
                    Field::text(&entry.formatted_term),
                ],
            );
        }
    }

    book_to_bytes(&book)
}

/// The bulk-operations workbook the ad platform imports: single sheet,
/// fixed column order, recommendation rows only.
pub fn bulk_upload(changes: &[BulkChange]) -> Result<Vec<u8>, EngineError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| EngineError::Render("default sheet missing".into()))?;
    sheet.set_name("Sponsored Products Campaigns");
    write_header(sheet, &BULK_UPLOAD_HEADERS);

    for (idx, change) in changes.iter().enumerate() {
        write_row(
            sheet,
            idx + 2,
            &[
                Field::text(PRODUCT_SPONSORED),
                Field::text(change.entity.as_str()),
                Field::text(change.operation.as_str()),
                Field::text(&change.campaign_id),
                Field::text(&change.ad_group_id),
                Field::opt_text(&change.product_targeting_id),
                Field::opt_text(&change.keyword_id),
                Field::opt_text(&change.placement),
                Field::opt_number(change.bid),
                Field::opt_number(change.percentage),
                Field::opt_text(&change.keyword_text),
                Field::opt_text(&change.match_type),
                Field::opt_text(&change.targeting_expression),
            ],
        );
    }

    book_to_bytes(&book)
}

fn new_sheet<'a>(book: &'a mut Spreadsheet, title: &str) -> Result<&'a mut Worksheet, EngineError> {
    book.new_sheet(title)
        .map_err(|e| EngineError::Render(format!("failed to create sheet {title:?}: {e}")))
}

fn write_bid_sheet(sheet: &mut Worksheet, id_header: &str, entries: &[EvaluatedBid]) {
    write_header(
        sheet,
        &[
            id_header,
            "Campaign ID",
            "Ad Group ID",
            "Campaign Name",
            "Ad Group Name",
            "Targeting Expression",
            "Bid",
            "Ad Group Default Bid",
            "Impressions",
            "Clicks",
            "Spend",
            "Sales",
            "Units",
            "ROAS",
            "CPC",
            "Ideal CPC",
            "CPC Deviation",
            "New Bid",
        ],
    );
    for (idx, entry) in entries.iter().enumerate() {
        let r = &entry.record;
        write_row(
            sheet,
            idx + 2,
            &[
                Field::text(&r.id),
                Field::text(&r.campaign_id),
                Field::text(&r.ad_group_id),
                Field::text(&r.campaign_name),
                Field::text(&r.ad_group_name),
                Field::text(&r.targeting_expression),
                Field::Number(r.bid),
                Field::Number(r.default_bid),
                Field::Number(r.totals.impressions),
                Field::Number(r.totals.clicks),
                Field::Number(r.totals.spend),
                Field::Number(r.totals.sales),
                Field::Number(r.totals.units),
                Field::Number(entry.metrics.roas),
                Field::Number(entry.metrics.cpc),
                Field::Number(entry.metrics.ideal_cpc),
                Field::Number(entry.metrics.cpc_deviation),
                Field::opt_number(entry.new_bid),
            ],
        );
    }
}

/// Narrative impact summary. Savings are the spend delta implied by the
/// recommended bid changes at observed click volume; flagged search terms
/// contribute their accumulated spend as avoidable waste.
pub fn impact_report(snapshot: &OptimizationSnapshot, generated_at: DateTime<Utc>) -> String {
    let bid_entries = |entries: &[EvaluatedBid]| -> (usize, f64) {
        let mut count = 0usize;
        let mut savings = 0.0f64;
        for entry in entries {
            if let Some(new_bid) = entry.new_bid {
                count += 1;
                savings += (entry.record.bid - new_bid) * entry.record.totals.clicks;
            }
        }
        (count, savings)
    };

    let (pt_count, pt_savings) = bid_entries(&snapshot.product_targeting);
    let (kw_count, kw_savings) = bid_entries(&snapshot.keywords);
    let placement_count = snapshot
        .placements
        .iter()
        .filter(|p| p.new_percentage.is_some())
        .count();
    let flagged: Vec<_> = snapshot.negative_terms.iter().filter(|t| t.flagged).collect();
    let flagged_spend: f64 = flagged.iter().map(|t| t.record.totals.spend).sum();
    let total_savings = pt_savings + kw_savings + flagged_spend;

    let mut report = String::new();
    report.push_str("# Impact Report\n\n");
    report.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    report.push_str("## Opportunities\n\n");
    report.push_str(&format!(
        "- {pt_count} product targeting bid changes, estimated savings ${pt_savings:.2}\n"
    ));
    report.push_str(&format!(
        "- {kw_count} keyword bid changes, estimated savings ${kw_savings:.2}\n"
    ));
    report.push_str(&format!(
        "- {placement_count} placement adjustment changes\n"
    ));
    report.push_str(&format!(
        "- {} search terms flagged for negative targeting, ${flagged_spend:.2} of spend without conversions\n\n",
        flagged.len()
    ));
    report.push_str(&format!(
        "Estimated total recoverable ad spend: ${total_savings:.2}\n"
    ));
    report
}
