//! The single-shot optimization pipeline: reader, classifier, aggregator,
//! policy engine, deduplicator, emitters. One pass over the payload, no
//! shared state between invocations, one terminal error or all artifacts.

use crate::aggregate::Aggregator;
use crate::classify::{HeaderIndex, RowView, classify_campaign_row, is_search_term_candidate};
use crate::config::{EngineSettings, SheetPolicy};
use crate::dedupe::dedupe;
use crate::error::EngineError;
use crate::model::{CellValue, RunArtifacts};
use crate::reader::{CAMPAIGNS_SHEET, SEARCH_TERMS_SHEET, WorkbookReader};
use crate::{policy, report};
use chrono::Utc;
use tracing::{debug, info};

/// Runs the whole transform on an uploaded workbook payload.
pub fn optimize(payload: Vec<u8>, settings: &EngineSettings) -> Result<RunArtifacts, EngineError> {
    let mut reader = WorkbookReader::from_bytes(payload)?;
    let mut aggregator = Aggregator::new();

    stream_sheet(&mut reader, CAMPAIGNS_SHEET, settings.sheet_policy, |row| {
        if let Some(kind) = classify_campaign_row(row) {
            aggregator.ingest_campaign_row(kind, row);
        }
    })?;

    stream_sheet(&mut reader, SEARCH_TERMS_SHEET, settings.sheet_policy, |row| {
        if is_search_term_candidate(row) {
            aggregator.ingest_search_term_row(row);
        }
    })?;

    let rows_ingested = aggregator.rows_ingested();
    let aggregates = aggregator.finish();
    info!(
        rows_ingested,
        product_targeting = aggregates.product_targeting.len(),
        keywords = aggregates.keywords.len(),
        placements = aggregates.placements.len(),
        search_terms = aggregates.negative_terms.len(),
        "aggregation complete"
    );

    let snapshot = policy::evaluate(aggregates, &settings.policy);
    let raw_changes = policy::bulk_changes(&snapshot);
    let raw_count = raw_changes.len();
    let changes = dedupe(raw_changes);
    info!(
        recommendations = changes.len(),
        duplicates_dropped = raw_count - changes.len(),
        "policy evaluation complete"
    );

    let optimization_log = report::optimization_log(&snapshot)?;
    let bulk_upload = report::bulk_upload(&changes)?;
    let impact_report = settings
        .emit_impact_report
        .then(|| report::impact_report(&snapshot, Utc::now()).into_bytes());

    Ok(RunArtifacts {
        optimization_log,
        bulk_upload,
        impact_report,
    })
}

/// Streams one recognized sheet into a per-row visitor, peeling the header
/// row into a column index first. Lenient runs skip an absent sheet and
/// leave its categories empty.
fn stream_sheet<F>(
    reader: &mut WorkbookReader,
    title: &str,
    sheet_policy: SheetPolicy,
    mut on_row: F,
) -> Result<(), EngineError>
where
    F: FnMut(&RowView),
{
    if !reader.has_sheet(title) {
        match sheet_policy {
            SheetPolicy::Strict => return Err(EngineError::missing_sheet(title)),
            SheetPolicy::Lenient => {
                debug!(sheet = title, "sheet absent, category degraded to empty");
                return Ok(());
            }
        }
    }

    let mut header: Option<HeaderIndex> = None;
    let rows = reader.stream_rows(title, |cells: &[CellValue]| match &header {
        None => header = Some(HeaderIndex::from_header_row(cells)),
        Some(index) => on_row(&RowView::new(index, cells)),
    })?;
    debug!(sheet = title, rows, "sheet streamed");
    Ok(())
}
