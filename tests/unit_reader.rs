mod support;

use bidventor::error::EngineError;
use bidventor::model::CellValue;
use bidventor::reader::{CAMPAIGNS_SHEET, SEARCH_TERMS_SHEET, WorkbookReader};
use support::{WorkbookBuilder, keyword_row, search_term_row};

#[test]
fn empty_payload_is_no_file() {
    match WorkbookReader::from_bytes(Vec::new()) {
        Err(EngineError::NoFile) => {}
        Err(other) => panic!("expected NoFile, got {other:?}"),
        Ok(_) => panic!("expected NoFile, got a reader"),
    }
}

#[test]
fn garbage_payload_is_a_workbook_error() {
    match WorkbookReader::from_bytes(b"definitely not a zip archive".to_vec()) {
        Err(EngineError::Workbook(_)) => {}
        Err(other) => panic!("expected Workbook error, got {other:?}"),
        Ok(_) => panic!("expected Workbook error, got a reader"),
    }
}

#[test]
fn recognizes_expected_sheets() {
    let payload = WorkbookBuilder::new()
        .campaign_row(keyword_row("K1", 1.0, 100.0, 10.0, 5.0, 20.0, 2.0))
        .term_row(search_term_row("red widget", 12.0, 6.0, 0.0, 0.0))
        .build();

    let reader = WorkbookReader::from_bytes(payload).expect("readable workbook");
    assert!(reader.has_sheet(CAMPAIGNS_SHEET));
    assert!(reader.has_sheet(SEARCH_TERMS_SHEET));
    assert!(!reader.has_sheet("Sponsored Brands Campaigns"));
}

#[test]
fn sheet_titles_match_after_trimming() {
    let payload = WorkbookBuilder::new()
        .campaigns_title(" Sponsored Products Campaigns ")
        .campaign_row(keyword_row("K1", 1.0, 100.0, 10.0, 5.0, 20.0, 2.0))
        .build();

    let reader = WorkbookReader::from_bytes(payload).expect("readable workbook");
    assert!(reader.has_sheet(CAMPAIGNS_SHEET));
}

#[test]
fn streams_header_and_data_rows_in_order() {
    let payload = WorkbookBuilder::new()
        .campaign_row(keyword_row("K1", 1.0, 100.0, 10.0, 5.0, 20.0, 2.0))
        .campaign_row(keyword_row("K2", 0.8, 50.0, 5.0, 2.0, 8.0, 1.0))
        .build();

    let mut reader = WorkbookReader::from_bytes(payload).expect("readable workbook");
    let mut first_cells: Vec<String> = Vec::new();
    let mut rows_seen = 0u64;
    let visited = reader
        .stream_rows(CAMPAIGNS_SHEET, |cells| {
            rows_seen += 1;
            first_cells.push(
                cells
                    .first()
                    .map(|c| c.as_text().to_string())
                    .unwrap_or_default(),
            );
        })
        .expect("stream");

    assert_eq!(visited, 3);
    assert_eq!(visited, rows_seen);
    assert_eq!(first_cells[0], "Entity");
    assert_eq!(first_cells[1], "Keyword");
    assert_eq!(first_cells[2], "Keyword");
}

#[test]
fn numbers_come_back_numeric() {
    let payload = WorkbookBuilder::new()
        .campaign_row(keyword_row("K1", 1.25, 100.0, 10.0, 5.5, 20.0, 2.0))
        .build();

    let mut reader = WorkbookReader::from_bytes(payload).expect("readable workbook");
    let mut bid_cell = CellValue::Empty;
    reader
        .stream_rows(CAMPAIGNS_SHEET, |cells| {
            if cells.first().map(|c| c.as_text()) == Some("Keyword") {
                bid_cell = cells[support::campaign_col::BID].clone();
            }
        })
        .expect("stream");

    assert_eq!(bid_cell, CellValue::Number(1.25));
}

#[test]
fn missing_sheet_is_reported_by_name() {
    let payload = WorkbookBuilder::new()
        .without_terms_sheet()
        .campaign_row(keyword_row("K1", 1.0, 100.0, 10.0, 5.0, 20.0, 2.0))
        .build();

    let mut reader = WorkbookReader::from_bytes(payload).expect("readable workbook");
    match reader.stream_rows(SEARCH_TERMS_SHEET, |_| {}) {
        Err(EngineError::MissingSheet { sheet }) => {
            assert_eq!(sheet, SEARCH_TERMS_SHEET);
        }
        other => panic!("expected MissingSheet, got {other:?}"),
    }
}
