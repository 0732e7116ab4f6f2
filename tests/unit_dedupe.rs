use bidventor::dedupe::dedupe;
use bidventor::model::{BulkChange, BulkEntity, BulkOperation};

fn keyword_update(campaign_id: &str, keyword_id: &str, bid: f64) -> BulkChange {
    BulkChange {
        entity: BulkEntity::Keyword,
        operation: BulkOperation::Update,
        campaign_id: campaign_id.to_string(),
        ad_group_id: "AG1".to_string(),
        product_targeting_id: None,
        keyword_id: Some(keyword_id.to_string()),
        placement: None,
        bid: Some(bid),
        percentage: None,
        keyword_text: None,
        match_type: None,
        targeting_expression: None,
    }
}

fn negative_keyword(campaign_id: &str, term: &str) -> BulkChange {
    BulkChange {
        entity: BulkEntity::NegativeKeyword,
        operation: BulkOperation::Add,
        campaign_id: campaign_id.to_string(),
        ad_group_id: "AG1".to_string(),
        product_targeting_id: None,
        keyword_id: None,
        placement: None,
        bid: None,
        percentage: None,
        keyword_text: Some(term.to_string()),
        match_type: Some("negativeExact".to_string()),
        targeting_expression: None,
    }
}

fn placement_update(placement: &str, percentage: f64) -> BulkChange {
    BulkChange {
        entity: BulkEntity::BiddingAdjustment,
        operation: BulkOperation::Update,
        campaign_id: "C1".to_string(),
        ad_group_id: "AG1".to_string(),
        product_targeting_id: None,
        keyword_id: None,
        placement: Some(placement.to_string()),
        bid: None,
        percentage: Some(percentage),
        keyword_text: None,
        match_type: None,
        targeting_expression: None,
    }
}

#[test]
fn identical_changes_collapse_to_the_first() {
    let changes = vec![
        keyword_update("C1", "K1", 1.0075),
        negative_keyword("C1", "red widget"),
        keyword_update("C1", "K1", 1.0075),
        negative_keyword("C1", "red widget"),
    ];
    let deduped = dedupe(changes);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].keyword_id.as_deref(), Some("K1"));
    assert_eq!(deduped[1].keyword_text.as_deref(), Some("red widget"));
}

#[test]
fn distinct_keys_survive() {
    let changes = vec![
        keyword_update("C1", "K1", 1.0075),
        keyword_update("C2", "K1", 1.0075),
        keyword_update("C1", "K2", 1.0075),
        negative_keyword("C1", "red widget"),
        negative_keyword("C1", "blue widget"),
    ];
    assert_eq!(dedupe(changes).len(), 5);
}

#[test]
fn percentage_participates_in_identity() {
    let changes = vec![
        placement_update("Top of Search", 60.0),
        placement_update("Top of Search", 62.5),
        placement_update("Top of Search", 60.0),
    ];
    assert_eq!(dedupe(changes).len(), 2);
}

#[test]
fn dedupe_is_idempotent() {
    let changes = vec![
        keyword_update("C1", "K1", 1.0075),
        keyword_update("C1", "K1", 1.0075),
        placement_update("Rest of Search", 25.0),
        negative_keyword("C1", "red widget"),
    ];
    let once = dedupe(changes);
    let once_len = once.len();
    let once_keys: Vec<_> = once
        .iter()
        .map(|c| (c.entity, c.campaign_id.clone(), c.keyword_id.clone()))
        .collect();

    let twice = dedupe(once);
    assert_eq!(twice.len(), once_len);
    let twice_keys: Vec<_> = twice
        .iter()
        .map(|c| (c.entity, c.campaign_id.clone(), c.keyword_id.clone()))
        .collect();
    assert_eq!(once_keys, twice_keys);
}
