//! Integration tests for the report builder
//!
//! Covers the cross-tab invariants (counts sum to the denominator, zero
//! totals give 0%), enumeration ordering, null-sex exclusion, the
//! missing-role policy and failure propagation from the count source.

use gmmp_report::reports::{
    FIRST_DATA_ROW, FIRST_GROUP_COL, GROUP_ROW, LABEL_COL, MEDIUM_PER_COUNTRY, SEX_BY_MEDIA,
    SPACE_PER_TOPIC, TOPICS_BY_REGION, TOPIC_BY_JOURNALIST_SEX, TOPIC_BY_SOURCE_SEX,
};
use gmmp_report::source::GroupCount;
use gmmp_report::util::percentage;
use gmmp_report::{
    Cell, Choice, CountSource, CountrySet, MediumSpec, MissingRolePolicy, ObservationRecord,
    Query, RecordStore, ReportBuilder, ReportConfig, ReportError, ReportWorksheet, Role,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

fn rec(medium: &str, country: &str, topic: u32) -> ObservationRecord {
    ObservationRecord {
        medium: medium.into(),
        country: country.into(),
        topic: Some(topic),
        space: None,
        sources: vec![],
        journalists: vec![],
    }
}

fn with_sources(mut r: ObservationRecord, sources: Vec<Option<u32>>) -> ObservationRecord {
    r.sources = sources;
    r
}

fn with_journalists(mut r: ObservationRecord, journalists: Vec<Option<u32>>) -> ObservationRecord {
    r.journalists = journalists;
    r
}

fn with_space(mut r: ObservationRecord, space: u32) -> ObservationRecord {
    r.space = Some(space);
    r
}

fn small_config(media: &[&str]) -> ReportConfig {
    ReportConfig {
        media: media.iter().map(|m| MediumSpec::new(*m)).collect(),
        topics: vec![Choice::new(1, "Politics"), Choice::new(2, "Economy"), Choice::new(3, "Health")],
        genders: vec![Choice::new(1, "Female"), Choice::new(2, "Male")],
        spaces: vec![Choice::new(1, "Full page"), Choice::new(2, "Half page")],
        ..ReportConfig::default()
    }
}

fn int(ws: &ReportWorksheet, row: u32, col: u16) -> u64 {
    ws.get(row, col).and_then(Cell::as_integer).unwrap()
}

fn pct(ws: &ReportWorksheet, row: u32, col: u16) -> f64 {
    ws.get(row, col).and_then(Cell::as_percent).unwrap()
}

fn text(ws: &ReportWorksheet, row: u32, col: u16) -> &str {
    ws.get(row, col).and_then(Cell::as_text).unwrap()
}

fn data_rows(ws: &ReportWorksheet) -> u32 {
    let mut n = 0;
    while ws.get(FIRST_DATA_ROW + n, LABEL_COL).is_some() {
        n += 1;
    }
    n
}

fn group_cols(ws: &ReportWorksheet) -> Vec<u16> {
    ws.merges()
        .iter()
        .filter(|m| m.row == GROUP_ROW)
        .map(|m| m.first_col)
        .collect()
}

fn group_labels(ws: &ReportWorksheet) -> Vec<String> {
    group_cols(ws)
        .into_iter()
        .map(|c| text(ws, GROUP_ROW, c).to_string())
        .collect()
}

fn row_labels(ws: &ReportWorksheet) -> Vec<String> {
    (0..data_rows(ws))
        .map(|i| text(ws, FIRST_DATA_ROW + i, LABEL_COL).to_string())
        .collect()
}

/// Every percentage equals count / total, where total is the sum of the
/// counts in the same column group or the same row.
fn assert_consistent(ws: &ReportWorksheet, per_row: bool) {
    let rows: Vec<u32> = (0..data_rows(ws)).map(|i| FIRST_DATA_ROW + i).collect();
    let cols = group_cols(ws);
    for &r in &rows {
        for &c in &cols {
            let total: u64 = if per_row {
                cols.iter().map(|&c2| int(ws, r, c2)).sum()
            } else {
                rows.iter().map(|&r2| int(ws, r2, c)).sum()
            };
            let p = pct(ws, r, c + 1);
            assert_eq!(p, percentage(int(ws, r, c), total), "{} ({r},{c})", ws.name());
            assert!((0.0..=1.0).contains(&p));
            if total == 0 {
                assert_eq!(p, 0.0);
            }
        }
    }
}

fn mixed_store() -> RecordStore {
    vec![
        with_journalists(with_sources(rec("Radio", "KE", 1), vec![Some(1), Some(2)]), vec![Some(1)]),
        with_journalists(with_sources(rec("Radio", "KE", 2), vec![Some(2)]), vec![Some(2)]),
        with_sources(rec("Radio", "UG", 3), vec![None]),
        with_space(with_sources(rec("Print", "KE", 1), vec![Some(1)]), 1),
        with_space(with_journalists(rec("Print", "UG", 2), vec![Some(1), None]), 2),
        with_space(rec("Print", "UG", 2), 1),
        rec("Radio", "TZ", 1),
    ]
    .into_iter()
    .collect()
}

#[test]
fn builds_six_worksheets_in_order() {
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG"), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let doc = builder.build(&mixed_store()).unwrap();
    assert_eq!(
        doc.names(),
        vec![
            MEDIUM_PER_COUNTRY,
            TOPICS_BY_REGION,
            SEX_BY_MEDIA,
            TOPIC_BY_SOURCE_SEX,
            SPACE_PER_TOPIC,
            TOPIC_BY_JOURNALIST_SEX,
        ]
    );
    for ws in &doc.worksheets {
        assert_eq!(text(ws, 3, 2), "2015");
    }
}

#[test]
fn every_worksheet_is_internally_consistent() {
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG"), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let doc = builder.build(&mixed_store()).unwrap();
    for (name, per_row) in [
        (MEDIUM_PER_COUNTRY, true),
        (TOPICS_BY_REGION, false),
        (SEX_BY_MEDIA, false),
        (TOPIC_BY_SOURCE_SEX, true),
        (SPACE_PER_TOPIC, false),
        (TOPIC_BY_JOURNALIST_SEX, true),
    ] {
        assert_consistent(doc.worksheet(name).unwrap(), per_row);
    }
}

#[test]
fn topics_by_region_radio_scenario() {
    let mut records = vec![];
    for topic in [1, 1, 2, 2, 3] {
        records.push(rec("Radio", "KE", topic));
    }
    for topic in [1, 2, 3] {
        records.push(rec("Radio", "UG", topic));
    }
    let store: RecordStore = records.into_iter().collect();
    let builder =
        ReportBuilder::new(CountrySet::parse("KE,UG"), "2015").with_config(small_config(&["Radio"]));
    let doc = builder.build(&store).unwrap();
    let ws = doc.worksheet(TOPICS_BY_REGION).unwrap();

    assert_eq!(group_labels(ws), vec!["Radio"]);
    let col = FIRST_GROUP_COL;
    let counts: Vec<u64> = (0..3).map(|i| int(ws, FIRST_DATA_ROW + i, col)).collect();
    let shares: Vec<f64> = (0..3).map(|i| pct(ws, FIRST_DATA_ROW + i, col + 1)).collect();
    assert_eq!(counts, vec![3, 3, 2]);
    assert_eq!(shares, vec![0.375, 0.375, 0.25]);
    assert_eq!(text(ws, 5, 0), "All regions");
}

#[test]
fn medium_per_country_uses_row_totals() {
    let store: RecordStore = vec![
        rec("Radio", "KE", 1),
        rec("Radio", "KE", 2),
        rec("Print", "KE", 1),
        rec("Print", "KE", 1),
        rec("Radio", "UG", 1),
    ]
    .into_iter()
    .collect();
    let mut config = small_config(&["Print", "Radio"]);
    config.country_names.insert("KE".into(), "Kenya".into());
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG,TZ"), "2015").with_config(config);
    let doc = builder.build(&store).unwrap();
    let ws = doc.worksheet(MEDIUM_PER_COUNTRY).unwrap();

    assert_eq!(row_labels(ws), vec!["Kenya", "UG", "TZ"]);
    assert_eq!(group_labels(ws), vec!["Print", "Radio"]);
    // Kenya: 2 print, 2 radio.
    assert_eq!(int(ws, 6, 2), 2);
    assert_eq!(pct(ws, 6, 3), 0.5);
    assert_eq!(pct(ws, 6, 5), 0.5);
    // Uganda: radio only.
    assert_eq!(pct(ws, 7, 3), 0.0);
    assert_eq!(pct(ws, 7, 5), 1.0);
    // No records for TZ: zeros, no error.
    for col in [2, 4] {
        assert_eq!(int(ws, 8, col), 0);
        assert_eq!(pct(ws, 8, col + 1), 0.0);
    }
}

#[test]
fn null_sex_is_excluded_from_totals() {
    let mut records = vec![];
    for sex in [Some(1), Some(1), Some(1), Some(2), Some(2), Some(2), Some(2), None, None, None] {
        records.push(with_sources(rec("Radio", "KE", 1), vec![sex]));
    }
    let store: RecordStore = records.into_iter().collect();
    let builder =
        ReportBuilder::new(CountrySet::parse("KE"), "2015").with_config(small_config(&["Radio"]));
    let doc = builder.build(&store).unwrap();

    let ws = doc.worksheet(SEX_BY_MEDIA).unwrap();
    let total = int(ws, 6, 2) + int(ws, 7, 2);
    assert_eq!(total, 7);
    assert_eq!(pct(ws, 6, 3), 3.0 / 7.0);
    assert_eq!(pct(ws, 7, 3), 4.0 / 7.0);

    let ws = doc.worksheet(TOPIC_BY_SOURCE_SEX).unwrap();
    assert_eq!(int(ws, 6, 2) + int(ws, 6, 4), 7);
}

#[test]
fn topic_by_sex_sums_across_media() {
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG"), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let doc = builder.build(&mixed_store()).unwrap();

    let ws = doc.worksheet(TOPIC_BY_SOURCE_SEX).unwrap();
    assert_eq!(group_labels(ws), vec!["Female", "Male"]);
    // Politics: radio female + male, print female.
    assert_eq!(int(ws, 6, 2), 2);
    assert_eq!(int(ws, 6, 4), 1);
    assert_eq!(pct(ws, 6, 3), 2.0 / 3.0);
    // Health: only a null-sex source.
    assert_eq!(int(ws, 8, 2), 0);
    assert_eq!(pct(ws, 8, 3), 0.0);

    let ws = doc.worksheet(TOPIC_BY_JOURNALIST_SEX).unwrap();
    assert_eq!(int(ws, 6, 2), 1);
    assert_eq!(pct(ws, 6, 3), 1.0);
    // Economy: radio male, print female plus one null.
    assert_eq!(int(ws, 7, 2), 1);
    assert_eq!(int(ws, 7, 4), 1);
    assert_eq!(pct(ws, 7, 5), 0.5);
}

#[test]
fn space_per_topic_filters_by_space() {
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG"), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let doc = builder.build(&mixed_store()).unwrap();
    let ws = doc.worksheet(SPACE_PER_TOPIC).unwrap();

    assert_eq!(group_labels(ws), vec!["Full page", "Half page"]);
    // Full page: politics (KE), economy (UG).
    assert_eq!(int(ws, 6, 2), 1);
    assert_eq!(int(ws, 7, 2), 1);
    assert_eq!(pct(ws, 6, 3), 0.5);
    // Half page: economy only.
    assert_eq!(int(ws, 6, 4), 0);
    assert_eq!(int(ws, 7, 4), 1);
    assert_eq!(pct(ws, 7, 5), 1.0);
}

/// Wraps a store and records every query it sees.
struct Recording {
    inner: RecordStore,
    seen: RefCell<Vec<(String, Option<u32>)>>,
}

impl CountSource for Recording {
    fn count_grouped(&self, query: &Query<'_>) -> gmmp_report::Result<Vec<GroupCount>> {
        self.seen
            .borrow_mut()
            .push((query.medium.to_string(), query.space));
        self.inner.count_grouped(query)
    }
}

#[test]
fn space_per_topic_only_queries_print() {
    let source = Recording {
        inner: mixed_store(),
        seen: RefCell::new(vec![]),
    };
    // Print is not in the registry, yet the space report still reads it.
    let builder =
        ReportBuilder::new(CountrySet::parse("KE,UG"), "2015").with_config(small_config(&["Radio"]));
    let doc = builder.build(&source).unwrap();

    let seen = source.seen.borrow();
    let spaced: Vec<_> = seen.iter().filter(|(_, space)| space.is_some()).collect();
    assert_eq!(spaced.len(), 2);
    assert!(spaced.iter().all(|(medium, _)| medium == "Print"));
    assert_eq!(seen.iter().filter(|(medium, _)| medium == "Print").count(), 2);

    let ws = doc.worksheet(SPACE_PER_TOPIC).unwrap();
    assert_eq!(int(ws, 6, 2), 1);
}

#[test]
fn ordering_follows_enumeration_not_ids() {
    let mut config = small_config(&["Radio"]);
    config.genders = vec![
        Choice::new(2, "Female"),
        Choice::new(1, "Male"),
        Choice::new(3, "Unknown"),
    ];
    config.topics = vec![Choice::new(3, "Health"), Choice::new(1, "Politics")];
    let store: RecordStore = vec![
        with_sources(rec("Radio", "KE", 1), vec![Some(2)]),
        with_sources(rec("Radio", "KE", 3), vec![Some(1)]),
    ]
    .into_iter()
    .collect();
    let builder = ReportBuilder::new(CountrySet::parse("KE"), "2015").with_config(config);
    let doc = builder.build(&store).unwrap();

    let ws = doc.worksheet(SEX_BY_MEDIA).unwrap();
    assert_eq!(row_labels(ws), vec!["Female", "Male", "Unknown"]);

    let ws = doc.worksheet(TOPIC_BY_SOURCE_SEX).unwrap();
    assert_eq!(group_labels(ws), vec!["Female", "Male", "Unknown"]);
    assert_eq!(row_labels(ws), vec!["Health", "Politics"]);
    // Health has one source with sex id 1, which is the "Male" column.
    assert_eq!(int(ws, 6, 2), 0);
    assert_eq!(int(ws, 6, 4), 1);
    // Politics has one source with sex id 2, the "Female" column.
    assert_eq!(int(ws, 7, 2), 1);
}

#[test]
fn empty_country_set_is_not_an_error() {
    let builder = ReportBuilder::new(CountrySet::parse(""), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let doc = builder.build(&mixed_store()).unwrap();

    let ws = doc.worksheet(MEDIUM_PER_COUNTRY).unwrap();
    assert_eq!(data_rows(ws), 0);
    assert_eq!(group_labels(ws), vec!["Print", "Radio"]);

    let ws = doc.worksheet(TOPICS_BY_REGION).unwrap();
    for i in 0..3 {
        assert_eq!(int(ws, FIRST_DATA_ROW + i, 2), 0);
        assert_eq!(pct(ws, FIRST_DATA_ROW + i, 3), 0.0);
    }
}

#[test]
fn building_twice_gives_identical_documents() {
    let store = mixed_store();
    let builder = ReportBuilder::new(CountrySet::parse("KE,UG"), "2015")
        .with_config(small_config(&["Print", "Radio"]));
    let first = builder.build(&store).unwrap();
    let second = builder.build(&store).unwrap();
    assert_eq!(first, second);
}

fn twitter_without_sources() -> (ReportConfig, RecordStore) {
    let mut config = small_config(&["Radio"]);
    config
        .media
        .push(MediumSpec::new("Twitter").without_role(Role::Source));
    let store: RecordStore = vec![
        with_sources(rec("Radio", "KE", 1), vec![Some(1)]),
        with_sources(rec("Twitter", "KE", 1), vec![Some(2), Some(2)]),
    ]
    .into_iter()
    .collect();
    (config, store)
}

#[test]
fn missing_role_is_skipped_by_default() {
    let (config, store) = twitter_without_sources();
    let builder = ReportBuilder::new(CountrySet::parse("KE"), "2015").with_config(config);
    let doc = builder.build(&store).unwrap();

    let ws = doc.worksheet(SEX_BY_MEDIA).unwrap();
    assert_eq!(group_labels(ws), vec!["Radio", "Twitter"]);
    assert_eq!(int(ws, 6, 4), 0);
    assert_eq!(int(ws, 7, 4), 0);
    assert_eq!(pct(ws, 7, 5), 0.0);

    let ws = doc.worksheet(TOPIC_BY_SOURCE_SEX).unwrap();
    assert_eq!(int(ws, 6, 2), 1);
    assert_eq!(int(ws, 6, 4), 0);

    // The journalist report and the medium counts still see Twitter.
    let ws = doc.worksheet(MEDIUM_PER_COUNTRY).unwrap();
    assert_eq!(int(ws, 6, 4), 1);
}

#[test]
fn missing_role_can_fail_the_build() {
    let (mut config, store) = twitter_without_sources();
    config.missing_role = MissingRolePolicy::Fail;
    let builder = ReportBuilder::new(CountrySet::parse("KE"), "2015").with_config(config);
    match builder.build(&store) {
        Err(ReportError::MissingRole { medium, role }) => {
            assert_eq!(medium, "Twitter");
            assert_eq!(role, "source");
        }
        other => panic!("expected MissingRole, got {other:?}"),
    }
}

struct Broken;

impl CountSource for Broken {
    fn count_grouped(&self, query: &Query<'_>) -> gmmp_report::Result<Vec<GroupCount>> {
        Err(ReportError::Query {
            medium: query.medium.to_string(),
            message: "connection reset".into(),
        })
    }
}

#[test]
fn source_failure_fails_the_build() {
    let builder = ReportBuilder::new(CountrySet::parse("KE"), "2015");
    let err = builder.build(&Broken).unwrap_err();
    assert!(matches!(err, ReportError::Query { ref medium, .. } if medium == "Internet News"));
    assert_eq!(err.to_string(), "query against Internet News failed: connection reset");
}

#[test]
fn invalid_config_fails_before_querying() {
    let mut config = small_config(&["Radio"]);
    config.media.clear();
    let builder = ReportBuilder::new(CountrySet::parse("KE"), "2015").with_config(config);
    assert!(matches!(builder.build(&Broken), Err(ReportError::InvalidConfig(_))));
}
