use crate::config::ReportConfig;
use crate::error::Result;
use crate::source::RecordStore;
use crate::types::{ObservationRecord, RawRecord};
use crate::util::{non_empty, parse_id_safe, parse_sex_list};
use csv::ReaderBuilder;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Rows whose medium is not in the registry. They are still loaded.
    pub unknown_media: usize,
    /// Those media, sorted.
    pub unknown_labels: Vec<String>,
}

pub fn load_records(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<(RecordStore, LoadReport)> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_records(rdr, config)
}

pub fn load_records_from_reader<R: Read>(
    reader: R,
    config: &ReportConfig,
) -> Result<(RecordStore, LoadReport)> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    read_records(rdr, config)
}

fn read_records<R: Read>(
    mut rdr: csv::Reader<R>,
    config: &ReportConfig,
) -> Result<(RecordStore, LoadReport)> {
    let mut report = LoadReport::default();
    let mut store = RecordStore::new();

    for (line, result) in rdr.deserialize::<RawRecord>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line = line + 2, error = %e, "unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };
        match clean(row) {
            Some(record) => {
                if config.medium(&record.medium).is_none() {
                    report.unknown_media += 1;
                }
                store.push(record);
            }
            None => {
                debug!(line = line + 2, "row failed validation");
                report.parse_errors += 1;
            }
        }
    }

    let unknown: BTreeSet<&str> = store
        .media()
        .filter(|medium| config.medium(medium).is_none())
        .collect();
    for medium in &unknown {
        warn!(medium = %medium, "records for a medium outside the registry");
    }
    report.unknown_labels = unknown.into_iter().map(str::to_string).collect();
    report.loaded_rows = store.len();
    Ok((store, report))
}

fn clean(row: RawRecord) -> Option<ObservationRecord> {
    let medium = non_empty(row.medium)?;
    let country = non_empty(row.country)?.to_uppercase();
    let topic = parse_id_safe(row.topic.as_deref()).ok()?;
    let space = parse_id_safe(row.space.as_deref()).ok()?;
    let sources = parse_sex_list(row.source_sex.as_deref()).ok()?;
    let journalists = parse_sex_list(row.journalist_sex.as_deref()).ok()?;
    Some(ObservationRecord {
        medium,
        country,
        topic,
        space,
        sources,
        journalists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CountSource, Field, Query, Value};
    use crate::types::CountrySet;

    const CSV: &str = "\
medium,country,topic,space,source_sex,journalist_sex
Radio,ke,1,,1;2,1
Radio,KE,2,,,2
Print,UG,3,4,?,
Radio,KE,x,,1,1
,KE,1,,1,1
Podcast,KE,1,,1,
";

    #[test]
    fn loads_and_counts_rejects() {
        let config = ReportConfig::default();
        let (store, report) = load_records_from_reader(CSV.as_bytes(), &config).unwrap();
        assert_eq!(
            report,
            LoadReport {
                total_rows: 6,
                loaded_rows: 4,
                parse_errors: 2,
                unknown_media: 1,
                unknown_labels: vec!["Podcast".to_string()],
            }
        );
        assert_eq!(store.len(), 4);

        let countries = CountrySet::parse("KE");
        let rows = store
            .count_grouped(&Query::new("Radio", &countries).group_by([Field::Topic]))
            .unwrap();
        assert_eq!(rows, vec![(vec![Value::Id(1)], 1), (vec![Value::Id(2)], 1)]);
    }

    #[test]
    fn sex_columns_become_people() {
        let config = ReportConfig::default();
        let (store, _) = load_records_from_reader(CSV.as_bytes(), &config).unwrap();
        let countries = CountrySet::parse("UG");
        let rows = store
            .count_grouped(
                &Query::new("Print", &countries).group_by([Field::Sex(crate::config::Role::Source)]),
            )
            .unwrap();
        assert_eq!(rows, vec![(vec![Value::Null], 1)]);
    }

    #[test]
    fn missing_file_is_a_csv_error() {
        let config = ReportConfig::default();
        let err = load_records("/definitely/not/here.csv", &config).unwrap_err();
        assert!(matches!(err, crate::error::ReportError::Csv(_)));
    }
}
