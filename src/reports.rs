//! The six cross-tab worksheets and the builder that runs them.
//!
//! Each worksheet counts through a [`CountSource`], collects the counts in a
//! `Tally` and lays them out as N / % column pairs with a `CrossTab`.

use crate::config::{MediumSpec, MissingRolePolicy, ReportConfig, Role};
use crate::error::{ReportError, Result};
use crate::source::{CountSource, Field, Query, Value};
use crate::types::{Choice, CountrySet};
use crate::util::percentage;
use crate::worksheet::{ReportDocument, ReportWorksheet};
use std::collections::HashMap;
use tracing::{info, warn};

/// Row holding the column group labels.
pub const GROUP_ROW: u32 = 4;
/// Row holding the "N" / "%" sub-headers.
pub const SUBHEADER_ROW: u32 = 5;
pub const FIRST_DATA_ROW: u32 = 6;
pub const LABEL_COL: u16 = 1;
pub const FIRST_GROUP_COL: u16 = 2;

pub const MEDIUM_PER_COUNTRY: &str = "2 - Medium per country";
pub const TOPICS_BY_REGION: &str = "4 - Topics by region";
pub const SEX_BY_MEDIA: &str = "7 - Sex by media";
pub const TOPIC_BY_SOURCE_SEX: &str = "9 - Topic by source sex";
pub const SPACE_PER_TOPIC: &str = "10 - Space per topic";
pub const TOPIC_BY_JOURNALIST_SEX: &str = "13 - Topic by reporter sex";

struct SheetSpec {
    name: &'static str,
    title: &'static str,
    subtitle: &'static str,
    region: bool,
}

/// One labelled entry along a worksheet axis.
#[derive(Debug, Clone)]
struct Header {
    key: Value,
    label: String,
}

impl From<&Choice> for Header {
    fn from(c: &Choice) -> Self {
        Header {
            key: Value::Id(c.id),
            label: c.label.clone(),
        }
    }
}

/// Which cells a percentage is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denominator {
    /// Sum across the column groups of the same row.
    Row,
    /// Sum down the rows of the same column group.
    Column,
}

/// Counts keyed by (row key, column key); absent keys read as zero.
#[derive(Debug, Default)]
struct Tally {
    counts: HashMap<(Value, Value), u64>,
}

impl Tally {
    fn add(&mut self, row: Value, col: Value, n: u64) {
        *self.counts.entry((row, col)).or_insert(0) += n;
    }

    fn get(&self, row: &Value, col: &Value) -> u64 {
        self.counts
            .get(&(row.clone(), col.clone()))
            .copied()
            .unwrap_or(0)
    }
}

/// A rows × column-groups table ready to be laid out.
struct CrossTab {
    rows: Vec<Header>,
    columns: Vec<Header>,
    tally: Tally,
    denominator: Denominator,
}

impl CrossTab {
    /// Denominators for every row or column, summed over the displayed
    /// entries only so each total matches the counts written beside it.
    fn totals(&self) -> HashMap<Value, u64> {
        let mut totals = HashMap::new();
        match self.denominator {
            Denominator::Row => {
                for row in &self.rows {
                    let sum = self
                        .columns
                        .iter()
                        .map(|col| self.tally.get(&row.key, &col.key))
                        .sum();
                    totals.insert(row.key.clone(), sum);
                }
            }
            Denominator::Column => {
                for col in &self.columns {
                    let sum = self
                        .rows
                        .iter()
                        .map(|row| self.tally.get(&row.key, &col.key))
                        .sum();
                    totals.insert(col.key.clone(), sum);
                }
            }
        }
        totals
    }

    fn write_to(&self, ws: &mut ReportWorksheet) {
        for (i, row) in self.rows.iter().enumerate() {
            ws.write(FIRST_DATA_ROW + i as u32, LABEL_COL, row.label.as_str());
        }

        let totals = self.totals();
        let mut col = FIRST_GROUP_COL;
        for column in &self.columns {
            ws.merge(GROUP_ROW, col, col + 1, column.label.as_str());
            ws.write(SUBHEADER_ROW, col, "N");
            ws.write(SUBHEADER_ROW, col + 1, "%");

            for (i, row) in self.rows.iter().enumerate() {
                let n = self.tally.get(&row.key, &column.key);
                let total_key = match self.denominator {
                    Denominator::Row => &row.key,
                    Denominator::Column => &column.key,
                };
                let total = totals.get(total_key).copied().unwrap_or(0);
                let r = FIRST_DATA_ROW + i as u32;
                ws.write(r, col, n);
                ws.write_percent(r, col + 1, percentage(n, total));
            }
            col += 2;
        }
    }
}

/// Builds the six cross-tabulated worksheets for a set of countries.
///
/// The builder holds no state between calls; building twice against an
/// unchanged source yields equal documents.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    countries: CountrySet,
    year: String,
    config: ReportConfig,
}

impl ReportBuilder {
    pub fn new(countries: CountrySet, year: impl Into<String>) -> Self {
        Self {
            countries,
            year: year.into(),
            config: ReportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn countries(&self) -> &CountrySet {
        &self.countries
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    /// Run every report against `source`.
    ///
    /// The first query failure aborts the build.
    pub fn build<S: CountSource + ?Sized>(&self, source: &S) -> Result<ReportDocument> {
        self.config.validate()?;
        info!(
            countries = self.countries.len(),
            year = %self.year,
            "building report workbook"
        );

        let worksheets = vec![
            self.ws_2_media_by_country(source)?,
            self.ws_4_topics_by_region(source)?,
            self.ws_7_sex_by_media(source)?,
            self.ws_9_topic_by_source_sex(source)?,
            self.ws_10_space_per_topic(source)?,
            self.ws_13_topic_by_journalist_sex(source)?,
        ];
        Ok(ReportDocument { worksheets })
    }

    fn start_sheet(&self, spec: &SheetSpec) -> ReportWorksheet {
        info!(worksheet = spec.name, "generating worksheet");
        let mut ws = ReportWorksheet::new(spec.name);
        ws.write(0, 0, spec.title);
        ws.write(1, 0, spec.subtitle);
        ws.write(3, 2, self.year.as_str());
        if spec.region {
            ws.write(5, 0, self.config.region_label.as_str());
        }
        ws
    }

    fn media_columns(&self) -> Vec<Header> {
        self.config
            .media
            .iter()
            .map(|m| Header {
                key: Value::Code(m.label.clone()),
                label: m.label.clone(),
            })
            .collect()
    }

    fn choices(list: &[Choice]) -> Vec<Header> {
        list.iter().map(Header::from).collect()
    }

    /// Resolve the sex field for `role` on `medium`, applying the
    /// missing-role policy when the medium has no such people.
    fn sex_field(&self, medium: &MediumSpec, role: Role, report: &str) -> Result<Option<Field>> {
        if let Some(field) = medium.sex_field(role) {
            return Ok(Some(field));
        }
        match self.config.missing_role {
            MissingRolePolicy::Skip => {
                warn!(
                    medium = %medium.label,
                    role = role.as_str(),
                    worksheet = report,
                    "medium has no such role, leaving it out"
                );
                Ok(None)
            }
            MissingRolePolicy::Fail => Err(ReportError::MissingRole {
                medium: medium.label.clone(),
                role: role.as_str().to_string(),
            }),
        }
    }

    fn ws_2_media_by_country<S: CountSource + ?Sized>(&self, source: &S) -> Result<ReportWorksheet> {
        let mut ws = self.start_sheet(&SheetSpec {
            name: MEDIUM_PER_COUNTRY,
            title: "Participating Countries in each Region",
            subtitle: "Breakdown of all media by country",
            region: true,
        });

        let mut tally = Tally::default();
        for medium in &self.config.media {
            let query = Query::new(&medium.label, &self.countries).group_by([Field::Country]);
            for (key, n) in source.count_grouped(&query)? {
                if let Some(country) = key.into_iter().next() {
                    tally.add(country, Value::Code(medium.label.clone()), n);
                }
            }
        }

        let rows = self
            .countries
            .codes()
            .iter()
            .map(|code| Header {
                key: Value::Code(code.clone()),
                label: self.config.country_name(code).to_string(),
            })
            .collect();

        CrossTab {
            rows,
            columns: self.media_columns(),
            tally,
            denominator: Denominator::Row,
        }
        .write_to(&mut ws);
        Ok(ws)
    }

    fn ws_4_topics_by_region<S: CountSource + ?Sized>(&self, source: &S) -> Result<ReportWorksheet> {
        let mut ws = self.start_sheet(&SheetSpec {
            name: TOPICS_BY_REGION,
            title: "Topics in the news by region",
            subtitle: "Breakdown of major news topics by region by medium",
            region: true,
        });

        let mut tally = Tally::default();
        for medium in &self.config.media {
            let query = Query::new(&medium.label, &self.countries).group_by([Field::Topic]);
            for (key, n) in source.count_grouped(&query)? {
                if let Some(topic) = key.into_iter().next() {
                    tally.add(topic, Value::Code(medium.label.clone()), n);
                }
            }
        }

        CrossTab {
            rows: Self::choices(&self.config.topics),
            columns: self.media_columns(),
            tally,
            denominator: Denominator::Column,
        }
        .write_to(&mut ws);
        Ok(ws)
    }

    fn ws_7_sex_by_media<S: CountSource + ?Sized>(&self, source: &S) -> Result<ReportWorksheet> {
        let mut ws = self.start_sheet(&SheetSpec {
            name: SEX_BY_MEDIA,
            title: "Women in the news (sources) by medium",
            subtitle: "Breakdown by sex of all mediums",
            region: false,
        });

        let mut tally = Tally::default();
        for medium in &self.config.media {
            let Some(sex) = self.sex_field(medium, Role::Source, SEX_BY_MEDIA)? else {
                continue;
            };
            let query = Query::new(&medium.label, &self.countries).group_by([sex]);
            for (key, n) in source.count_grouped(&query)? {
                match key.into_iter().next() {
                    Some(sex) if !sex.is_null() => {
                        tally.add(sex, Value::Code(medium.label.clone()), n)
                    }
                    _ => {}
                }
            }
        }

        CrossTab {
            rows: Self::choices(&self.config.genders),
            columns: self.media_columns(),
            tally,
            denominator: Denominator::Column,
        }
        .write_to(&mut ws);
        Ok(ws)
    }

    /// Topic rows × gender columns for one person role, summed over every
    /// medium that carries the role.
    fn topic_by_sex<S: CountSource + ?Sized>(
        &self,
        source: &S,
        role: Role,
        mut ws: ReportWorksheet,
    ) -> Result<ReportWorksheet> {
        let mut tally = Tally::default();
        for medium in &self.config.media {
            let Some(sex) = self.sex_field(medium, role, ws.name())? else {
                continue;
            };
            let query = Query::new(&medium.label, &self.countries).group_by([sex, Field::Topic]);
            for (key, n) in source.count_grouped(&query)? {
                let mut key = key.into_iter();
                match (key.next(), key.next()) {
                    (Some(sex), Some(topic)) if !sex.is_null() => tally.add(topic, sex, n),
                    _ => {}
                }
            }
        }

        CrossTab {
            rows: Self::choices(&self.config.topics),
            columns: Self::choices(&self.config.genders),
            tally,
            denominator: Denominator::Row,
        }
        .write_to(&mut ws);
        Ok(ws)
    }

    fn ws_9_topic_by_source_sex<S: CountSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<ReportWorksheet> {
        let ws = self.start_sheet(&SheetSpec {
            name: TOPIC_BY_SOURCE_SEX,
            title: "Sex of news subjects in different story topics",
            subtitle: "Breakdown of topic by sex",
            region: false,
        });
        self.topic_by_sex(source, Role::Source, ws)
    }

    fn ws_10_space_per_topic<S: CountSource + ?Sized>(&self, source: &S) -> Result<ReportWorksheet> {
        let mut ws = self.start_sheet(&SheetSpec {
            name: SPACE_PER_TOPIC,
            title: "Space allocated to major topics in Newspapers",
            subtitle: "Breakdown by major topic by space (q.4) in newspapers",
            region: false,
        });

        let print = self.config.print_medium.as_str();
        let mut tally = Tally::default();
        for space in &self.config.spaces {
            let query = Query::new(print, &self.countries)
                .group_by([Field::Topic])
                .space(space.id);
            for (key, n) in source.count_grouped(&query)? {
                match key.into_iter().next() {
                    Some(topic) if !topic.is_null() => tally.add(topic, Value::Id(space.id), n),
                    _ => {}
                }
            }
        }

        CrossTab {
            rows: Self::choices(&self.config.topics),
            columns: Self::choices(&self.config.spaces),
            tally,
            denominator: Denominator::Column,
        }
        .write_to(&mut ws);
        Ok(ws)
    }

    fn ws_13_topic_by_journalist_sex<S: CountSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<ReportWorksheet> {
        let ws = self.start_sheet(&SheetSpec {
            name: TOPIC_BY_JOURNALIST_SEX,
            title: "Sex of reporter in different story topics",
            subtitle: "Breakdown of topic by reporter sex",
            region: false,
        });
        self.topic_by_sex(source, Role::Journalist, ws)
    }
}
