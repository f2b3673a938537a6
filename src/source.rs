//! The data-access seam the report builder counts through.
//!
//! A [`CountSource`] answers one kind of question: how many rows of a
//! medium's records fall into each combination of the grouped fields,
//! restricted to a country set. [`RecordStore`] answers it from records
//! held in memory.

use crate::config::Role;
use crate::error::Result;
use crate::types::{CountrySet, ObservationRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A groupable attribute of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Country,
    Topic,
    Space,
    /// Sex of the people attached in the given role.
    Sex(Role),
}

/// One component of a group key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Null,
    Id(u32),
    Code(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<Option<u32>> for Value {
    fn from(v: Option<u32>) -> Self {
        v.map_or(Value::Null, Value::Id)
    }
}

/// A grouped count request against one medium.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub medium: &'a str,
    pub group_by: Vec<Field>,
    pub countries: &'a CountrySet,
    /// Only count records with this space category.
    pub space: Option<u32>,
}

impl<'a> Query<'a> {
    pub fn new(medium: &'a str, countries: &'a CountrySet) -> Self {
        Self {
            medium,
            group_by: Vec::new(),
            countries,
            space: None,
        }
    }

    pub fn group_by(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.group_by.extend(fields);
        self
    }

    pub fn space(mut self, space: u32) -> Self {
        self.space = Some(space);
        self
    }
}

/// One `(key, count)` pair; the key has one value per grouped field, in
/// the order the fields were requested.
pub type GroupCount = (Vec<Value>, u64);

pub trait CountSource {
    /// Count the medium's records grouped by `query.group_by`, keeping only
    /// records whose country is in `query.countries`.
    ///
    /// Grouping by a [`Field::Sex`] yields one row per attached person of
    /// that role, and a single `Value::Null` row for a record without one.
    fn count_grouped(&self, query: &Query<'_>) -> Result<Vec<GroupCount>>;
}

/// Observation records held in memory, bucketed by medium.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    by_medium: HashMap<String, Vec<ObservationRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ObservationRecord) {
        self.by_medium
            .entry(record.medium.clone())
            .or_default()
            .push(record);
    }

    pub fn len(&self) -> usize {
        self.by_medium.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn media(&self) -> impl Iterator<Item = &str> {
        self.by_medium.keys().map(String::as_str)
    }
}

impl FromIterator<ObservationRecord> for RecordStore {
    fn from_iter<I: IntoIterator<Item = ObservationRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.push(record);
        }
        store
    }
}

fn field_values(record: &ObservationRecord, field: Field) -> Vec<Value> {
    match field {
        Field::Country => vec![Value::Code(record.country.clone())],
        Field::Topic => vec![record.topic.into()],
        Field::Space => vec![record.space.into()],
        Field::Sex(role) => {
            let people = match role {
                Role::Source => &record.sources,
                Role::Journalist => &record.journalists,
            };
            if people.is_empty() {
                vec![Value::Null]
            } else {
                people.iter().map(|sex| (*sex).into()).collect()
            }
        }
    }
}

impl CountSource for RecordStore {
    fn count_grouped(&self, query: &Query<'_>) -> Result<Vec<GroupCount>> {
        let Some(records) = self.by_medium.get(query.medium) else {
            debug!(medium = query.medium, "no records for medium");
            return Ok(Vec::new());
        };

        let mut counts: BTreeMap<Vec<Value>, u64> = BTreeMap::new();
        for record in records {
            if !query.countries.contains(&record.country) {
                continue;
            }
            if query.space.is_some() && record.space != query.space {
                continue;
            }
            // Cartesian product of the grouped fields' values.
            let mut keys: Vec<Vec<Value>> = vec![Vec::with_capacity(query.group_by.len())];
            for field in &query.group_by {
                let values = field_values(record, *field);
                keys = keys
                    .into_iter()
                    .flat_map(|key| {
                        values.iter().map(move |v| {
                            let mut next = key.clone();
                            next.push(v.clone());
                            next
                        })
                    })
                    .collect();
            }
            for key in keys {
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        debug!(
            medium = query.medium,
            fields = ?query.group_by,
            groups = counts.len(),
            "grouped count"
        );
        Ok(counts.into_iter().collect())
    }
}
