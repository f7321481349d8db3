// src/table/mod.rs
pub mod row;

use crate::error::{Error, Result};
use crate::event::Event;
use row::TableRow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Which events belong into a table: those practising one of `activities`,
/// at one of `locations` if any are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}

impl TableDefinition {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        locations: impl IntoIterator<Item = S>,
        activities: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            locations: locations.into_iter().map(Into::into).collect(),
            activities: activities.into_iter().map(Into::into).collect(),
        }
    }

    /// An event matches when one of its categories is a listed activity and,
    /// if locations are listed, one of its categories or its region is a
    /// listed location.
    pub fn matches(&self, event: &Event) -> bool {
        let categories = event.categories();
        let activity = self.activities.iter().any(|a| categories.contains(a));
        let location = self.locations.is_empty()
            || self
                .locations
                .iter()
                .any(|l| categories.contains(l) || l == event.region());
        activity && location
    }
}

/// All rows collected for one table definition, in the order events were
/// supplied.
#[derive(Debug, Clone)]
pub struct EventTable {
    definition: TableDefinition,
    rows: Vec<Arc<TableRow>>,
}

impl EventTable {
    pub fn new(definition: TableDefinition) -> Self {
        Self {
            definition,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Arc<TableRow>) {
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn locations(&self) -> &[String] {
        &self.definition.locations
    }

    pub fn activities(&self) -> &[String] {
        &self.definition.activities
    }

    pub fn rows(&self) -> &[Arc<TableRow>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Distribute `events` over tables built from `definitions`.
///
/// Tables keep definition order and rows keep event order. The first table
/// an event lands in receives its full row; later tables get the reduced row.
/// An event no table accepts is an error.
pub fn aggregate(definitions: &[TableDefinition], events: &mut [Event]) -> Result<Vec<EventTable>> {
    let mut tables: Vec<EventTable> = definitions.iter().cloned().map(EventTable::new).collect();

    for event in events.iter_mut() {
        let mut matched = 0usize;
        for table in tables.iter_mut() {
            if !table.definition.matches(event) {
                continue;
            }
            let row = event.table_row(table.name());
            table.add_row(row);
            matched += 1;
        }
        if matched == 0 {
            return Err(Error::UnmatchedEvent {
                event: event.title(),
                categories: event.categories().join(", "),
            });
        }
        debug!(event = %event.title(), tables = matched, home = ?event.home(), "placed event");
    }

    for table in &tables {
        debug!(table = %table.name(), rows = table.rows().len(), "table assembled");
    }
    info!(tables = tables.len(), events = events.len(), "aggregated events into tables");
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::row::{RowKind, COLUMN_COUNT};
    use super::*;
    use crate::parse::RawRecord;

    fn event(title: &str, categories: &str, region: &str) -> Event {
        Event::new(
            RawRecord::new("Kurs")
                .with_field("Bezeichnung", title)
                .with_field("Kategorie", categories)
                .with_field("Ort", region),
        )
        .unwrap()
    }

    fn hiking_tables() -> Vec<TableDefinition> {
        vec![
            TableDefinition::new("Hiking@ParkA", ["ParkA"], ["hiking"]),
            TableDefinition::new("AllHiking", Vec::<String>::new(), vec!["hiking".to_string()]),
        ]
    }

    #[test]
    fn first_table_owns_full_row() {
        let mut events = vec![event("Walk", "hiking", "ParkA")];
        let tables = aggregate(&hiking_tables(), &mut events).unwrap();

        assert_eq!(tables[0].name(), "Hiking@ParkA");
        assert_eq!(tables[1].name(), "AllHiking");
        let full = &tables[0].rows()[0];
        let reduced = &tables[1].rows()[0];
        assert_eq!(full.kind(), RowKind::Full);
        assert_eq!(reduced.kind(), RowKind::Reduced);
        assert_eq!(full.cells().len(), COLUMN_COUNT);
        assert_eq!(reduced.cells().len(), COLUMN_COUNT);
        assert!(reduced.cells()[3].contains("Mehr Infos unter Hiking@ParkA."));
        assert_eq!(events[0].home(), Some("Hiking@ParkA"));
    }

    #[test]
    fn definition_order_decides_the_home() {
        let mut defs = hiking_tables();
        defs.reverse();
        let mut events = vec![event("Walk", "hiking", "ParkA")];
        let tables = aggregate(&defs, &mut events).unwrap();
        assert_eq!(tables[0].name(), "AllHiking");
        assert_eq!(tables[0].rows()[0].kind(), RowKind::Full);
        assert_eq!(tables[1].rows()[0].kind(), RowKind::Reduced);
    }

    #[test]
    fn location_filter_applies() {
        let mut events = vec![
            event("Walk", "hiking", "ParkB"),
            event("Tour", "hiking, ParkA", ""),
            event("Run", "hiking", "ParkA"),
        ];
        let tables = aggregate(&hiking_tables(), &mut events).unwrap();

        let park: Vec<_> = tables[0].rows().iter().map(|r| r.cells()[0].clone()).collect();
        let all: Vec<_> = tables[1].rows().iter().map(|r| r.cells()[0].clone()).collect();
        assert_eq!(park, ["Tour", "Run"]);
        assert_eq!(all, ["Walk", "Tour", "Run"]);
        assert_eq!(tables[1].rows()[0].kind(), RowKind::Full);
        assert_eq!(tables[1].rows()[1].kind(), RowKind::Reduced);
    }

    #[test]
    fn unmatched_event_is_an_error() {
        let mut events = vec![event("Walk", "hiking", "ParkA"), event("Climb", "climbing", "")];
        let err = aggregate(&hiking_tables(), &mut events).unwrap_err();
        match err {
            Error::UnmatchedEvent { event, categories } => {
                assert_eq!(event, "Climb");
                assert_eq!(categories, "climbing");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn table_without_matches_stays_empty() {
        let mut defs = hiking_tables();
        defs.push(TableDefinition::new("Climbing", Vec::<&str>::new(), vec!["climbing"]));
        let mut events = vec![event("Walk", "hiking", "ParkA")];
        let tables = aggregate(&defs, &mut events).unwrap();
        assert!(tables[2].is_empty());
        assert_eq!(tables[2].activities(), ["climbing"]);
        assert!(tables[1].locations().is_empty());
    }
}
