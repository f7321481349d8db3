// src/event/mod.rs
pub mod fields;

use crate::error::{Error, Result};
use crate::parse::RawRecord;
use crate::table::row::{ColumnWidths, RowKind, TableRow};
use std::sync::Arc;
use tracing::{debug, warn};

const CATEGORY_FIELD: &str = "Kategorie";
const CATEGORY_SEPARATOR: &str = ", ";

/// Whether the cross-reference row has been derived yet.
#[derive(Debug, Clone)]
enum ReducedRow {
    NotBuilt,
    Built(Arc<TableRow>),
}

/// One schedule entry of the feed together with its table representations.
///
/// The full row is built on construction. The first table asking for a row
/// becomes the event's home and receives the full row; every later table gets
/// the reduced row, which points back to that home.
#[derive(Debug, Clone)]
pub struct Event {
    record: RawRecord,
    widths: ColumnWidths,
    categories: Vec<String>,
    kind: String,
    region: String,
    responsible: String,
    regular_time: String,
    date: String,
    full_row: Arc<TableRow>,
    home: Option<String>,
    reduced_row: ReducedRow,
}

impl Event {
    pub fn new(record: RawRecord) -> Result<Self> {
        Self::with_widths(record, ColumnWidths::default())
    }

    pub fn with_widths(record: RawRecord, widths: ColumnWidths) -> Result<Self> {
        let categories: Vec<String> = fields::concatenate(&record, &[CATEGORY_FIELD])
            .split(CATEGORY_SEPARATOR)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if categories.is_empty() {
            return Err(Error::MissingRequiredField {
                record: record.tag().to_string(),
                field: CATEGORY_FIELD,
            });
        }

        let kind = fields::concatenate(&record, &["Kursart"]);
        let region = fields::concatenate(&record, &["Ort"]);
        let responsible = fields::concatenate(&record, &["Leiter"]);
        let regular_time = fields::regular_time(&record);
        let date = match fields::date(&record) {
            d if d.is_empty() => regular_time.clone(),
            d => d,
        };

        let full_row = Arc::new(TableRow::fixed_width(
            RowKind::Full,
            [
                fields::concatenate(&record, &["Bezeichnung"]),
                regular_time.clone(),
                region.clone(),
                fields::concatenate(&record, &["Terminbeschreibung"]),
                fields::concatenate(&record, &["Zielgruppe"]),
                fields::concatenate(&record, &["Voraussetzungen"]),
                responsible.clone(),
            ],
            widths,
        ));

        Ok(Self {
            record,
            widths,
            categories,
            kind,
            region,
            responsible,
            regular_time,
            date,
            full_row,
            home: None,
            reduced_row: ReducedRow::NotBuilt,
        })
    }

    /// The row to append to the table titled `subtable_title`: the full row
    /// for the first table asking, the reduced row for every later one.
    pub fn table_row(&mut self, subtable_title: &str) -> Arc<TableRow> {
        if let ReducedRow::Built(row) = &self.reduced_row {
            return Arc::clone(row);
        }
        self.full_row(Some(subtable_title))
    }

    /// Hand out the full row, recording `subtable_title` as the event's home
    /// if none is known yet and deriving the reduced row once it is.
    pub fn full_row(&mut self, subtable_title: Option<&str>) -> Arc<TableRow> {
        match subtable_title.filter(|t| !t.is_empty()) {
            Some(title) => self.register_home(title),
            None if self.home.is_none() => warn!(
                event = %self.title(),
                "full row requested without a subtable title and none was given before; \
                 the reduced row cannot reference its home"
            ),
            None => {}
        }
        if self.home.is_some() {
            self.derive_reduced_row();
        }
        Arc::clone(&self.full_row)
    }

    /// Record the table holding the full row. The first title wins.
    pub fn register_home(&mut self, title: &str) {
        match &self.home {
            None => self.home = Some(title.to_string()),
            Some(home) if home != title => {
                debug!(event = %self.title(), home = %home, ignored = %title, "home already registered")
            }
            Some(_) => {}
        }
    }

    /// Build the reduced row pointing to the registered home. Does nothing if
    /// it already exists or no home is known.
    pub fn derive_reduced_row(&mut self) {
        if let ReducedRow::Built(_) = self.reduced_row {
            return;
        }
        let Some(home) = self.home.as_deref() else {
            return;
        };
        let row = TableRow::fixed_width(
            RowKind::Reduced,
            [
                fields::concatenate(&self.record, &["Bezeichnung"]),
                self.regular_time.clone(),
                self.region.clone(),
                fields::description(&self.record, Some(home)),
                String::new(),
                String::new(),
                self.responsible.clone(),
            ],
            self.widths,
        );
        self.reduced_row = ReducedRow::Built(Arc::new(row));
    }

    pub fn reduced_row(&self) -> Option<Arc<TableRow>> {
        match &self.reduced_row {
            ReducedRow::Built(row) => Some(Arc::clone(row)),
            ReducedRow::NotBuilt => None,
        }
    }

    pub fn home(&self) -> Option<&str> {
        self.home.as_deref()
    }

    pub fn record(&self) -> &RawRecord {
        &self.record
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn responsible(&self) -> &str {
        &self.responsible
    }

    pub fn regular_time(&self) -> &str {
        &self.regular_time
    }

    /// Date ranges if the feed has any, otherwise the regular meeting time.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Name used in logs and error messages.
    pub fn title(&self) -> String {
        match fields::concatenate(&self.record, &["Bezeichnung"]) {
            t if t.is_empty() => format!("<{}>", self.record.tag()),
            t => t,
        }
    }
}
