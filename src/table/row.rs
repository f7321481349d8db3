// src/table/row.rs
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const COLUMN_COUNT: usize = 7;

/// Printable width of every table, in millimetres.
pub const TABLE_WIDTH_MM: f32 = 178.0;

/// Fixed column widths in mm; the entry at `FLEXIBLE_COLUMN` is ignored and
/// replaced by whatever is left of the table width.
const DEFAULT_FIXED_WIDTHS: [f32; COLUMN_COUNT] = [8.0, 13.0, 19.0, 18.0, 0.0, 18.0, 48.0];
const FLEXIBLE_COLUMN: usize = 4;

/// Column layout as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    #[serde(default = "default_table_width")]
    pub table_width: f32,
    pub widths: [f32; COLUMN_COUNT],
    #[serde(default = "default_flexible")]
    pub flexible: usize,
}

fn default_table_width() -> f32 {
    TABLE_WIDTH_MM
}

fn default_flexible() -> usize {
    FLEXIBLE_COLUMN
}

/// Widths are kept in hundredths of a millimetre so the columns add up to the
/// table width exactly.
const UNITS_PER_MM: f32 = 100.0;

fn to_units(mm: f32) -> Option<u32> {
    let units = (mm * UNITS_PER_MM).round();
    (mm.is_finite() && units > 0.0 && units <= u32::MAX as f32).then_some(units as u32)
}

fn to_mm(units: u32) -> f32 {
    units as f32 / UNITS_PER_MM
}

/// Resolved widths of the seven columns; always sums to the table width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    units: [u32; COLUMN_COUNT],
}

impl ColumnWidths {
    /// Resolve a layout, computing the flexible column as the remainder.
    /// Widths are rounded to 0.01 mm; the table width must already be on
    /// that grid.
    pub fn from_layout(layout: &ColumnLayout) -> Result<Self> {
        let invalid = || Error::InvalidColumnWidths {
            fixed: layout.widths.to_vec(),
            table_width: layout.table_width,
        };
        if layout.flexible >= COLUMN_COUNT {
            return Err(invalid());
        }
        let table = to_units(layout.table_width).ok_or_else(invalid)?;
        if to_mm(table) != layout.table_width {
            return Err(invalid());
        }
        let mut units = [0u32; COLUMN_COUNT];
        for (i, width) in layout.widths.iter().enumerate() {
            if i != layout.flexible {
                units[i] = to_units(*width).ok_or_else(invalid)?;
            }
        }
        let fixed: u64 = units.iter().map(|u| u64::from(*u)).sum();
        units[layout.flexible] = u64::from(table)
            .checked_sub(fixed)
            .filter(|rest| *rest > 0)
            .and_then(|rest| u32::try_from(rest).ok())
            .ok_or_else(invalid)?;
        Ok(Self { units })
    }

    /// Column widths in mm, left to right.
    pub fn widths_mm(&self) -> [f32; COLUMN_COUNT] {
        self.units.map(to_mm)
    }

    pub fn total(&self) -> f32 {
        to_mm(self.units.iter().sum())
    }
}

impl Default for ColumnWidths {
    fn default() -> Self {
        let mut units = DEFAULT_FIXED_WIDTHS.map(|w| (w * UNITS_PER_MM) as u32);
        units[FLEXIBLE_COLUMN] = 0;
        let fixed: u32 = units.iter().sum();
        units[FLEXIBLE_COLUMN] = (TABLE_WIDTH_MM * UNITS_PER_MM) as u32 - fixed;
        Self { units }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            table_width: TABLE_WIDTH_MM,
            widths: DEFAULT_FIXED_WIDTHS,
            flexible: FLEXIBLE_COLUMN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Every detail of the event.
    Full,
    /// Short version pointing to the table that holds the full row.
    Reduced,
}

/// One fixed-width table row of seven text cells. Line breaks inside a cell
/// are `\n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    kind: RowKind,
    cells: [String; COLUMN_COUNT],
    widths: ColumnWidths,
}

impl TableRow {
    pub fn fixed_width(kind: RowKind, cells: [String; COLUMN_COUNT], widths: ColumnWidths) -> Self {
        Self { kind, cells, widths }
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn column_widths(&self) -> &ColumnWidths {
        &self.widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_widths_fill_the_table() {
        let widths = ColumnWidths::default();
        assert_eq!(widths.widths_mm()[FLEXIBLE_COLUMN], 54.0);
        assert_eq!(widths.total(), TABLE_WIDTH_MM);
        assert_eq!(ColumnWidths::from_layout(&ColumnLayout::default()).unwrap(), widths);
    }

    #[test]
    fn custom_layout_sums_to_table_width() {
        let layout = ColumnLayout {
            table_width: 178.0,
            widths: [20.0, 20.0, 20.0, 20.0, 20.0, 99.0, 20.0],
            flexible: 5,
        };
        let widths = ColumnWidths::from_layout(&layout).unwrap();
        assert_eq!(widths.widths_mm()[5], 58.0);
        assert_eq!(widths.total(), 178.0);
    }

    #[test]
    fn fractional_layouts_sum_exactly() {
        let layouts = [
            [12.650001, 5.84, 10.43, 4.2200003, 0.0, 23.81, 19.51],
            [0.01, 29.99, 7.77, 13.13, 0.0, 21.05, 3.3],
            [8.1, 13.2, 19.3, 18.4, 0.0, 18.5, 48.6],
        ];
        for widths in layouts {
            let layout = ColumnLayout {
                widths,
                ..ColumnLayout::default()
            };
            let resolved = ColumnWidths::from_layout(&layout).unwrap();
            assert_eq!(resolved.total(), TABLE_WIDTH_MM, "{widths:?}");
        }

        let odd_table = ColumnLayout {
            table_width: 177.3,
            widths: [12.34, 5.67, 8.9, 10.11, 0.0, 12.13, 14.15],
            flexible: 4,
        };
        assert_eq!(ColumnWidths::from_layout(&odd_table).unwrap().total(), 177.3);
    }

    #[test]
    fn overfull_layout_is_rejected() {
        let layout = ColumnLayout {
            widths: [50.0, 50.0, 50.0, 28.0, 0.0, 1.0, 1.0],
            ..ColumnLayout::default()
        };
        assert!(matches!(
            ColumnWidths::from_layout(&layout),
            Err(Error::InvalidColumnWidths { .. })
        ));

        let out_of_range = ColumnLayout {
            flexible: 7,
            ..ColumnLayout::default()
        };
        assert!(ColumnWidths::from_layout(&out_of_range).is_err());

        let off_grid = ColumnLayout {
            table_width: 178.005,
            ..ColumnLayout::default()
        };
        assert!(ColumnWidths::from_layout(&off_grid).is_err());
    }

    #[test]
    fn rows_are_plain_values() {
        let cells = || ["a", "b", "c", "d", "e", "f", "g"].map(String::from);
        let a = TableRow::fixed_width(RowKind::Full, cells(), ColumnWidths::default());
        let b = TableRow::fixed_width(RowKind::Full, cells(), ColumnWidths::default());
        assert_eq!(a, b);
        assert_eq!(a.cells().len(), COLUMN_COUNT);
    }
}
