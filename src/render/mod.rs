// src/render/mod.rs
use crate::error::Result;
use crate::table::row::TableRow;
use crate::table::EventTable;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::{debug, info};

/// Turns aggregated tables into an output document.
pub trait DocumentRenderer {
    fn render(&self, tables: &[EventTable], output: &Path) -> Result<()>;
}

const PT_PER_MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const CELL_PADDING_MM: f32 = 1.0;

const BODY_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const BODY_SIZE: f32 = 7.0;
const HEADING_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 14.0;
/// Average Helvetica glyph width relative to the font size.
const GLYPH_WIDTH: f32 = 0.5;

fn mm(v: f32) -> f32 {
    v * PT_PER_MM
}

/// A4 portrait PDF with each table as a heading followed by bordered rows.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    title: Option<String>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Lay out all pages in memory.
    pub fn build(&self, tables: &[EventTable]) -> Result<Document> {
        let mut layout = PageLayout::new();
        if let Some(title) = &self.title {
            layout.text_line(title, BOLD_FONT, TITLE_SIZE);
        }
        for table in tables {
            if table.is_empty() {
                debug!(table = %table.name(), "skipping empty table");
                continue;
            }
            layout.text_line(table.name(), BOLD_FONT, HEADING_SIZE);
            for row in table.rows() {
                layout.row(row);
            }
        }
        layout.into_document()
    }
}

impl DocumentRenderer for PdfRenderer {
    #[tracing::instrument(level = "info", skip(self, tables, output), fields(tables = tables.len(), output = %output.display()))]
    fn render(&self, tables: &[EventTable], output: &Path) -> Result<()> {
        let mut doc = self.build(tables)?;
        let pages = doc.get_pages().len();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        doc.compress();
        doc.save(output)?;
        info!(pages, "document written");
        Ok(())
    }
}

/// Cursor over the pages being filled, top to bottom.
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    /// Baseline cursor in points from the page bottom.
    y: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: Self::top(),
        }
    }

    fn top() -> f32 {
        mm(PAGE_HEIGHT_MM - MARGIN_MM)
    }

    fn left() -> f32 {
        mm((PAGE_WIDTH_MM - crate::table::row::TABLE_WIDTH_MM) / 2.0)
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `pages` is never empty
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Start a new page unless `height` still fits on this one.
    fn reserve(&mut self, height: f32) {
        let at_top = (self.y - Self::top()).abs() < f32::EPSILON;
        if !at_top && self.y - height < mm(MARGIN_MM) {
            self.pages.push(Vec::new());
            self.y = Self::top();
        }
    }

    fn text_line(&mut self, text: &str, font: &str, size: f32) {
        let height = size * 1.6;
        self.reserve(height);
        let baseline = self.y - size;
        let x = Self::left();
        self.ops().extend(text_ops(text, font, size, x, baseline));
        self.y -= height;
    }

    fn row(&mut self, row: &TableRow) {
        let leading = BODY_SIZE * 1.2;
        let pad = mm(CELL_PADDING_MM);
        let widths: Vec<f32> = row.column_widths().widths_mm().iter().map(|w| mm(*w)).collect();
        let wrapped: Vec<Vec<String>> = row
            .cells()
            .iter()
            .zip(&widths)
            .map(|(cell, width)| wrap(cell, chars_per_line(*width - 2.0 * pad, BODY_SIZE)))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let height = lines as f32 * leading + 2.0 * pad;

        self.reserve(height);
        let top = self.y;
        let mut x = Self::left();
        let mut ops = Vec::new();
        for (cell_lines, width) in wrapped.iter().zip(&widths) {
            ops.push(Operation::new(
                "re",
                vec![x.into(), (top - height).into(), (*width).into(), height.into()],
            ));
            ops.push(Operation::new("S", vec![]));
            for (i, line) in cell_lines.iter().enumerate() {
                let baseline = top - pad - BODY_SIZE - i as f32 * leading;
                ops.extend(text_ops(line, BODY_FONT, BODY_SIZE, x + pad, baseline));
            }
            x += width;
        }
        self.ops().extend(ops);
        self.y -= height;
    }

    fn into_document(self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let body_font = doc.add_object(font("Helvetica"));
        let bold_font = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                BODY_FONT => body_font,
                BOLD_FONT => bold_font,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.0f32.into(),
                0.0f32.into(),
                mm(PAGE_WIDTH_MM).into(),
                mm(PAGE_HEIGHT_MM).into(),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text_ops(text: &str, font: &str, size: f32, x: f32, baseline: f32) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

fn chars_per_line(width: f32, size: f32) -> usize {
    ((width / (size * GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Break `text` into lines of at most `max` characters, keeping explicit
/// line breaks and splitting on whitespace where possible.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.len();
            if needed > max && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Encode for the built-in fonts' WinAnsi encoding; unmappable characters
/// become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}
