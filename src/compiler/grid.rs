//! Row layout for character-grid canvases (receipt, text).
//!
//! Elements are painted in z order into row slots. Each row is then written
//! left to right: its segments sorted by column (paint order breaks ties),
//! with spaces inserted to reach each segment's column.
//!
//! ```text
//! col:  0         10        20
//! row0: Item                Qty      <- "Item" @0, "Qty" @20
//! row1: ------------------------     <- hline @0 span 24
//! ```
//!
//! The width of content with an expression is unknown until render time,
//! so such a segment is assumed to fill its span.

use std::collections::BTreeMap;

use super::{EmitContext, WarningCode};
use crate::document::{GridCanvas, GridRect, TextAlign};

/// Most rows one grid compile will print. Elements starting past it are
/// dropped; row spans reaching past it are clipped.
pub const MAX_GRID_ROWS: u32 = 10_000;

/// Widest grid laid out; wider canvases are narrowed to it.
pub const MAX_GRID_COLUMNS: u32 = 1_024;

/// A run of already-formatted output on one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub col: u32,
    /// Columns claimed on the grid.
    pub span: u32,
    /// Alignment padding inside the span, emitted before `fragment`.
    pub lead: u32,
    /// Printed width of `fragment` in columns.
    pub width: u32,
    pub fragment: String,
    /// Printer-side justification to apply to the whole row, for content
    /// whose width is unknown. Used only when the segment is alone on its row.
    pub justify: Option<TextAlign>,
}

/// The grid area an element may occupy after clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub col: u32,
    pub row: u32,
    pub span: u32,
    pub rows: u32,
}

/// Rows being painted for one compile.
pub struct GridLayout {
    columns: u32,
    min_rows: u32,
    auto_grow: bool,
    rows: BTreeMap<u32, Vec<Segment>>,
}

impl GridLayout {
    pub fn new(canvas: &impl GridCanvas) -> Self {
        Self {
            columns: canvas.columns().clamp(1, MAX_GRID_COLUMNS),
            min_rows: canvas.min_rows().min(MAX_GRID_ROWS),
            auto_grow: canvas.auto_grow_rows(),
            rows: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Clip `rect` to the grid. Returns `None`, with a warning, when nothing
    /// of it can be printed.
    pub(crate) fn place(&self, rect: &GridRect, element_id: &str, ctx: &mut EmitContext) -> Option<Placement> {
        let span = rect.col_span.max(1);
        let mut rows = rect.row_span.max(1);

        if rect.col >= self.columns {
            ctx.warn(
                WarningCode::OutOfBounds,
                Some(element_id),
                format!("column {} is past the {}-column grid", rect.col, self.columns),
            );
            return None;
        }

        let limit = if self.auto_grow { MAX_GRID_ROWS } else { self.min_rows };
        if rect.row >= limit {
            ctx.warn(
                WarningCode::OutOfBounds,
                Some(element_id),
                format!("row {} is past the {}-row grid", rect.row, limit),
            );
            return None;
        }
        let available_rows = limit - rect.row;
        if rows > available_rows {
            if !self.auto_grow {
                ctx.warn(
                    WarningCode::OutOfBounds,
                    Some(element_id),
                    format!("row {} is past the {}-row grid", rect.row.saturating_add(rows - 1), limit),
                );
                return None;
            }
            ctx.warn(
                WarningCode::OutOfBounds,
                Some(element_id),
                format!("span of {} rows clipped to {}", rows, available_rows),
            );
            rows = available_rows;
        }

        let available = self.columns - rect.col;
        if span > available {
            ctx.warn(
                WarningCode::OutOfBounds,
                Some(element_id),
                format!("span of {} columns clipped to {}", span, available),
            );
        }
        Some(Placement {
            col: rect.col,
            row: rect.row,
            span: span.min(available),
            rows,
        })
    }

    /// Add a segment to `row`, warning if it covers columns already taken.
    pub(crate) fn paint(&mut self, row: u32, segment: Segment, element_id: &str, ctx: &mut EmitContext) {
        let slot = self.rows.entry(row).or_default();
        let start = segment.col;
        let end = segment.col + segment.span.max(1);
        let overlaps = slot
            .iter()
            .any(|s| start < s.col + s.span.max(1) && s.col < end);
        if overlaps {
            ctx.warn(
                WarningCode::GridOverlap,
                Some(element_id),
                format!("overlaps another element on row {}", row),
            );
        }
        slot.push(segment);
    }

    /// Number of rows to print.
    pub fn row_count(&self) -> u32 {
        let painted = self.rows.keys().next_back().map_or(0, |last| last.saturating_add(1));
        if self.auto_grow {
            painted.max(self.min_rows)
        } else {
            self.min_rows
        }
    }

    /// Segments of every printed row, in column order.
    pub fn rows(&self) -> Vec<Vec<&Segment>> {
        (0..self.row_count())
            .map(|row| {
                let mut segments: Vec<&Segment> = self
                    .rows
                    .get(&row)
                    .map(|s| s.iter().collect())
                    .unwrap_or_default();
                segments.sort_by_key(|s| s.col);
                segments
            })
            .collect()
    }
}

/// Write one row: pad with spaces up to each segment's column.
pub fn write_row(segments: &[&Segment], out: &mut String) {
    let mut cursor = 0;
    for segment in segments {
        if segment.col > cursor {
            pad(out, segment.col - cursor);
            cursor = segment.col;
        }
        pad(out, segment.lead);
        out.push_str(&segment.fragment);
        cursor = cursor.max(segment.col + segment.lead + segment.width);
    }
}

fn pad(out: &mut String, n: u32) {
    out.extend(std::iter::repeat_n(' ', n as usize));
}

/// Leading spaces that place `width` columns of text inside `span`.
pub fn align_offset(align: TextAlign, width: u32, span: u32) -> u32 {
    let free = span.saturating_sub(width);
    match align {
        TextAlign::Left => 0,
        TextAlign::Center => free / 2,
        TextAlign::Right => free,
    }
}

/// First `max` characters of `s`.
pub fn clip_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextCanvas;

    fn segment(col: u32, fragment: &str) -> Segment {
        let width = fragment.chars().count() as u32;
        Segment {
            col,
            span: width,
            lead: 0,
            width,
            fragment: fragment.to_string(),
            justify: None,
        }
    }

    fn canvas(columns: u32, min_rows: u32, auto_grow_rows: bool) -> TextCanvas {
        TextCanvas {
            columns,
            min_rows,
            auto_grow_rows,
            cell_mm: None,
        }
    }

    #[test]
    fn test_row_padding_in_column_order() {
        let mut ctx = EmitContext::new();
        let mut grid = GridLayout::new(&canvas(30, 1, true));
        grid.paint(0, segment(20, "Qty"), "b", &mut ctx);
        grid.paint(0, segment(0, "Item"), "a", &mut ctx);

        let rows = grid.rows();
        let mut out = String::new();
        write_row(&rows[0], &mut out);
        assert_eq!(out, format!("Item{}Qty", " ".repeat(16)));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_overlap_kept_and_warned() {
        let mut ctx = EmitContext::new();
        let mut grid = GridLayout::new(&canvas(30, 1, true));
        grid.paint(0, segment(0, "Hello"), "a", &mut ctx);
        grid.paint(0, segment(3, "XY"), "b", &mut ctx);

        let mut out = String::new();
        write_row(&grid.rows()[0], &mut out);
        assert_eq!(out, "HelloXY");
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].code, WarningCode::GridOverlap);
    }

    #[test]
    fn test_rows_grow_past_min() {
        let mut ctx = EmitContext::new();
        let mut grid = GridLayout::new(&canvas(10, 2, true));
        assert_eq!(grid.row_count(), 2);
        grid.paint(4, segment(0, "x"), "a", &mut ctx);
        assert_eq!(grid.row_count(), 5);
    }

    #[test]
    fn test_place_without_growth() {
        let mut ctx = EmitContext::new();
        let grid = GridLayout::new(&canvas(10, 2, false));
        assert!(grid.place(&GridRect::new(0, 1, 5, 1), "ok", &mut ctx).is_some());
        assert!(grid.place(&GridRect::new(0, 2, 5, 1), "low", &mut ctx).is_none());
        assert_eq!(ctx.warnings.len(), 1);
        assert_eq!(ctx.warnings[0].code, WarningCode::OutOfBounds);
    }

    #[test]
    fn test_place_last_representable_row() {
        for auto_grow in [true, false] {
            let mut ctx = EmitContext::new();
            let grid = GridLayout::new(&canvas(10, 2, auto_grow));
            assert!(grid.place(&GridRect::new(0, u32::MAX, 5, 1), "far", &mut ctx).is_none());
            let tall = grid.place(&GridRect::new(0, 1, 5, u32::MAX), "tall", &mut ctx);
            assert_eq!(tall.is_some(), auto_grow);
            assert_eq!(ctx.warnings.len(), 2);
            assert!(ctx.warnings.iter().all(|w| w.code == WarningCode::OutOfBounds));
        }
    }

    #[test]
    fn test_row_span_clipped_to_max_rows() {
        let mut ctx = EmitContext::new();
        let grid = GridLayout::new(&canvas(10, 1, true));
        let placement = grid
            .place(&GridRect::new(0, MAX_GRID_ROWS - 3, 5, 3_000_000), "rule", &mut ctx)
            .unwrap();
        assert_eq!(placement.rows, 3);
        assert_eq!(ctx.warnings[0].code, WarningCode::OutOfBounds);
    }

    #[test]
    fn test_oversized_canvas_is_bounded() {
        let mut ctx = EmitContext::new();
        let mut grid = GridLayout::new(&canvas(u32::MAX, u32::MAX, false));
        assert_eq!(grid.columns(), MAX_GRID_COLUMNS);
        assert_eq!(grid.row_count(), MAX_GRID_ROWS);
        grid.paint(MAX_GRID_ROWS - 1, segment(0, "x"), "a", &mut ctx);
        assert_eq!(grid.rows().len(), MAX_GRID_ROWS as usize);
    }

    #[test]
    fn test_place_clips_columns() {
        let mut ctx = EmitContext::new();
        let grid = GridLayout::new(&canvas(10, 1, true));
        let placement = grid.place(&GridRect::new(6, 0, 8, 1), "wide", &mut ctx).unwrap();
        assert_eq!(placement.span, 4);
        assert!(grid.place(&GridRect::new(10, 0, 1, 1), "off", &mut ctx).is_none());
        assert_eq!(ctx.warnings.len(), 2);
    }

    #[test]
    fn test_align_offset() {
        assert_eq!(align_offset(TextAlign::Left, 4, 10), 0);
        assert_eq!(align_offset(TextAlign::Center, 4, 10), 3);
        assert_eq!(align_offset(TextAlign::Right, 4, 10), 6);
        assert_eq!(align_offset(TextAlign::Right, 12, 10), 0);
    }

    #[test]
    fn test_clip_chars() {
        assert_eq!(clip_chars("héllo", 2), "hé");
        assert_eq!(clip_chars("hi", 5), "hi");
    }
}
