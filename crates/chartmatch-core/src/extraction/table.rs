//! Reconstruct table regions from positioned text on one page.
//!
//! Fragments sharing a baseline form a visual row. Consecutive rows with at
//! least two fragments form a table region. A lone fragment directly above a
//! region is its caption and becomes the header row, unless the region's first
//! row already carries the clinic banner; otherwise the first region row is the
//! header. Inside a region, a lone fragment in the label column is a label with
//! a blank value, and one further right is a wrapped value that joins the cell
//! above it.

use crate::extraction::split::is_clinic_header;
use crate::extraction::{RawTable, TextFragment};

/// Vertical slack when deciding whether a fragment sits on an existing row.
const ROW_TOLERANCE: f32 = 2.0;

/// Left edges closer than this belong to the same column.
const COLUMN_SNAP: f32 = 12.0;

/// Largest gap, in row heights, between two rows of one region.
const ROW_GAP: f32 = 1.5;

/// Largest gap, in row heights, between a caption and the region below it.
const CAPTION_GAP: f32 = 2.0;

#[derive(Debug, Clone)]
struct VisualRow<'a> {
    y_min: f32,
    y_max: f32,
    cells: Vec<&'a TextFragment>,
}

impl VisualRow<'_> {
    fn left(&self) -> f32 {
        self.cells.first().map(|c| c.bbox.x_min).unwrap_or(0.0)
    }

    fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(1.0)
    }

    /// Vertical space between the bottom of `self` and the top of `below`.
    fn gap_to(&self, below: &VisualRow<'_>) -> f32 {
        below.y_min - self.y_max
    }

    fn has_banner(&self) -> bool {
        self.cells.iter().any(|c| is_clinic_header(&c.text))
    }
}

#[derive(Debug)]
struct Region<'a> {
    caption: Option<VisualRow<'a>>,
    rows: Vec<VisualRow<'a>>,
}

pub fn detect_tables(fragments: &[TextFragment]) -> Vec<RawTable> {
    let rows = group_rows(fragments);
    find_table_regions(rows)
        .into_iter()
        .map(build_table)
        .filter(|t| t.column_count() >= 2)
        .collect()
}

/// Group fragments into visual rows, top to bottom, each sorted left to right.
fn group_rows(fragments: &[TextFragment]) -> Vec<VisualRow<'_>> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .y_min
            .total_cmp(&b.bbox.y_min)
            .then(a.bbox.x_min.total_cmp(&b.bbox.x_min))
    });

    let mut rows: Vec<VisualRow> = Vec::new();
    for fragment in sorted {
        let center = fragment.bbox.y_center();
        match rows.last_mut() {
            Some(row)
                if center >= row.y_min - ROW_TOLERANCE && center <= row.y_max + ROW_TOLERANCE =>
            {
                row.y_min = row.y_min.min(fragment.bbox.y_min);
                row.y_max = row.y_max.max(fragment.bbox.y_max);
                row.cells.push(fragment);
            }
            _ => rows.push(VisualRow {
                y_min: fragment.bbox.y_min,
                y_max: fragment.bbox.y_max,
                cells: vec![fragment],
            }),
        }
    }

    for row in &mut rows {
        row.cells
            .sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));
    }
    rows
}

fn find_table_regions(rows: Vec<VisualRow<'_>>) -> Vec<Region<'_>> {
    let mut regions = Vec::new();
    let mut current: Option<Region> = None;
    let mut pending_caption: Option<VisualRow> = None;

    for row in rows {
        if row.cells.len() >= 2 {
            match current.as_mut() {
                Some(region) => region.rows.push(row),
                None => {
                    let caption = pending_caption.take().filter(|c| {
                        c.gap_to(&row) <= CAPTION_GAP * row.height() && !row.has_banner()
                    });
                    current = Some(Region {
                        caption,
                        rows: vec![row],
                    })
                }
            }
            continue;
        }

        // A lone fragment: a blank-valued label or a wrapped value inside the
        // region, or text outside any table.
        let stays = current.as_ref().is_some_and(|region| {
            let (Some(first), Some(previous)) = (region.rows.first(), region.rows.last()) else {
                return false;
            };
            let close = previous.gap_to(&row) <= ROW_GAP * previous.height();
            let outdented = row.left() < first.left() - COLUMN_SNAP;
            close && !outdented
        });
        if stays {
            if let Some(region) = current.as_mut() {
                region.rows.push(row);
            }
            continue;
        }

        if let Some(region) = current.take() {
            regions.push(region);
        }
        pending_caption = Some(row);
    }

    if let Some(region) = current {
        regions.push(region);
    }
    regions
}

fn build_table(region: Region<'_>) -> RawTable {
    let (header_row, body): (Option<&VisualRow>, &[VisualRow]) = match &region.caption {
        Some(caption) => (Some(caption), region.rows.as_slice()),
        None => match region.rows.split_first() {
            Some((first, rest)) => (Some(first), rest),
            None => (None, &[]),
        },
    };

    let anchors = column_anchors(body.iter().chain(header_row));
    let width = anchors.len();

    let header = match header_row {
        Some(row) => place_cells(row, &anchors),
        None => vec![String::new(); width],
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in body {
        let cells = place_cells(row, &anchors);
        let wrapped = match row.cells.as_slice() {
            [only] => column_for(only.bbox.x_min, &anchors) > 0,
            _ => false,
        };
        match rows.last_mut() {
            Some(previous) if wrapped => {
                for (prev, cell) in previous.iter_mut().zip(cells) {
                    append_text(prev, &cell);
                }
            }
            _ => rows.push(cells),
        }
    }

    RawTable { header, rows }
}

/// Cluster fragment left edges into column anchors.
fn column_anchors<'a, 'b: 'a>(rows: impl Iterator<Item = &'a VisualRow<'b>>) -> Vec<f32> {
    let mut edges: Vec<f32> = rows
        .flat_map(|r| r.cells.iter().map(|c| c.bbox.x_min))
        .collect();
    edges.sort_by(f32::total_cmp);

    let mut anchors: Vec<f32> = Vec::new();
    let mut last_edge = f32::NEG_INFINITY;
    for edge in edges {
        if edge - last_edge > COLUMN_SNAP {
            anchors.push(edge);
        }
        last_edge = edge;
    }
    anchors
}

/// Column a fragment starting at `x` falls into.
fn column_for(x: f32, anchors: &[f32]) -> usize {
    anchors
        .iter()
        .rposition(|&a| a <= x + COLUMN_SNAP / 2.0)
        .unwrap_or(0)
}

fn place_cells(row: &VisualRow<'_>, anchors: &[f32]) -> Vec<String> {
    let mut cells = vec![String::new(); anchors.len()];
    for fragment in &row.cells {
        let col = column_for(fragment.bbox.x_min, anchors);
        if let Some(cell) = cells.get_mut(col) {
            append_text(cell, fragment.text.trim());
        }
    }
    cells
}

fn append_text(cell: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !cell.is_empty() {
        cell.push(' ');
    }
    cell.push_str(text);
}
