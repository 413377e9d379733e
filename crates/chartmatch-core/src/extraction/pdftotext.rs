use std::path::Path;
use std::process::Command;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ChartMatchError;
use crate::extraction::table::detect_tables;
use crate::extraction::{BBox, PageTables, TableExtractor, TextFragment};

/// Horizontal gap between two words of one pdftotext line that marks a new cell.
const CELL_GAP: f32 = 8.0;

/// Table extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox-layout` to get word positions, then rebuilds the
/// table grid from them.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExtractor for PdftotextExtractor {
    fn extract_tables(&self, pdf_path: &Path) -> Result<Vec<PageTables>, ChartMatchError> {
        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(pdf_path)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ChartMatchError::PdftotextNotFound
                } else {
                    ChartMatchError::Extraction(format!("pdftotext -bbox-layout failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ChartMatchError::PdftotextFailed {
                path: pdf_path.to_path_buf(),
                code,
                stderr,
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xml(&xml);

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, fragments)| PageTables {
                page_number: i + 1,
                tables: detect_tables(&fragments),
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[derive(Debug, Clone)]
struct Word {
    text: String,
    bbox: BBox,
}

/// Parse `pdftotext -bbox-layout` output into text fragments per page.
///
/// Malformed XML ends parsing; pages read up to that point are kept and the
/// rest come back empty-handed.
fn parse_bbox_xml(xml: &str) -> Vec<Vec<TextFragment>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut pages: Vec<Vec<TextFragment>> = Vec::new();
    let mut line_words: Vec<Word> = Vec::new();
    let mut word_bbox: Option<BBox> = None;
    let mut word_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => pages.push(Vec::new()),
                b"line" => line_words.clear(),
                b"word" => {
                    word_bbox = parse_bbox(&e);
                    word_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if word_bbox.is_some() {
                    match t.unescape() {
                        Ok(text) => word_text.push_str(&text),
                        Err(e) => tracing::debug!(error = %e, "skipping undecodable word text"),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"word" => {
                    if let Some(bbox) = word_bbox.take() {
                        let text = word_text.trim();
                        if !text.is_empty() {
                            line_words.push(Word {
                                text: text.to_string(),
                                bbox,
                            });
                        }
                    }
                }
                b"line" => {
                    if let Some(page) = pages.last_mut() {
                        page.extend(split_line(&line_words));
                    }
                    line_words.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    "pdftotext output is not well-formed; ignoring the rest"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    pages
}

/// Break one pdftotext line into fragments wherever words are far apart.
fn split_line(words: &[Word]) -> Vec<TextFragment> {
    let mut fragments: Vec<TextFragment> = Vec::new();
    for word in words {
        match fragments.last_mut() {
            Some(last) if word.bbox.x_min - last.bbox.x_max <= CELL_GAP => {
                last.text.push(' ');
                last.text.push_str(&word.text);
                last.bbox.x_max = last.bbox.x_max.max(word.bbox.x_max);
                last.bbox.y_min = last.bbox.y_min.min(word.bbox.y_min);
                last.bbox.y_max = last.bbox.y_max.max(word.bbox.y_max);
            }
            _ => fragments.push(TextFragment {
                text: word.text.clone(),
                bbox: word.bbox,
            }),
        }
    }
    fragments
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    let mut x_min = None;
    let mut y_min = None;
    let mut x_max = None;
    let mut y_max = None;

    for attr in tag.attributes().flatten() {
        let value: Option<f32> = attr
            .unescape_value()
            .ok()
            .and_then(|v| v.trim().parse().ok());
        match attr.key.as_ref() {
            b"xMin" => x_min = value,
            b"yMin" => y_min = value,
            b"xMax" => x_max = value,
            b"yMax" => y_max = value,
            _ => {}
        }
    }

    Some(BBox {
        x_min: x_min?,
        y_min: y_min?,
        x_max: x_max?,
        y_max: y_max?,
    })
}
