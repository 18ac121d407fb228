//! PDF export of saved activities
//!
//! A4 pages, Helvetica. Each activity gets an "Aktivitet N:" heading, its text,
//! a "Refleksioner:" heading and the reflection (a dash when empty). Text is
//! wrapped to a fixed column width and flows onto new pages as needed.

use crate::db::Activity;
use crate::error::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "aktiviteter.pdf";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_X: i64 = 28;
const MARGIN_TOP: i64 = 28;
const MARGIN_BOTTOM: i64 = 36;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Characters per wrapped line
    pub wrap_columns: usize,
    pub font_size: i64,
    pub line_height: i64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            wrap_columns: 90,
            font_size: 11,
            line_height: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource_name(self) -> &'static [u8] {
        match self {
            Face::Regular => b"F1",
            Face::Bold => b"F2",
        }
    }
}

/// One line of text at a top-down position on a page
#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    text: String,
    face: Face,
    /// Distance from the top edge to the top of the line box
    top: i64,
}

/// Greedy word wrap. Explicit line breaks are kept; words longer than the
/// width are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let raw_line = raw_line.trim_end_matches('\r');
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw_line.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(columns) {
                let chunk_len = chunk.len();
                let needed = if current_len == 0 { chunk_len } else { current_len + 1 + chunk_len };
                if needed > columns && current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(chunk);
                current_len += chunk_len;
            }
        }
        lines.push(current);
    }
    lines
}

struct Layout {
    pages: Vec<Vec<PlacedLine>>,
    cursor: i64,
    line_height: i64,
}

impl Layout {
    fn new(line_height: i64) -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: MARGIN_TOP,
            line_height,
        }
    }

    fn line(&mut self, text: String, face: Face) {
        if self.cursor + self.line_height > PAGE_HEIGHT - MARGIN_BOTTOM {
            self.pages.push(Vec::new());
            self.cursor = MARGIN_TOP;
        }
        let top = self.cursor;
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine { text, face, top });
        }
        self.cursor += self.line_height;
    }

    fn gap(&mut self, lines: i64) {
        self.cursor += lines * self.line_height;
    }
}

fn layout(activities: &[Activity], options: &ExportOptions) -> Vec<Vec<PlacedLine>> {
    let mut layout = Layout::new(options.line_height);

    for (idx, activity) in activities.iter().enumerate() {
        layout.line(format!("Aktivitet {}:", idx + 1), Face::Bold);
        for line in wrap_text(&activity.text, options.wrap_columns) {
            layout.line(line, Face::Regular);
        }
        layout.gap(1);

        layout.line("Refleksioner:".to_string(), Face::Bold);
        let reflection = if activity.reflection.is_empty() {
            "-"
        } else {
            activity.reflection.as_str()
        };
        for line in wrap_text(reflection, options.wrap_columns) {
            layout.line(line, Face::Regular);
        }
        layout.gap(2);
    }
    layout.pages
}

/// Encode text for a WinAnsiEncoding font; unmappable characters become '?'
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\t' => b' ',
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
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
        })
        .collect()
}

fn page_operations(lines: &[PlacedLine], font_size: i64) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        let baseline = PAGE_HEIGHT - line.top - font_size;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(line.face.resource_name().to_vec()), Object::Integer(font_size)],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Integer(MARGIN_X), Object::Integer(baseline)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&line.text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Render activities into PDF bytes
pub fn render(activities: &[Activity], options: &ExportOptions) -> Result<Vec<u8>> {
    let pages = layout(activities, options);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(font_dictionary("Helvetica"));
    let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(PAGE_WIDTH),
        Object::Integer(PAGE_HEIGHT),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let content = Content {
            operations: page_operations(lines, options.font_size),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    log::info!("Rendered {} activities on {} pages", activities.len(), pages.len());
    Ok(buf)
}

/// Render and write `aktiviteter.pdf` into `dir`
pub fn export_to_file(activities: &[Activity], dir: &Path, options: &ExportOptions) -> Result<PathBuf> {
    let bytes = render(activities, options)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(text: &str, reflection: &str) -> Activity {
        Activity {
            text: text.to_string(),
            reflection: reflection.to_string(),
        }
    }

    fn page_texts(pages: &[Vec<PlacedLine>]) -> Vec<Vec<&str>> {
        pages
            .iter()
            .map(|p| p.iter().map(|l| l.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap_text("kort tekst", 20), vec!["kort tekst"]);
        assert_eq!(wrap_text("", 20), vec![""]);
    }

    #[test]
    fn test_wrap_breaks_at_words() {
        let lines = wrap_text("en to tre fire fem", 7);
        assert_eq!(lines, vec!["en to", "tre", "fire", "fem"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 7));
    }

    #[test]
    fn test_wrap_keeps_line_breaks() {
        assert_eq!(wrap_text("a\n\nb\r\nc", 10), vec!["a", "", "b", "c"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap_text("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        assert_eq!(wrap_text("æøå æøå", 3), vec!["æøå", "æøå"]);
    }

    #[test]
    fn test_layout_sections_in_order() {
        let activities = vec![activity("Første", "Gik godt"), activity("Anden", "")];
        let pages = layout(&activities, &ExportOptions::default());

        assert_eq!(
            page_texts(&pages),
            vec![vec![
                "Aktivitet 1:",
                "Første",
                "Refleksioner:",
                "Gik godt",
                "Aktivitet 2:",
                "Anden",
                "Refleksioner:",
                "-",
            ]]
        );
        assert_eq!(pages[0][0].face, Face::Bold);
        assert_eq!(pages[0][1].face, Face::Regular);
    }

    #[test]
    fn test_layout_lines_move_down() {
        let pages = layout(&[activity("a", "b")], &ExportOptions::default());
        let tops: Vec<i64> = pages[0].iter().map(|l| l.top).collect();
        assert!(tops.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_layout_paginates_long_text() {
        let long = "ord ".repeat(3000);
        let pages = layout(&[activity(&long, "")], &ExportOptions::default());
        assert!(pages.len() > 1);
        for page in &pages {
            for line in page {
                assert!(line.top >= MARGIN_TOP);
                assert!(line.top + 15 <= PAGE_HEIGHT - MARGIN_BOTTOM);
            }
        }
    }

    #[test]
    fn test_empty_list_gives_one_blank_page() {
        let pages = layout(&[], &ExportOptions::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Børn – æble"), vec![
            b'B', 0xF8, b'r', b'n', b' ', 0x96, b' ', 0xE6, b'b', b'l', b'e'
        ]);
        assert_eq!(encode_win_ansi("✓"), vec![b'?']);
    }

    #[test]
    fn test_render_is_loadable_pdf() {
        let long = "ord ".repeat(3000);
        let activities = vec![activity("Lav en sansesti", "Børnene var nysgerrige"), activity(&long, "")];
        let expected_pages = layout(&activities, &ExportOptions::default()).len();

        let bytes = render(&activities, &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), expected_pages);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_file(&[activity("a", "")], dir.path(), &ExportOptions::default()).unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }
}
