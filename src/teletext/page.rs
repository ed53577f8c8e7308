//! Page buffer and renderer: the 25x40 working grid, boxed-area
//! detection, and SRT cue emission.

use std::fmt::Write as _;

use super::tables::COLOUR_NAMES;

/// Rows in a teletext page, including the header row (row 0).
pub const ROWS: usize = 25;
/// Columns in a teletext page.
pub const COLS: usize = 40;

const START_BOX: u16 = 0x0b;
const END_BOX: u16 = 0x0a;

/// The working page: a 25x40 grid of Unicode scalars (`0` = unwritten),
/// plus the show/hide timestamps and the dirty flag that gates rendering.
#[derive(Debug)]
pub struct Page {
    text: [[u16; COLS]; ROWS],
    /// Milliseconds since the clock epoch at which this page's cue starts.
    pub show_timestamp: i64,
    /// Milliseconds since the clock epoch at which this page's cue ends.
    pub hide_timestamp: i64,
    /// Set once any body row is written; a page with no writes is dropped
    /// on the next page header rather than finalized.
    pub tainted: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            text: [[0u16; COLS]; ROWS],
            show_timestamp: 0,
            hide_timestamp: 0,
            tainted: false,
        }
    }
}

impl Page {
    /// Builds an empty, untimestamped page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Row 0 is the header row; it is writable (for diagnostics) but never
    /// rendered.
    pub fn set(&mut self, row: usize, col: usize, scalar: u16) {
        self.text[row][col] = scalar;
    }

    /// Row 0 is reserved; callers writing body text never read it back, but
    /// X/26 overlay addressing can reach it so the getter is exposed too.
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.text[row][col]
    }

    /// Zeroes the grid and clears the dirty flag; timestamps are left to
    /// the caller, which resets them explicitly on the next page header.
    pub fn clear(&mut self) {
        self.text = [[0u16; COLS]; ROWS];
        self.tainted = false;
    }

    /// A page is renderable iff some cell holds the start-box sentinel.
    /// Column-major scan: boxed regions tend to start left-of-center, so
    /// scanning columns outer / rows inner terminates sooner on average.
    pub fn has_boxed_area(&self) -> bool {
        for col in 0..COLS {
            for row in 1..ROWS {
                if self.text[row][col] == START_BOX {
                    return true;
                }
            }
        }
        false
    }
}

/// Formats milliseconds since the clock epoch as `HH:MM:SS,mmm`.
fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let total_ms = ms % 1000;
    let total_s = ms / 1000;
    let s = total_s % 60;
    let total_m = total_s / 60;
    let m = total_m % 60;
    let h = total_m / 60;
    format!("{h:02}:{m:02}:{s:02},{total_ms:03}")
}

/// Renders `page` into `out` as one SRT cue, returning `true` if a cue was
/// written. `cue_number` is the 1-based sequence number for the cue line.
/// `colour` enables `<font color="...">` markup; without it, color-control
/// bytes degrade to a single space per Level 1 spacing-attribute semantics.
pub fn render(page: &Page, cue_number: u32, colour: bool, out: &mut String) -> bool {
    if !page.has_boxed_area() {
        return false;
    }

    let _ = writeln!(out, "{cue_number}");
    let _ = writeln!(
        out,
        "{} --> {}",
        format_timestamp(page.show_timestamp),
        format_timestamp(page.hide_timestamp)
    );

    for row in 1..ROWS {
        if !page.text[row].contains(&START_BOX) {
            continue;
        }
        render_row(&page.text[row], colour, out);
        out.push('\n');
    }
    out.push('\n');
    true
}

fn render_row(row: &[u16; COLS], colour: bool, out: &mut String) {
    let mut in_boxed_area = false;
    let mut foreground_color: usize = 7;
    let mut font_tag_opened = false;

    let mut col = 0usize;
    while col < COLS {
        if col == COLS - 1 {
            if font_tag_opened {
                out.push_str("</font> ");
            }
            break;
        }

        let cell = row[col];
        match cell {
            0x01..=0x07 => {
                if colour {
                    if font_tag_opened {
                        out.push_str("</font> ");
                        font_tag_opened = false;
                    }
                    let new_color = cell as usize;
                    if new_color != foreground_color {
                        foreground_color = new_color;
                        let name = COLOUR_NAMES[new_color];
                        let _ = write!(out, "<font color=\"{name}\">");
                        font_tag_opened = true;
                    }
                } else {
                    out.push(' ');
                }
            }
            START_BOX => {
                in_boxed_area = true;
            }
            END_BOX => {
                in_boxed_area = false;
                col = COLS - 2;
            }
            c if c < 0x20 => {}
            c if in_boxed_area => {
                if let Some(ch) = char::from_u32(c as u32) {
                    out.push(ch);
                }
            }
            _ => {}
        }
        col += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_row(page: &mut Page, row: usize, cells: &[(usize, u16)]) {
        for &(col, v) in cells {
            page.set(row, col, v);
        }
    }

    #[test]
    fn empty_page_renders_nothing() {
        let page = Page::new();
        let mut out = String::new();
        assert!(!render(&page, 1, false, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn hello_round_trip() {
        let mut page = Page::new();
        page.show_timestamp = 10_000;
        page.hide_timestamp = 11_960;
        set_row(
            &mut page,
            20,
            &[
                (4, 0x0b),
                (5, b'H' as u16),
                (6, b'E' as u16),
                (7, b'L' as u16),
                (8, b'L' as u16),
                (9, b'O' as u16),
            ],
        );
        let mut out = String::new();
        assert!(render(&page, 1, false, &mut out));
        assert!(out.contains("HELLO"));
        assert!(out.starts_with("1\n00:00:10,000 --> 00:00:11,960\n"));
    }

    #[test]
    fn color_transitions_with_markup() {
        let mut page = Page::new();
        set_row(
            &mut page,
            5,
            &[(0, 0x0b), (1, 0x01), (2, b'A' as u16), (3, 0x02), (4, b'B' as u16), (5, END_BOX)],
        );
        let mut out = String::new();
        render(&page, 1, true, &mut out);
        assert!(out.contains("<font color=\"red\">A</font> <font color=\"green\">B</font> "));
    }

    #[test]
    fn color_transitions_without_markup_become_spaces() {
        let mut page = Page::new();
        set_row(
            &mut page,
            5,
            &[(0, 0x0b), (1, 0x01), (2, b'A' as u16), (3, 0x02), (4, b'B' as u16), (5, END_BOX)],
        );
        let mut out = String::new();
        render(&page, 1, false, &mut out);
        assert!(out.contains(" A B"));
    }
}
