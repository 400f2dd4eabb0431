//! Built-in sans-serif advance widths.
//!
//! Helvetica proportions for printable ASCII, in 1000 units per em. This is
//! the measurement oracle when no real face is loaded: it is close enough to
//! `system-ui` for overflow prediction and identical on every platform.

pub const UNITS_PER_EM: u16 = 1000;
/// Advance used for characters outside the table.
pub const DEFAULT_ADVANCE: u16 = 556;
pub const ASCENDER: i16 = 718;
pub const CAP_HEIGHT: i16 = 718;

/// Widths for U+0020..=U+007E.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFontMetrics;

impl StandardFontMetrics {
    /// Advance of one character in font units.
    pub fn advance_units(&self, ch: char) -> u16 {
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            return ASCII_WIDTHS[(code - 0x20) as usize];
        }
        match ch {
            '\u{00A0}' => 278,
            c if c.is_control() => 0,
            _ => DEFAULT_ADVANCE,
        }
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance_units(ch) as f64 / UNITS_PER_EM as f64 * font_size
    }

    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        let units: u64 = text.chars().map(|ch| self.advance_units(ch) as u64).sum();
        units as f64 / UNITS_PER_EM as f64 * font_size
    }
}
