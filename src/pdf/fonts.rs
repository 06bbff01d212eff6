//! Standard-14 Helvetica fonts for the overlay
//!
//! The overlay only uses Helvetica and Helvetica-Bold, which every PDF
//! reader provides, so nothing is embedded. Widths come from the Adobe
//! core font metrics and are only needed to right-align text.

use lopdf::{Dictionary, Object};

/// Which of the two overlay faces to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    /// Resource name the overlay registers the face under
    pub fn resource_name(&self) -> &'static str {
        match self {
            Face::Regular => "BrandRegular",
            Face::Bold => "BrandBold",
        }
    }

    fn base_font(&self) -> &'static [u8] {
        match self {
            Face::Regular => b"Helvetica",
            Face::Bold => b"Helvetica-Bold",
        }
    }

    /// Type1 font dictionary with WinAnsiEncoding
    pub fn font_dictionary(&self) -> Dictionary {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(self.base_font().to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        font
    }

    /// Glyph width in 1/1000 em for a WinAnsi code
    fn glyph_width(&self, code: u8) -> u16 {
        match code {
            32..=126 => {
                let table = match self {
                    Face::Regular => &HELVETICA_WIDTHS,
                    Face::Bold => &HELVETICA_BOLD_WIDTHS,
                };
                table[(code - 32) as usize]
            }
            149 => 350,  // bullet
            150 => 556,  // en dash
            151 => 1000, // em dash
            160 => 278,  // no-break space
            _ => 556,
        }
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|code| self.glyph_width(code) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

/// Helvetica widths for codes 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    278, 278, 584, 584, 584, 556, 1015, // : - @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    278, 278, 278, 469, 556, 333, // [ - `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a - m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n - z
    334, 260, 334, 584, // { - ~
];

/// Helvetica-Bold widths for codes 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space - /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0 - 9
    333, 333, 584, 584, 584, 611, 975, // : - @
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A - M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N - Z
    333, 278, 333, 584, 556, 333, // [ - `
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a - m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n - z
    389, 280, 389, 584, // { - ~
];

/// Encode text as WinAnsiEncoding bytes
///
/// Characters WinAnsi lacks are folded to a close equivalent where one
/// exists, otherwise replaced with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{2010}' | '\u{2011}' | '\u{2212}' => b'-',
            '\u{2022}' => 149,
            '\u{2013}' => 150,
            '\u{2014}' => 151,
            '\u{2018}' => 145,
            '\u{2019}' => 146,
            '\u{201C}' => 147,
            '\u{201D}' => 148,
            '\u{2026}' => 133,
            '\u{20AC}' => 128,
            '\u{2122}' => 153,
            '\u{00A0}'..='\u{00FF}' => ch as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Render text as a PDF literal string, including the parentheses
///
/// Bytes outside printable ASCII are written as octal escapes so the
/// content stream stays plain ASCII.
pub fn pdf_literal(text: &str) -> String {
    let mut out = String::from("(");
    for byte in encode_win_ansi(text) {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            32..=126 => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_folds_non_breaking_hyphen() {
        assert_eq!(encode_win_ansi("Catch\u{2011}Up"), b"Catch-Up".to_vec());
    }

    #[test]
    fn test_encode_bullet_and_unknown() {
        assert_eq!(encode_win_ansi("a \u{2022} b"), vec![b'a', b' ', 149, b' ', b'b']);
        assert_eq!(encode_win_ansi("\u{4E2D}"), vec![b'?']);
    }

    #[test]
    fn test_pdf_literal_escapes() {
        assert_eq!(pdf_literal("Page 1"), "(Page 1)");
        assert_eq!(pdf_literal("(336)"), "(\\(336\\))");
        assert_eq!(pdf_literal("a\\b"), "(a\\\\b)");
        assert_eq!(pdf_literal("\u{2022}"), "(\\225)");
    }

    #[test]
    fn test_text_width() {
        // "Page" = 667 + 556 + 556 + 556 units
        let width = Face::Regular.text_width("Page", 10.0);
        assert!((width - 23.35).abs() < 0.01);
        assert!(Face::Bold.text_width("Logical Books", 12.0) > Face::Regular.text_width("Logical Books", 12.0));
    }

    #[test]
    fn test_font_dictionary() {
        let font = Face::Bold.font_dictionary();
        let base_font = font.get(b"BaseFont").and_then(Object::as_name).unwrap();
        assert_eq!(base_font, &b"Helvetica-Bold"[..]);
        let encoding = font.get(b"Encoding").and_then(Object::as_name).unwrap();
        assert_eq!(encoding, &b"WinAnsiEncoding"[..]);
    }
}
