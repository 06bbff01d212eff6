//! Line-oriented text extraction
//!
//! Walks a page's content operations and splits the shown text into
//! lines wherever the text position moves to a new line, following Form
//! XObjects so text drawn inside them is kept.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream};
use log::warn;

use crate::error::Result;
use super::metadata::page_resources;

/// How deep nested Form XObjects are followed
const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustment (thousandths of an em) wide enough to read as a space
const WORD_GAP: f32 = -200.0;

#[derive(Default)]
struct Lines {
    lines: Vec<String>,
    current: String,
    line_y: Option<f32>,
}

impl Lines {
    fn push(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: Option<&'a Object>) -> Option<&'a Dictionary> {
    match obj? {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

fn font_encodings<'a>(doc: &'a Document, resources: &'a Dictionary) -> BTreeMap<Vec<u8>, Encoding<'a>> {
    let Some(fonts) = resolve_dict(doc, resources.get(b"Font").ok()) else {
        return BTreeMap::new();
    };

    fonts
        .iter()
        .filter_map(|(name, font)| {
            let font = resolve_dict(doc, Some(font))?;
            let encoding = font.get_font_encoding(doc).ok()?;
            Some((name.clone(), encoding))
        })
        .collect()
}

fn decode(encoding: Option<&Encoding<'_>>, bytes: &[u8]) -> String {
    encoding
        .and_then(|e| Document::decode_text(e, bytes).ok())
        .unwrap_or_else(|| bytes.iter().map(|b| *b as char).collect())
}

fn operand_float(op: &Operation, index: usize) -> Option<f32> {
    op.operands.get(index).and_then(|o| o.as_float().ok())
}

/// Walk one content stream, recursing into Form XObjects
fn collect(doc: &Document, content: &[u8], resources: &Dictionary, lines: &mut Lines, depth: usize) -> Result<()> {
    let content = Content::decode(content)?;
    let encodings = font_encodings(doc, resources);
    let mut encoding = None;

    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                encoding = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| encodings.get(name));
            }
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    lines.break_line();
                }
                if let Some(bytes) = op.operands.last().and_then(|o| o.as_str().ok()) {
                    lines.push(&decode(encoding, bytes));
                }
            }
            "TJ" => {
                let Some(items) = op.operands.first().and_then(|o| o.as_array().ok()) else {
                    continue;
                };
                for item in items {
                    match item {
                        Object::String(bytes, _) => lines.push(&decode(encoding, bytes)),
                        other => {
                            if other.as_float().is_ok_and(|gap| gap <= WORD_GAP) {
                                lines.space();
                            }
                        }
                    }
                }
            }
            "Td" | "TD" => {
                if operand_float(op, 1).is_some_and(|ty| ty != 0.0) {
                    lines.break_line();
                } else {
                    lines.space();
                }
            }
            "T*" => lines.break_line(),
            "Tm" => {
                let y = operand_float(op, 5);
                if y != lines.line_y {
                    lines.break_line();
                    lines.line_y = y;
                } else {
                    lines.space();
                }
            }
            "BT" => lines.line_y = None,
            "ET" => lines.break_line(),
            "Do" => {
                let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                    continue;
                };
                collect_form(doc, resources, name, lines, depth)?;
            }
            _ => {}
        }
    }

    Ok(())
}

/// Follow a `Do` into a Form XObject; images and unknown names are skipped
fn collect_form(doc: &Document, resources: &Dictionary, name: &[u8], lines: &mut Lines, depth: usize) -> Result<()> {
    let Some(xobjects) = resolve_dict(doc, resources.get(b"XObject").ok()) else {
        return Ok(());
    };
    let Ok(Object::Reference(id)) = xobjects.get(name) else {
        return Ok(());
    };
    let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) else {
        return Ok(());
    };
    if stream.dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
        return Ok(());
    }
    if depth >= MAX_FORM_DEPTH {
        warn!("Form XObject {} nested too deeply; its text is skipped", String::from_utf8_lossy(name));
        return Ok(());
    }

    let content = stream_content(stream);
    let form_resources = resolve_dict(doc, stream.dict.get(b"Resources").ok()).unwrap_or(resources);

    lines.break_line();
    collect(doc, &content, form_resources, lines, depth + 1)?;
    lines.break_line();
    Ok(())
}

/// Decoded bytes of a stream; unfiltered streams are used as-is
fn stream_content(stream: &Stream) -> Vec<u8> {
    stream.decompressed_content().unwrap_or_else(|_| stream.content.clone())
}

/// Text lines of one page, in content order
pub fn page_lines(doc: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    // Streams may split anywhere between operators, so keep them separated
    let mut content = Vec::new();
    for id in doc.get_page_contents(page_id) {
        if let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) {
            content.extend(stream_content(stream));
            content.push(b'\n');
        }
    }
    let resources = page_resources(doc, page_id)?;

    let mut lines = Lines::default();
    collect(doc, &content, &resources, &mut lines, 0)?;
    lines.break_line();

    Ok(lines.lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-page document with Helvetica as /F1 and the given page content
    fn page_with(content: &str, xobjects: Vec<(&str, Stream)>) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let mut resources = Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]);
        if !xobjects.is_empty() {
            let mut dict = Dictionary::new();
            for (name, stream) in xobjects {
                dict.set(name, Object::Reference(doc.add_object(stream)));
            }
            resources.set("XObject", Object::Dictionary(dict));
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
            ("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])),
        ]));
        doc.objects.insert(pages_id, Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        (doc, page_id)
    }

    #[test]
    fn test_lines_split_inside_one_text_block() {
        let (doc, page_id) = page_with(
            "BT /F1 12 Tf 72 700 Td (Line one) Tj 0 -14 Td (Line two) Tj T* (Line three) Tj ET\n\
             BT /F1 12 Tf 72 600 Td [(Ker) 20 (ned) -250 (words)] TJ ET",
            vec![],
        );

        let lines = page_lines(&doc, page_id).unwrap();
        assert_eq!(lines, vec!["Line one", "Line two", "Line three", "Kerned words"]);
    }

    #[test]
    fn test_text_matrix_moves() {
        let (doc, page_id) = page_with(
            "BT /F1 12 Tf 1 0 0 1 72 700 Tm (Fees:) Tj 1 0 0 1 200 700 Tm (monthly) Tj \
             1 0 0 1 72 686 Tm (Term) Tj ET",
            vec![],
        );

        let lines = page_lines(&doc, page_id).unwrap();
        assert_eq!(lines, vec!["Fees: monthly", "Term"]);
    }

    #[test]
    fn test_form_xobject_text_kept() {
        let form = Stream::new(
            Dictionary::from_iter(vec![
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Form".to_vec())),
                ("BBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])),
            ]),
            b"BT /F1 12 Tf 72 700 Td (Inside form) Tj ET".to_vec(),
        );
        let (doc, page_id) = page_with("q /Fm1 Do Q BT /F1 12 Tf 72 600 Td (After) Tj ET", vec![("Fm1", form)]);

        let lines = page_lines(&doc, page_id).unwrap();
        assert_eq!(lines, vec!["Inside form", "After"]);
    }

    #[test]
    fn test_image_xobject_ignored() {
        let image = Stream::new(
            Dictionary::from_iter(vec![
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Image".to_vec())),
                ("Width", Object::Integer(1)),
                ("Height", Object::Integer(1)),
                ("ColorSpace", Object::Name(b"DeviceGray".to_vec())),
                ("BitsPerComponent", Object::Integer(8)),
            ]),
            vec![0],
        );
        let (doc, page_id) = page_with("q /Im1 Do Q", vec![("Im1", image)]);

        assert!(page_lines(&doc, page_id).unwrap().is_empty());
    }
}
