//! Streaming rewrites of package XML parts using quick-xml
//!
//! Each rewrite copies every event through unchanged except the few
//! elements it is responsible for, so unknown markup survives.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use super::package::resolve_target;

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    pub fn new(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
        }
    }

    fn to_event(&self) -> Event<'static> {
        Event::Empty(BytesStart::new("Relationship").with_attributes([
            ("Id", self.id.as_str()),
            ("Type", self.rel_type.as_str()),
            ("Target", self.target.as_str()),
        ]).into_owned())
    }
}

/// A fresh relationships part
pub fn relationships_xml(relationships: &[Relationship]) -> Result<String> {
    let empty = format!(r#"{}<Relationships xmlns="{}"></Relationships>"#, XML_DECLARATION, PKG_REL_NS);
    let (xml, _) = rewrite_relationships(&empty, "", |_| false, relationships)?;
    Ok(xml)
}

/// Escape text for element content or attribute values
pub fn escape_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r') || *c >= ' ')
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    match element.try_get_attribute(name).map_err(quick_xml::Error::from)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::General(format!("Rewritten XML is not UTF-8: {}", e)))
}

/// Drop relationships whose type matches `drop`, then append `add`
///
/// Relationships with the same id as one being added are dropped too.
/// Returns the rewritten part and the resolved part names of the dropped
/// targets (internal targets only). `source_part` is the part the
/// relationships belong to.
pub fn rewrite_relationships(
    xml: &str,
    source_part: &str,
    drop: impl Fn(&str) -> bool,
    add: &[Relationship],
) -> Result<(String, Vec<String>)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut dropped = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let rel_type = attribute(&e, b"Type")?.unwrap_or_default();
                let id = attribute(&e, b"Id")?.unwrap_or_default();
                let external = attribute(&e, b"TargetMode")?.as_deref() == Some("External");

                if drop(&rel_type) || add.iter().any(|r| r.id == id) {
                    if let (Some(target), false) = (attribute(&e, b"Target")?, external) {
                        dropped.push(resolve_target(source_part, &target));
                    }
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"Relationships" => {
                let end = BytesEnd::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                writer.write_event(Event::Start(e))?;
                for rel in add {
                    writer.write_event(rel.to_event())?;
                }
                writer.write_event(Event::End(end))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"Relationships" => {
                for rel in add {
                    writer.write_event(rel.to_event())?;
                }
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    Ok((finish(writer)?, dropped))
}

/// Edit `[Content_Types].xml`
///
/// Overrides for `remove` parts (and for parts about to be overridden)
/// are dropped; `overrides` and any missing `defaults` are appended.
pub fn rewrite_content_types(
    xml: &str,
    remove: &[String],
    overrides: &[(&str, &str)],
    defaults: &[(&str, &str)],
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut present_defaults: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Empty(e) if e.local_name().as_ref() == b"Override" => {
                let part = attribute(&e, b"PartName")?.unwrap_or_default();
                let part = part.trim_start_matches('/');
                let stale = remove.iter().any(|r| r == part)
                    || overrides.iter().any(|(name, _)| *name == part);
                if !stale {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"Default" => {
                if let Some(ext) = attribute(&e, b"Extension")? {
                    present_defaults.push(ext.to_ascii_lowercase());
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"Types" => {
                for (ext, ctype) in defaults {
                    if !present_defaults.iter().any(|p| p == &ext.to_ascii_lowercase()) {
                        writer.write_event(Event::Empty(
                            BytesStart::new("Default")
                                .with_attributes([("Extension", *ext), ("ContentType", *ctype)]),
                        ))?;
                    }
                }
                for (part, ctype) in overrides {
                    let part_name = format!("/{}", part);
                    writer.write_event(Event::Empty(
                        BytesStart::new("Override")
                            .with_attributes([("PartName", part_name.as_str()), ("ContentType", *ctype)]),
                    ))?;
                }
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    finish(writer)
}

/// Header/footer reference kinds written into every section
const REFERENCE_KINDS: [&str; 3] = ["default", "first", "even"];

fn write_section_references(writer: &mut Writer<Vec<u8>>, header_id: &str, footer_id: &str) -> Result<()> {
    for (element, id) in [("w:headerReference", header_id), ("w:footerReference", footer_id)] {
        for kind in REFERENCE_KINDS {
            writer.write_event(Event::Empty(
                BytesStart::new(element).with_attributes([("w:type", kind), ("r:id", id)]),
            ))?;
        }
    }
    Ok(())
}

fn is_section_reference(local_name: &[u8]) -> bool {
    local_name == b"headerReference" || local_name == b"footerReference"
}

/// Point every section of the main document at one header and one footer
///
/// Existing header/footer references are removed. References are written
/// first inside each `w:sectPr`, where the schema requires them. A body
/// without any section properties gets one appended.
pub fn rewrite_section_references(xml: &str, header_id: &str, footer_id: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut sections = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"sectPr" => {
                sections += 1;
                writer.write_event(Event::Start(e))?;
                write_section_references(&mut writer, header_id, footer_id)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sectPr" => {
                sections += 1;
                let end = BytesEnd::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                writer.write_event(Event::Start(e))?;
                write_section_references(&mut writer, header_id, footer_id)?;
                writer.write_event(Event::End(end))?;
            }
            Event::Empty(e) if is_section_reference(e.local_name().as_ref()) => {}
            Event::Start(e) if is_section_reference(e.local_name().as_ref()) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"body" => {
                if sections == 0 {
                    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
                    write_section_references(&mut writer, header_id, footer_id)?;
                    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
                }
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    finish(writer)
}
