//! Read-back summary of a DOCX
//!
//! Used to report on generated documents and to check them in tests.

use roxmltree::Node;

use crate::error::Result;
use super::package::{content_type, DocxPackage, CONTENT_TYPES_PART, DEFAULT_MAIN_PART};
use super::xml::{DML_NS, WML_NS};

/// What a DOCX contains, as far as branding is concerned
#[derive(Debug, Clone, Default)]
pub struct DocxSummary {
    /// Number of `w:sectPr` elements in the main document
    pub section_count: usize,
    /// Sections with a default header and a default footer reference
    pub branded_sections: usize,
    /// Text of each non-empty body paragraph
    pub paragraphs: Vec<String>,
    /// Text of each header part
    pub header_texts: Vec<String>,
    /// Text of each footer part
    pub footer_texts: Vec<String>,
    /// Whether any header holds a picture
    pub header_has_picture: bool,
    /// Whether any footer holds a PAGE field
    pub footer_has_page_field: bool,
}

fn is_wml(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// Concatenated `w:t` text below `node`
fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| is_wml(n, "t"))
        .filter_map(|n| n.text())
        .collect()
}

fn has_default_reference(sect_pr: Node<'_, '_>, element: &str) -> bool {
    sect_pr
        .children()
        .any(|c| is_wml(&c, element) && c.attribute((WML_NS, "type")) == Some("default"))
}

/// Summarize a DOCX held in memory
pub fn summarize(bytes: &[u8]) -> Result<DocxSummary> {
    let package = DocxPackage::from_bytes(bytes)?;
    let mut summary = DocxSummary::default();

    let main = roxmltree::Document::parse(package.xml_part(DEFAULT_MAIN_PART)?)?;
    for sect_pr in main.descendants().filter(|n| is_wml(n, "sectPr")) {
        summary.section_count += 1;
        if has_default_reference(sect_pr, "headerReference")
            && has_default_reference(sect_pr, "footerReference")
        {
            summary.branded_sections += 1;
        }
    }

    if let Some(body) = main.descendants().find(|n| is_wml(n, "body")) {
        summary.paragraphs = body
            .children()
            .filter(|n| is_wml(n, "p"))
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect();
    }

    let content_types = roxmltree::Document::parse(package.xml_part(CONTENT_TYPES_PART)?)?;
    for node in content_types.descendants().filter(|n| n.has_tag_name("Override")) {
        let (Some(part), Some(ctype)) = (node.attribute("PartName"), node.attribute("ContentType")) else {
            continue;
        };
        let part = part.trim_start_matches('/');
        if ctype != content_type::HEADER && ctype != content_type::FOOTER {
            continue;
        }
        let Ok(xml) = package.xml_part(part) else {
            continue;
        };

        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        if ctype == content_type::HEADER {
            summary.header_texts.push(text_of(root));
            summary.header_has_picture |= root
                .descendants()
                .any(|n| n.tag_name().name() == "blip" && n.tag_name().namespace() == Some(DML_NS));
        } else {
            summary.footer_texts.push(text_of(root));
            summary.footer_has_page_field |= root.descendants().any(|n| {
                (is_wml(&n, "fldSimple")
                    && n.attribute((WML_NS, "instr")).is_some_and(|i| i.trim_start().starts_with("PAGE")))
                    || (is_wml(&n, "instrText")
                        && n.text().is_some_and(|t| t.trim_start().starts_with("PAGE")))
            });
        }
    }

    Ok(summary)
}
