//! PDF to DOCX conversion
//!
//! The converter keeps the template's page structure: every PDF page
//! becomes one DOCX section with that page's size and orientation, and
//! the page's extracted text lines become paragraphs. The result is the
//! unbranded base document both DOCX variants are branded from.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use lopdf::Document;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::layout::{Margins, PageGeometry};
use crate::pdf::metadata::page_geometries;
use crate::pdf::text::page_lines;
use super::package::{content_type, rel_type, DocxPackage, CONTENT_TYPES_PART, DEFAULT_MAIN_PART, PACKAGE_RELS_PART};
use super::xml::{escape_text, relationships_xml, Relationship, CONTENT_TYPES_NS, REL_NS, WML_NS, XML_DECLARATION};

const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";
const GENERATOR: &str = "contract-branding";

/// What [`ensure_base_docx`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseStatus {
    /// The cached base was reused as-is
    Cached,
    /// The template was converted and the base written
    Converted,
}

/// Text and geometry of one template page
#[derive(Debug, Clone)]
pub struct PageText {
    pub geometry: PageGeometry,
    pub lines: Vec<String>,
}

/// Read the text lines and geometry of every page
pub fn read_pages(doc: &Document) -> Result<Vec<PageText>> {
    page_geometries(doc)?
        .into_iter()
        .map(|(page_id, geometry)| {
            let lines = page_lines(doc, page_id)?;
            debug!("Page {:?}: {} text lines", page_id, lines.len());
            Ok(PageText { geometry, lines })
        })
        .collect()
}

/// Convert a PDF into DOCX bytes
///
/// Errors are returned as-is; there is no partial conversion.
pub fn convert_pdf_to_docx(pdf: &Path) -> Result<Vec<u8>> {
    if !pdf.exists() {
        return Err(Error::FileNotFound(pdf.to_path_buf()));
    }

    let doc = Document::load(pdf)?;
    let pages = read_pages(&doc)?;
    if pages.is_empty() {
        return Err(Error::EmptyPdf(pdf.to_path_buf()));
    }

    let title = crate::pdf::extract_metadata(pdf).ok().and_then(|m| m.title);
    debug!("Converting {} pages from {}", pages.len(), pdf.display());

    build_package(&pages, title.as_deref())?.to_bytes()
}

/// Assemble a DOCX package from page texts
pub fn build_package(pages: &[PageText], title: Option<&str>) -> Result<DocxPackage> {
    let mut package = DocxPackage::new();

    package.set_part(CONTENT_TYPES_PART, content_types_xml());
    package.set_part(
        PACKAGE_RELS_PART,
        relationships_xml(&[
            Relationship::new("rId1", rel_type::OFFICE_DOCUMENT, DEFAULT_MAIN_PART),
            Relationship::new("rId2", rel_type::CORE_PROPERTIES, CORE_PART),
            Relationship::new("rId3", rel_type::EXTENDED_PROPERTIES, APP_PART),
        ])?,
    );
    package.set_part(DEFAULT_MAIN_PART, document_xml(pages));
    package.set_part("word/_rels/document.xml.rels", relationships_xml(&[])?);
    package.set_part(CORE_PART, core_properties_xml(title));
    package.set_part(APP_PART, app_properties_xml(pages.len()));

    Ok(package)
}

/// Convert once and cache the result at `base`
///
/// An existing base is reused untouched unless `refresh` is set, so
/// repeated branding runs never reconvert.
pub fn ensure_base_docx(pdf: &Path, base: &Path, refresh: bool) -> Result<BaseStatus> {
    if base.exists() && !refresh {
        debug!("Reusing cached base {}", base.display());
        return Ok(BaseStatus::Cached);
    }

    let bytes = convert_pdf_to_docx(pdf)?;
    if let Some(parent) = base.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(base, bytes)?;
    info!("Converted {} -> {}", pdf.display(), base.display());

    Ok(BaseStatus::Converted)
}

fn content_types_xml() -> String {
    format!(
        concat!(
            "{decl}<Types xmlns=\"{ns}\">",
            "<Default Extension=\"rels\" ContentType=\"{rels}\"/>",
            "<Default Extension=\"xml\" ContentType=\"{xml}\"/>",
            "<Override PartName=\"/{main}\" ContentType=\"{document}\"/>",
            "<Override PartName=\"/{core}\" ContentType=\"{core_type}\"/>",
            "<Override PartName=\"/{app}\" ContentType=\"{app_type}\"/>",
            "</Types>"
        ),
        decl = XML_DECLARATION,
        ns = CONTENT_TYPES_NS,
        rels = content_type::RELATIONSHIPS,
        xml = content_type::XML,
        main = DEFAULT_MAIN_PART,
        document = content_type::DOCUMENT,
        core = CORE_PART,
        core_type = content_type::CORE_PROPERTIES,
        app = APP_PART,
        app_type = content_type::EXTENDED_PROPERTIES,
    )
}

/// Section properties sized to a page
fn section_properties(geometry: &PageGeometry) -> String {
    let margins = Margins::standard();
    let distance = Margins::header_distance().twips();
    let orient = if geometry.is_landscape() { r#" w:orient="landscape""# } else { "" };

    format!(
        concat!(
            "<w:sectPr>",
            "<w:pgSz w:w=\"{}\" w:h=\"{}\"{}/>",
            "<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" ",
            "w:header=\"{}\" w:footer=\"{}\" w:gutter=\"0\"/>",
            "</w:sectPr>"
        ),
        geometry.width_length().twips(),
        geometry.height_length().twips(),
        orient,
        margins.top.twips(),
        margins.right.twips(),
        margins.bottom.twips(),
        margins.left.twips(),
        distance,
        distance,
    )
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_text(text)
    )
}

/// The main document part: one section per page
fn document_xml(pages: &[PageText]) -> String {
    let mut body = String::new();

    for (index, page) in pages.iter().enumerate() {
        for line in &page.lines {
            body.push_str(&paragraph(line));
        }

        let sect_pr = section_properties(&page.geometry);
        if index + 1 < pages.len() {
            // A section break lives in the last paragraph of its section
            body.push_str(&format!("<w:p><w:pPr>{}</w:pPr></w:p>", sect_pr));
        } else {
            if page.lines.is_empty() {
                body.push_str("<w:p/>");
            }
            body.push_str(&sect_pr);
        }
    }

    format!(
        r#"{}<w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}</w:body></w:document>"#,
        XML_DECLARATION, WML_NS, REL_NS, body
    )
}

fn core_properties_xml(title: Option<&str>) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = title
        .map(|t| format!("<dc:title>{}</dc:title>", escape_text(t)))
        .unwrap_or_default();

    format!(
        concat!(
            "{}<cp:coreProperties ",
            "xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
            "xmlns:dc=\"http://purl.org/dc/elements/1.1/\" ",
            "xmlns:dcterms=\"http://purl.org/dc/terms/\" ",
            "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
            "{}<dc:creator>{}</dc:creator>",
            "<dcterms:created xsi:type=\"dcterms:W3CDTF\">{}</dcterms:created>",
            "<dcterms:modified xsi:type=\"dcterms:W3CDTF\">{}</dcterms:modified>",
            "</cp:coreProperties>"
        ),
        XML_DECLARATION, title, GENERATOR, now, now
    )
}

fn app_properties_xml(page_count: usize) -> String {
    format!(
        concat!(
            "{}<Properties ",
            "xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">",
            "<Application>{}</Application><Pages>{}</Pages></Properties>"
        ),
        XML_DECLARATION, GENERATOR, page_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::inspect::summarize;

    fn page(lines: &[&str], geometry: PageGeometry) -> PageText {
        PageText {
            geometry,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_one_section_per_page() {
        let pages = vec![
            page(&["Scope of services", "Fees & billing"], PageGeometry::letter()),
            page(&[], PageGeometry::letter()),
            page(&["Signatures"], PageGeometry::from_media_box([0.0, 0.0, 792.0, 612.0])),
        ];
        let bytes = build_package(&pages, Some("Contract")).unwrap().to_bytes().unwrap();
        let summary = summarize(&bytes).unwrap();

        assert_eq!(summary.section_count, 3);
        assert_eq!(summary.paragraphs, vec!["Scope of services", "Fees & billing", "Signatures"]);
    }

    #[test]
    fn test_section_page_size_and_orientation() {
        let xml = section_properties(&PageGeometry::from_media_box([0.0, 0.0, 792.0, 612.0]));
        assert!(xml.contains(r#"<w:pgSz w:w="15840" w:h="12240" w:orient="landscape"/>"#));

        let xml = section_properties(&PageGeometry::letter());
        assert!(xml.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
        assert!(xml.contains(r#"w:header="720""#));
    }

    #[test]
    fn test_core_properties_title_escaped() {
        let xml = core_properties_xml(Some("Fees & Terms"));
        assert!(xml.contains("<dc:title>Fees &amp; Terms</dc:title>"));
        assert!(roxmltree::Document::parse(&xml).is_ok());
    }

    #[test]
    fn test_convert_splits_lines_of_one_text_block() {
        use lopdf::{Dictionary, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]));
        let content = b"BT /F1 12 Tf 72 700 Td (Scope of services) Tj 0 -14 Td (Fees and billing) Tj ET".to_vec();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        doc.objects.insert(pages_id, Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
            ("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
                )])),
            ),
        ])));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let dir = tempfile::TempDir::new().unwrap();
        let pdf = dir.path().join("template.pdf");
        doc.save(&pdf).unwrap();

        let summary = summarize(&convert_pdf_to_docx(&pdf).unwrap()).unwrap();
        assert_eq!(summary.paragraphs, vec!["Scope of services", "Fees and billing"]);
    }

    #[test]
    fn test_convert_missing_pdf() {
        let result = convert_pdf_to_docx(Path::new("missing.pdf"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
