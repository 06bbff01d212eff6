//! Header and footer injection for DOCX contracts
//!
//! Every section of the main document is pointed at one branded header
//! and one footer part. Whatever headers and footers the document had
//! before are dropped, so branding an already branded document gives the
//! same package back.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use log::{debug, warn};

use crate::config::BrandSpec;
use crate::error::{Error, Result};
use crate::layout::Length;
use super::package::{
    content_type, rel_type, rels_part_for, resolve_target, DocxPackage, CONTENT_TYPES_PART,
    DEFAULT_MAIN_PART, PACKAGE_RELS_PART,
};
use super::xml::{
    escape_text, relationships_xml, rewrite_content_types, rewrite_relationships,
    rewrite_section_references, Relationship, DML_NS, PIC_NS, REL_NS, WML_NS, WPD_NS, XML_DECLARATION,
};

pub const HEADER_PART: &str = "word/brand-header.xml";
pub const FOOTER_PART: &str = "word/brand-footer.xml";
pub const LOGO_PART: &str = "word/media/brand-logo.png";

const HEADER_REL_ID: &str = "rIdBrandHeader";
const FOOTER_REL_ID: &str = "rIdBrandFooter";
const LOGO_REL_ID: &str = "rIdBrandLogo";

/// Width of one header table column in twips (half of a 6.5 in text block)
const HEADER_COLUMN_TWIPS: i64 = 4680;

/// An image part placed in the package, with its display size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedLogo {
    pub width_emu: i64,
    pub height_emu: i64,
}

/// Part name of the main document, found through the package relationships
pub fn main_document_part(package: &DocxPackage) -> Result<String> {
    let Ok(xml) = package.xml_part(PACKAGE_RELS_PART) else {
        return Ok(DEFAULT_MAIN_PART.to_string());
    };

    let doc = roxmltree::Document::parse(xml)?;
    let target = doc
        .descendants()
        .filter(|n| n.has_tag_name("Relationship"))
        .find(|n| n.attribute("Type") == Some(rel_type::OFFICE_DOCUMENT))
        .and_then(|n| n.attribute("Target"));

    match target {
        Some(target) => Ok(resolve_target("", target)),
        None => Err(Error::MissingPart(format!("{} officeDocument relationship", PACKAGE_RELS_PART))),
    }
}

/// Target for `part` as written in a relationship owned by `source_part`
fn relative_target(source_part: &str, part: &str) -> String {
    let dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    match part.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) if !dir.is_empty() => rest.to_string(),
        _ if dir.is_empty() => part.to_string(),
        _ => format!("/{}", part),
    }
}

/// Place the PNG logo in the package and relate it to the header part
///
/// The logo is sized `width_in` inches wide with its height following the
/// image's aspect ratio. Fails if the bytes are not a decodable PNG.
pub fn embed_logo(package: &mut DocxPackage, png: &[u8], width_in: f64) -> Result<EmbeddedLogo> {
    let (width_px, height_px) = ImageReader::with_format(Cursor::new(png), ImageFormat::Png)
        .into_dimensions()?;
    if width_px == 0 || height_px == 0 {
        return Err(Error::Logo("PNG logo has no pixels".to_string()));
    }

    let width_emu = Length::from_inches(width_in).emu();
    let height_emu = (width_emu as f64 * height_px as f64 / width_px as f64).round() as i64;

    package.set_part(LOGO_PART, png.to_vec());
    package.set_part(
        &rels_part_for(HEADER_PART),
        relationships_xml(&[Relationship::new(
            LOGO_REL_ID,
            rel_type::IMAGE,
            &relative_target(HEADER_PART, LOGO_PART),
        )])?,
    );
    debug!("Embedded {}x{} px logo as {}", width_px, height_px, LOGO_PART);

    Ok(EmbeddedLogo { width_emu, height_emu })
}

/// Brand a DOCX held in memory and return the branded bytes
///
/// `logo_png` is optional; a missing or undecodable logo gives a header
/// with text only.
pub fn brand_docx(base: &[u8], brand: &BrandSpec, logo_png: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut package = DocxPackage::from_bytes(base)?;
    brand_package(&mut package, brand, logo_png)?;
    package.to_bytes()
}

/// Replace the headers and footers of every section with the brand ones
pub fn brand_package(package: &mut DocxPackage, brand: &BrandSpec, logo_png: Option<&[u8]>) -> Result<()> {
    let main = main_document_part(package)?;
    let main_rels = rels_part_for(&main);

    let rels_xml = match package.xml_part(&main_rels) {
        Ok(xml) => xml.to_string(),
        Err(_) => relationships_xml(&[])?,
    };
    let (rels_xml, dropped) = rewrite_relationships(
        &rels_xml,
        &main,
        |t| t == rel_type::HEADER || t == rel_type::FOOTER,
        &[
            Relationship::new(HEADER_REL_ID, rel_type::HEADER, &relative_target(&main, HEADER_PART)),
            Relationship::new(FOOTER_REL_ID, rel_type::FOOTER, &relative_target(&main, FOOTER_PART)),
        ],
    )?;
    package.set_part(&main_rels, rels_xml);

    for part in &dropped {
        debug!("Removing header/footer part {}", part);
        package.remove_part(part);
        package.remove_part(&rels_part_for(part));
    }
    package.remove_part(LOGO_PART);
    package.remove_part(&rels_part_for(HEADER_PART));

    let content_types = rewrite_content_types(
        package.xml_part(CONTENT_TYPES_PART)?,
        &dropped,
        &[(HEADER_PART, content_type::HEADER), (FOOTER_PART, content_type::FOOTER)],
        &[
            ("rels", content_type::RELATIONSHIPS),
            ("xml", content_type::XML),
            ("png", content_type::PNG),
        ],
    )?;
    package.set_part(CONTENT_TYPES_PART, content_types);

    let document = rewrite_section_references(package.xml_part(&main)?, HEADER_REL_ID, FOOTER_REL_ID)?;
    package.set_part(&main, document);

    let logo = match logo_png {
        Some(png) => match embed_logo(package, png, brand.docx_logo_width_in) {
            Ok(logo) => Some(logo),
            Err(e) => {
                warn!("Branding header without logo: {}", e);
                None
            }
        },
        None => None,
    };

    package.set_part(HEADER_PART, header_xml(brand, logo.as_ref()));
    package.set_part(FOOTER_PART, footer_xml());

    Ok(())
}

/// Font size in the half-points WordprocessingML uses
fn half_points(size: f32) -> u32 {
    (size * 2.0).round() as u32
}

fn logo_run(logo: &EmbeddedLogo) -> String {
    format!(
        concat!(
            "<w:r><w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"1\" name=\"Brand logo\"/>",
            "<a:graphic><a:graphicData uri=\"{pic}\"><pic:pic>",
            "<pic:nvPicPr><pic:cNvPr id=\"0\" name=\"brand-logo.png\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic>",
            "</wp:inline></w:drawing></w:r>"
        ),
        cx = logo.width_emu,
        cy = logo.height_emu,
        pic = PIC_NS,
        rel = LOGO_REL_ID,
    )
}

fn header_cell(paragraph: &str) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="2500" w:type="pct"/></w:tcPr>{}</w:tc>"#,
        paragraph
    )
}

/// Header part: logo and firm name on the left, contact line on the right
fn header_xml(brand: &BrandSpec, logo: Option<&EmbeddedLogo>) -> String {
    let left = format!(
        concat!(
            "<w:p>{}<w:r><w:rPr><w:b/><w:color w:val=\"{}\"/><w:sz w:val=\"{}\"/></w:rPr>",
            "<w:t xml:space=\"preserve\">  {}</w:t></w:r></w:p>"
        ),
        logo.map(logo_run).unwrap_or_default(),
        brand.brand_color.hex(),
        half_points(brand.docx_brand_size),
        escape_text(&brand.firm_name),
    );
    let right = format!(
        concat!(
            "<w:p><w:pPr><w:jc w:val=\"right\"/></w:pPr>",
            "<w:r><w:rPr><w:sz w:val=\"{}\"/></w:rPr>",
            "<w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>"
        ),
        half_points(brand.docx_contact_size),
        escape_text(&brand.contact_line),
    );

    format!(
        concat!(
            "{decl}<w:hdr xmlns:w=\"{w}\" xmlns:r=\"{r}\" xmlns:wp=\"{wp}\" xmlns:a=\"{a}\" xmlns:pic=\"{pic}\">",
            "<w:tbl><w:tblPr><w:tblW w:w=\"5000\" w:type=\"pct\"/><w:tblLayout w:type=\"autofit\"/></w:tblPr>",
            "<w:tblGrid><w:gridCol w:w=\"{col}\"/><w:gridCol w:w=\"{col}\"/></w:tblGrid>",
            "<w:tr>{left}{right}</w:tr></w:tbl>",
            // a table cannot be the last block of a header
            "<w:p/>",
            "</w:hdr>"
        ),
        decl = XML_DECLARATION,
        w = WML_NS,
        r = REL_NS,
        wp = WPD_NS,
        a = DML_NS,
        pic = PIC_NS,
        col = HEADER_COLUMN_TWIPS,
        left = header_cell(&left),
        right = header_cell(&right),
    )
}

/// Footer part: "Page N", right aligned
fn footer_xml() -> String {
    format!(
        concat!(
            "{}<w:ftr xmlns:w=\"{}\" xmlns:r=\"{}\">",
            "<w:p><w:pPr><w:jc w:val=\"right\"/></w:pPr>",
            "<w:r><w:t xml:space=\"preserve\">Page </w:t></w:r>",
            "<w:fldSimple w:instr=\"PAGE \\* MERGEFORMAT\"><w:r><w:t>1</w:t></w:r></w:fldSimple>",
            "</w:p></w:ftr>"
        ),
        XML_DECLARATION, WML_NS, REL_NS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::convert::{build_package, PageText};
    use crate::docx::inspect::summarize;
    use crate::layout::PageGeometry;
    use crate::logo::RasterLogo;

    fn base_docx(pages: usize) -> Vec<u8> {
        let pages: Vec<PageText> = (0..pages)
            .map(|i| PageText {
                geometry: PageGeometry::letter(),
                lines: vec![format!("Clause {}", i + 1)],
            })
            .collect();
        build_package(&pages, None).unwrap().to_bytes().unwrap()
    }

    fn logo_png() -> Vec<u8> {
        RasterLogo {
            width: 4,
            height: 2,
            rgba: vec![0, 54, 84, 255].repeat(8),
        }
        .to_png()
        .unwrap()
    }

    #[test]
    fn test_every_section_branded() {
        let branded = brand_docx(&base_docx(3), &BrandSpec::default(), Some(&logo_png())).unwrap();
        let summary = summarize(&branded).unwrap();

        assert_eq!(summary.section_count, 3);
        assert_eq!(summary.branded_sections, 3);
        assert_eq!(summary.header_texts.len(), 1);
        assert!(summary.header_texts[0].contains("Logical Books"));
        assert!(summary.header_texts[0].contains("info@logicalbooks.com"));
        assert!(summary.header_has_picture);
        assert!(summary.footer_has_page_field);
        assert_eq!(summary.footer_texts, vec!["Page 1"]);
        assert_eq!(summary.paragraphs, vec!["Clause 1", "Clause 2", "Clause 3"]);
    }

    #[test]
    fn test_logo_sized_by_aspect_ratio() {
        let mut package = DocxPackage::new();
        let logo = embed_logo(&mut package, &logo_png(), 0.33).unwrap();

        assert_eq!(logo.width_emu, 301752);
        assert_eq!(logo.height_emu, 150876);
        assert!(package.contains(LOGO_PART));
        assert!(package
            .xml_part("word/_rels/brand-header.xml.rels")
            .unwrap()
            .contains(r#"Target="media/brand-logo.png""#));
    }

    #[test]
    fn test_bad_logo_gives_text_only_header() {
        let branded = brand_docx(&base_docx(1), &BrandSpec::default(), Some(b"not a png")).unwrap();
        let summary = summarize(&branded).unwrap();
        let package = DocxPackage::from_bytes(&branded).unwrap();

        assert!(!summary.header_has_picture);
        assert!(summary.header_texts[0].contains("Logical Books"));
        assert!(!package.contains(LOGO_PART));
    }

    #[test]
    fn test_rebranding_is_idempotent() {
        let brand = BrandSpec::default();
        let once = brand_docx(&base_docx(2), &brand, Some(&logo_png())).unwrap();
        let twice = brand_docx(&once, &brand, Some(&logo_png())).unwrap();

        let a = DocxPackage::from_bytes(&once).unwrap();
        let b = DocxPackage::from_bytes(&twice).unwrap();
        let names_a: Vec<_> = a.part_names().collect();
        let names_b: Vec<_> = b.part_names().collect();
        assert_eq!(names_a, names_b);
        for name in names_a {
            assert_eq!(a.part(name), b.part(name), "part {} changed", name);
        }
    }

    #[test]
    fn test_existing_header_replaced() {
        let mut package = DocxPackage::from_bytes(&base_docx(1)).unwrap();
        package.set_part(
            "word/_rels/document.xml.rels",
            relationships_xml(&[Relationship::new("rId7", rel_type::HEADER, "header1.xml")]).unwrap(),
        );
        package.set_part("word/header1.xml", format!(r#"<w:hdr xmlns:w="{}"/>"#, WML_NS));

        brand_package(&mut package, &BrandSpec::default(), None).unwrap();

        assert!(!package.contains("word/header1.xml"));
        assert!(package.contains(HEADER_PART));
        let rels = package.xml_part("word/_rels/document.xml.rels").unwrap();
        assert!(!rels.contains("rId7"));
        assert!(rels.contains(r#"Target="brand-header.xml""#));
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("word/document.xml", "word/brand-header.xml"), "brand-header.xml");
        assert_eq!(relative_target("word/brand-header.xml", "word/media/brand-logo.png"), "media/brand-logo.png");
        assert_eq!(relative_target("doc/main.xml", "word/brand-footer.xml"), "/word/brand-footer.xml");
        assert_eq!(relative_target("main.xml", "word/brand-footer.xml"), "word/brand-footer.xml");
    }

    #[test]
    fn test_half_points() {
        assert_eq!(half_points(11.0), 22);
        assert_eq!(half_points(9.0), 18);
    }
}
