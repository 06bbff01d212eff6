//! Per-page brand overlay
//!
//! An overlay is a throwaway one-page PDF drawn at the exact size of the
//! page it will be merged onto. It carries only brand content: logo, firm
//! name, contact line, gold rule, page label and (first page) the title.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::config::{BrandSpec, Rgb};
use crate::error::{Error, Result};
use crate::layout::{brand_anchors, PageGeometry};
use crate::logo::RasterLogo;
use super::fonts::{pdf_literal, Face};

/// Resource name of the logo image XObject
pub const LOGO_RESOURCE: &str = "BrandLogo";

/// What goes on one page besides the fixed header
#[derive(Debug, Clone, Copy)]
pub struct PageBrand<'a> {
    /// 1-indexed page number
    pub page_number: usize,
    /// Variant title, drawn only when set
    pub title: Option<&'a str>,
}

/// A one-page drawing surface that becomes a standalone PDF
pub struct OverlayCanvas {
    doc: Document,
    geometry: PageGeometry,
    content: String,
    fonts: Dictionary,
    xobjects: Dictionary,
}

impl OverlayCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            geometry,
            content: String::new(),
            fonts: Dictionary::new(),
            xobjects: Dictionary::new(),
        }
    }

    /// Register a face on first use and return its resource name
    fn font(&mut self, face: Face) -> &'static str {
        let name = face.resource_name();
        if !self.fonts.has(name.as_bytes()) {
            let font_id = self.doc.add_object(Object::Dictionary(face.font_dictionary()));
            self.fonts.set(name, Object::Reference(font_id));
        }
        name
    }

    pub fn fill_color(&mut self, color: Rgb) {
        self.content.push_str(&format!("{} {} {} rg\n", color.r, color.g, color.b));
    }

    pub fn stroke_color(&mut self, color: Rgb) {
        self.content.push_str(&format!("{} {} {} RG\n", color.r, color.g, color.b));
    }

    /// Stroke a straight line
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32) {
        self.content.push_str(&format!("{} w\n", width));
        self.content.push_str(&format!("{} {} m\n{} {} l\nS\n", from.0, from.1, to.0, to.1));
    }

    /// Draw text with its baseline starting at (x, y)
    pub fn text(&mut self, face: Face, size: f32, x: f32, y: f32, text: &str) {
        let font = self.font(face);
        self.content.push_str("BT\n");
        self.content.push_str(&format!("/{} {} Tf\n", font, size));
        self.content.push_str(&format!("1 0 0 1 {} {} Tm\n", x, y));
        self.content.push_str(&format!("{} Tj\n", pdf_literal(text)));
        self.content.push_str("ET\n");
    }

    /// Draw text so that it ends at `right`
    pub fn text_right_aligned(&mut self, face: Face, size: f32, right: f32, y: f32, text: &str) {
        let width = face.text_width(text, size);
        self.text(face, size, right - width, y, text);
    }

    /// Place a raster logo with its lower-left corner at (x, y), `height` points tall
    ///
    /// Fails when the pixel buffer is inconsistent; the canvas is left
    /// untouched in that case.
    pub fn logo(&mut self, logo: &RasterLogo, x: f32, y: f32, height: f32) -> Result<()> {
        let expected = logo.width as usize * logo.height as usize * 4;
        if logo.width == 0 || logo.height == 0 || logo.rgba.len() != expected {
            return Err(Error::Logo(format!(
                "{}x{} logo has {} bytes of pixel data",
                logo.width,
                logo.height,
                logo.rgba.len()
            )));
        }

        let mut image = Dictionary::new();
        image.set("Type", Object::Name(b"XObject".to_vec()));
        image.set("Subtype", Object::Name(b"Image".to_vec()));
        image.set("Width", Object::Integer(logo.width as i64));
        image.set("Height", Object::Integer(logo.height as i64));
        image.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image.set("BitsPerComponent", Object::Integer(8));

        if logo.has_transparency() {
            let mut mask = Dictionary::new();
            mask.set("Type", Object::Name(b"XObject".to_vec()));
            mask.set("Subtype", Object::Name(b"Image".to_vec()));
            mask.set("Width", Object::Integer(logo.width as i64));
            mask.set("Height", Object::Integer(logo.height as i64));
            mask.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
            mask.set("BitsPerComponent", Object::Integer(8));
            let mask_id = self.doc.add_object(Stream::new(mask, logo.alpha()));
            image.set("SMask", Object::Reference(mask_id));
        }

        let image_id = self.doc.add_object(Stream::new(image, logo.rgb()));
        self.xobjects.set(LOGO_RESOURCE, Object::Reference(image_id));

        let width = height * logo.aspect_ratio();
        self.content.push_str(&format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            width, height, x, y, LOGO_RESOURCE
        ));
        Ok(())
    }

    /// Close the canvas into a standalone one-page PDF
    pub fn finish(mut self) -> Document {
        let mut resources = Dictionary::new();
        if !self.fonts.is_empty() {
            resources.set("Font", Object::Dictionary(self.fonts));
        }
        if !self.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(self.xobjects));
        }

        // Isolate our graphics state from whatever follows on the page
        let content = format!("q\n{}Q\n", self.content);
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let pages_id = self.doc.new_object_id();
        let media_box = self.geometry.media_box();
        let page_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", Object::Array(media_box.iter().map(|v| Object::Real(*v)).collect())),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ]);
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc
    }
}

/// Draw the brand header and footer for one page
///
/// A logo that cannot be placed is reported and skipped; the rest of the
/// overlay is unaffected.
pub fn render_overlay(
    geometry: PageGeometry,
    brand: &BrandSpec,
    page: PageBrand<'_>,
    logo: Option<&RasterLogo>,
) -> Document {
    let anchors = brand_anchors(&geometry);
    let mut canvas = OverlayCanvas::new(geometry);

    if let Some(logo) = logo {
        if let Err(e) = canvas.logo(logo, anchors.left, anchors.logo_bottom, brand.pdf_logo_height) {
            log::warn!("Skipping logo on page {}: {}", page.page_number, e);
        }
    }

    canvas.fill_color(brand.brand_color);
    canvas.text(
        Face::Bold,
        brand.pdf_brand_size,
        anchors.brand_text_left,
        anchors.text_baseline,
        &brand.firm_name,
    );
    canvas.text_right_aligned(
        Face::Regular,
        brand.pdf_contact_size,
        anchors.right,
        anchors.text_baseline,
        &brand.contact_line,
    );

    canvas.stroke_color(brand.rule_color);
    canvas.line(
        (anchors.left, anchors.rule_y),
        (anchors.right, anchors.rule_y),
        brand.pdf_rule_width,
    );

    canvas.fill_color(brand.footer_color);
    canvas.text_right_aligned(
        Face::Regular,
        brand.pdf_footer_size,
        anchors.right,
        anchors.footer_baseline,
        &page_label(page.page_number),
    );

    if let Some(title) = page.title {
        canvas.fill_color(brand.brand_color);
        canvas.text(Face::Bold, brand.pdf_title_size, anchors.left, anchors.title_baseline, title);
    }

    canvas.finish()
}

/// Footer label for a 1-indexed page
pub fn page_label(page_number: usize) -> String {
    format!("Page {}", page_number)
}

/// Object id of the overlay's only page
pub(crate) fn overlay_page_id(overlay: &Document) -> Result<ObjectId> {
    overlay
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| Error::General("Overlay has no page".to_string()))
}
