//! Stamping the contract template with the brand overlay
//!
//! Every page of the template gets its own overlay sized to that page,
//! composited on top of the original content. One output PDF is produced
//! per contract variant; only the first-page title differs between them.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use log::{debug, info, warn};

use crate::config::{BrandSpec, ContractPaths, ContractVariant};
use crate::error::{Error, Result};
use crate::layout::PageGeometry;
use crate::logo::{self, RasterLogo};
use super::merge::merge_overlay;
use super::metadata::page_geometries;
use super::overlay::{render_overlay, PageBrand};

/// Device pixels per point used when rasterizing the logo for the PDF header
const LOGO_OVERSAMPLE: f32 = 4.0;

/// A loaded template ready to be stamped any number of times
pub struct Template {
    doc: Document,
    pages: Vec<(ObjectId, PageGeometry)>,
}

impl Template {
    /// Load a template PDF
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::TemplateNotFound(path.to_path_buf()));
        }

        let mut doc = Document::load(path)?;
        doc.decompress();

        let pages = page_geometries(&doc)?;
        if pages.is_empty() {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }

        debug!("Loaded template {} with {} pages", path.display(), pages.len());
        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Produce one branded variant as PDF bytes
    ///
    /// The template itself is not modified.
    pub fn stamp(
        &self,
        variant: &ContractVariant,
        brand: &BrandSpec,
        logo: Option<&RasterLogo>,
    ) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();

        for (index, (page_id, geometry)) in self.pages.iter().enumerate() {
            let page = PageBrand {
                page_number: index + 1,
                title: (index == 0).then_some(variant.title.as_str()),
            };
            let overlay = render_overlay(*geometry, brand, page, logo);
            merge_overlay(&mut doc, *page_id, overlay)?;
        }

        doc.compress();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Rasterize the SVG logo at the resolution used in the PDF header
pub fn load_pdf_logo(svg: &Path, brand: &BrandSpec) -> Result<RasterLogo> {
    let tree = logo::load_svg(svg)?;
    let height_px = (brand.pdf_logo_height * LOGO_OVERSAMPLE).round() as u32;
    logo::rasterize(&tree, height_px)
}

/// Stamp the template once per variant and write the results
///
/// Returns the written paths in variant order. The template is checked
/// before anything is created on disk. Each output is fully rendered in
/// memory and written in a single call.
pub fn stamp_contracts(
    paths: &ContractPaths,
    brand: &BrandSpec,
    variants: &[ContractVariant],
) -> Result<Vec<PathBuf>> {
    if !paths.template_pdf.exists() {
        return Err(Error::TemplateNotFound(paths.template_pdf.clone()));
    }

    let template = Template::load(&paths.template_pdf)?;
    fs::create_dir_all(&paths.output_dir)?;

    let logo = match load_pdf_logo(&paths.logo_svg, brand) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!("Stamping without logo: {}", e);
            None
        }
    };

    let mut written = Vec::with_capacity(variants.len());
    for variant in variants {
        let output = paths.output_for(variant, "pdf");
        info!("Stamping {} pages for {}", template.page_count(), variant.title);

        let bytes = template.stamp(variant, brand, logo.as_ref())?;
        fs::write(&output, bytes)?;
        written.push(output);
    }

    Ok(written)
}
