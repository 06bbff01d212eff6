//! DOCX contract generation
//!
//! Converts the template PDF to a cached base DOCX, then writes one
//! branded copy per contract variant.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, log_enabled, warn, Level};

use crate::config::{BrandSpec, ContractPaths, ContractVariant};
use crate::docx::{brand_docx, ensure_base_docx, summarize, BaseStatus};
use crate::error::{Error, Result};
use crate::logo::{self, LogoStatus};

/// Read the cached PNG logo, if there is one
fn read_logo_png(paths: &ContractPaths) -> Option<Vec<u8>> {
    if !paths.logo_png.exists() {
        warn!("No PNG logo at {}; headers will be text only", paths.logo_png.display());
        return None;
    }
    match fs::read(&paths.logo_png) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Cannot read {}: {}", paths.logo_png.display(), e);
            None
        }
    }
}

/// Build the branded DOCX contracts
///
/// Returns the written paths in variant order. The template is checked
/// before anything is created on disk. The PNG logo and base DOCX are
/// only derived when absent, or when `refresh` is set.
pub fn make_docx_contracts(
    paths: &ContractPaths,
    brand: &BrandSpec,
    variants: &[ContractVariant],
    refresh: bool,
) -> Result<Vec<PathBuf>> {
    if !paths.template_pdf.exists() {
        return Err(Error::TemplateNotFound(paths.template_pdf.clone()));
    }

    fs::create_dir_all(&paths.output_dir)?;

    match logo::ensure_png(&paths.logo_svg, &paths.logo_png, brand.png_logo_size, refresh) {
        Ok(LogoStatus::SourceMissing) => warn!("No SVG logo at {}", paths.logo_svg.display()),
        Ok(status) => debug!("Logo PNG: {:?}", status),
        Err(e) => warn!("Could not render logo: {}", e),
    }

    match ensure_base_docx(&paths.template_pdf, &paths.base_docx, refresh)? {
        BaseStatus::Cached => info!("Using cached base {}", paths.base_docx.display()),
        BaseStatus::Converted => info!("Built base {}", paths.base_docx.display()),
    }
    let base = fs::read(&paths.base_docx)?;
    let logo_png = read_logo_png(paths);

    let mut written = Vec::with_capacity(variants.len());
    for variant in variants {
        let output = paths.output_for(variant, "docx");
        info!("Branding {}", variant.title);

        let bytes = brand_docx(&base, brand, logo_png.as_deref())?;
        if log_enabled!(Level::Debug) {
            let summary = summarize(&bytes)?;
            debug!(
                "{}: {} sections, {} branded, header picture: {}",
                output.display(),
                summary.section_count,
                summary.branded_sections,
                summary.header_has_picture
            );
        }

        fs::write(&output, bytes)?;
        written.push(output);
    }

    Ok(written)
}
