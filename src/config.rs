//! Branding constants and file locations
//!
//! Nothing here is read from the environment or a config file; the
//! binaries only let the caller move the project root.

use std::path::{Path, PathBuf};

/// An RGB colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Build a colour from 8-bit components
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// `RRGGBB` form used by WordprocessingML `w:color`
    pub fn hex(&self) -> String {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("{:02X}{:02X}{:02X}", to_u8(self.r), to_u8(self.g), to_u8(self.b))
    }
}

/// Firm identity and typography used by both brand pipelines
#[derive(Debug, Clone)]
pub struct BrandSpec {
    /// Firm name shown next to the logo
    pub firm_name: String,
    /// Contact line shown right-aligned in the header
    pub contact_line: String,
    /// Navy used for the firm name and title
    pub brand_color: Rgb,
    /// Gold used for the header rule
    pub rule_color: Rgb,
    /// Grey used for the page label
    pub footer_color: Rgb,
    /// PDF firm name size in points
    pub pdf_brand_size: f32,
    /// PDF contact line size in points
    pub pdf_contact_size: f32,
    /// PDF page label size in points
    pub pdf_footer_size: f32,
    /// PDF first-page title size in points
    pub pdf_title_size: f32,
    /// PDF header rule width in points
    pub pdf_rule_width: f32,
    /// Height the logo is drawn at in the PDF header, in points
    pub pdf_logo_height: f32,
    /// DOCX firm name size in points
    pub docx_brand_size: f32,
    /// DOCX contact line size in points
    pub docx_contact_size: f32,
    /// Width of the DOCX header logo in inches
    pub docx_logo_width_in: f64,
    /// Pixel height of the cached PNG logo
    pub png_logo_size: u32,
}

impl Default for BrandSpec {
    fn default() -> Self {
        Self {
            firm_name: "Logical Books".to_string(),
            contact_line: "logicalbooks.com  \u{2022}  (336) 858\u{2011}3549  \u{2022}  info@logicalbooks.com"
                .to_string(),
            brand_color: Rgb::from_u8(0x00, 0x36, 0x54),
            rule_color: Rgb::from_u8(0xF5, 0xBD, 0x02),
            footer_color: Rgb { r: 0.29, g: 0.34, b: 0.39 },
            pdf_brand_size: 12.0,
            pdf_contact_size: 9.5,
            pdf_footer_size: 9.5,
            pdf_title_size: 16.0,
            pdf_rule_width: 1.5,
            pdf_logo_height: 24.0,
            docx_brand_size: 11.0,
            docx_contact_size: 9.0,
            docx_logo_width_in: 0.33,
            png_logo_size: 128,
        }
    }
}

/// One named contract produced from the shared template
#[derive(Debug, Clone, PartialEq)]
pub struct ContractVariant {
    /// File name without extension
    pub stem: String,
    /// Title stamped on the first page of the PDF variant
    pub title: String,
}

impl ContractVariant {
    pub fn new(stem: &str, title: &str) -> Self {
        Self {
            stem: stem.to_string(),
            title: title.to_string(),
        }
    }

    /// The monthly and catch-up agreements
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("monthly-bookkeeping-agreement", "Monthly Bookkeeping Agreement"),
            Self::new(
                "catch-up-bookkeeping-agreement",
                "Catch\u{2011}Up Bookkeeping Agreement",
            ),
        ]
    }
}

/// Where the template, logo, cached intermediates and outputs live
#[derive(Debug, Clone)]
pub struct ContractPaths {
    pub template_pdf: PathBuf,
    pub logo_svg: PathBuf,
    pub logo_png: PathBuf,
    pub base_docx: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ContractPaths {
    fn default() -> Self {
        Self::rooted(Path::new("."))
    }
}

impl ContractPaths {
    /// Standard project layout below `root`
    pub fn rooted(root: &Path) -> Self {
        Self {
            template_pdf: root.join("lbooks-contract_template.pdf"),
            logo_svg: root.join("assets").join("img").join("favicon.svg"),
            logo_png: root.join("assets").join("img").join("favicon-128.png"),
            base_docx: root.join("contracts").join("_base-from-pdf.docx"),
            output_dir: root.join("contracts"),
        }
    }

    /// Output path for a variant with the given extension
    pub fn output_for(&self, variant: &ContractVariant, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", variant.stem, extension))
    }
}
