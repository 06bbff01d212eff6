//! Error types for the contract branding library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the contract branding library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DOCX container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML rewrite error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML read-back error
    #[error("XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// SVG parsing error
    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),

    /// Raster image error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The contract template is absent
    #[error("Template PDF not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// A required part is missing from a DOCX package
    #[error("DOCX package is missing part: {0}")]
    MissingPart(String),

    /// Logo could not be produced or embedded
    #[error("Logo error: {0}")]
    Logo(String),

    /// General error
    #[error("{0}")]
    General(String),
}
