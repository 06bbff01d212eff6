//! PDF reading and stamping module

pub mod fonts;
pub mod merge;
pub mod metadata;
pub mod overlay;
pub mod stamp;
pub mod text;

// Re-export commonly used items
pub use merge::merge_overlay;
pub use metadata::{count_pages, extract_metadata, page_geometries, page_geometry, PdfMetadata};
pub use overlay::{page_label, render_overlay, OverlayCanvas, PageBrand};
pub use stamp::{load_pdf_logo, stamp_contracts, Template};
pub use text::page_lines;
