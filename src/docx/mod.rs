//! DOCX conversion and branding module

pub mod brand;
pub mod convert;
pub mod inspect;
pub mod package;
pub mod xml;

// Re-export commonly used items
pub use brand::{brand_docx, brand_package, embed_logo, EmbeddedLogo};
pub use convert::{convert_pdf_to_docx, ensure_base_docx, BaseStatus};
pub use inspect::{summarize, DocxSummary};
pub use package::DocxPackage;
