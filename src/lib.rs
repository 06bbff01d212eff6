//! Contract Branding Library
//!
//! Brands a bookkeeping firm's contract template in two ways:
//! - Convert the template PDF to an editable DOCX once, then inject a
//!   branded header (logo, firm name, contact line) and a page-number
//!   footer into each contract variant
//! - Stamp the template PDF directly with the same header and footer,
//!   plus a title on the first page
//!
//! # Example
//!
//! ```no_run
//! use contract_branding::config::{BrandSpec, ContractPaths, ContractVariant};
//! use contract_branding::pdf::stamp_contracts;
//! use std::path::Path;
//!
//! let paths = ContractPaths::rooted(Path::new("."));
//! let written = stamp_contracts(&paths, &BrandSpec::default(), &ContractVariant::defaults())
//!     .expect("Failed to stamp contracts");
//!
//! for path in written {
//!     println!("Wrote {}", path.display());
//! }
//! ```

pub mod config;
pub mod contracts;
pub mod docx;
pub mod error;
pub mod layout;
pub mod logo;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
