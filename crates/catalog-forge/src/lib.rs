//! Catalog Forge: product page extraction, catalog copy, image processing and PDF/DOCX export.

pub mod catalog;
pub mod export;
pub mod extract;
pub mod generate;
pub mod images;
pub mod storage;
pub mod types;

pub use catalog::{apply_edit, apply_edits, assemble_catalog, CatalogEdit, ContentField};
pub use export::{export_filename, render_docx, render_pdf, ExportFormat, ExportOptions, ExportRequest};
pub use extract::{extract_product_html, ProductExtractor, SelectorProfile};
pub use generate::{content_from_reply, fallback_content, finalize_content, parse_suggestions};
pub use images::{optimize, process_upload, stock_photos, OptimizeRequest, StockQuery};
pub use storage::UploadStore;
pub use types::*;
