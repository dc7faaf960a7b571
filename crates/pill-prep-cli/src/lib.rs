//! Command-line driver for the pill dataset preparation pipeline.
//!
//! ```text
//! pill-prep map          label map + registry      -> mapping reports
//! pill-prep select       code list + usage log     -> selection workbook
//! pill-prep load-script  curated selection JSON    -> SQL + capture checklist
//! pill-prep upload-test  generated JPEG            -> storage bucket + table
//! ```

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
