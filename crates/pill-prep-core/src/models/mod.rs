//! Domain models for the pill dataset preparation pipeline.

mod code;
mod drug;
mod report;
mod selected;
mod selection;

pub use code::*;
pub use drug::*;
pub use report::*;
pub use selected::*;
pub use selection::*;
