//! Usage aggregation and selection ranking.

mod ranker;
mod usage;

pub use ranker::*;
pub use usage::*;
