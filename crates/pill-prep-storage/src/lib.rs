//! Storage upload smoke test for captured pill photos.
//!
//! Generates a synthetic capture, uploads it to the photo bucket, records
//! its metadata row and reads the row back. The remote service sits behind
//! [`StorageBackend`] so the flow can run against an in-memory fake.

mod capture;
mod client;
mod error;
mod smoke;
mod test_image;

pub use capture::*;
pub use client::*;
pub use error::*;
pub use smoke::*;
pub use test_image::*;
