//! CMS access layer.
//!
//! A thin typed wrapper over the headless CMS REST API. The [`CmsApi`]
//! trait is the seam the sync functions are written against; the real
//! client talks HTTP, tests use an in-memory store.

mod client;
mod model;

pub use client::{CmsApi, CmsError, RealCms};
pub use model::{ContentRecord, Locale, MediaRef, RecordData};

#[cfg(test)]
pub(crate) mod testing;
