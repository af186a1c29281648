//! Input documents
//!
//! These are the documents the launcher reads: the missing-results manifest
//! naming the work still to do, and the catalogue of known model ids that
//! symbolic model names are resolved against.

pub mod catalogue;
pub mod manifest;
