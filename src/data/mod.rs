//! Annotation export ingestion, label tables and platform upload.

pub mod labelbox;
pub mod mapping;
pub mod upload;
