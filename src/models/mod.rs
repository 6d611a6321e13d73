//! Core data models for the asset upload service.
//!
//! Everything here is request-scoped: built once, never mutated, never
//! persisted. `UploadResult` is the JSON shape returned to HTTP clients.

pub mod asset;
