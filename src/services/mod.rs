//! Upload pipeline services.
//!
//! - `naming`: identity and object names for a new asset
//! - `thumbnail`: image resizing
//! - `storage_adapter`: the object-store capability the pipeline writes through
//! - `local_store`: disk-backed `StorageAdapter`
//! - `upload_service`: the all-or-nothing upload orchestrator

pub mod local_store;
pub mod naming;
pub mod storage_adapter;
pub mod thumbnail;
pub mod upload_service;
