//! Asset upload service.
//!
//! Stores an uploaded file and, optionally, a thumbnail derived from it as a
//! single all-or-nothing operation. See [`services::upload_service`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
