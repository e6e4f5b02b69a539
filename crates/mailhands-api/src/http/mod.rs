//! HTTP interface module.
//!
//! REST endpoints for task submission and status, provider listing and
//! DOM analysis.

pub mod handlers;
pub mod routes;
