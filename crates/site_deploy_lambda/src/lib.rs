//! AWS-oriented adapters and handlers for static-site deployments.
//!
//! This crate owns runtime integration details (Lambda handlers, S3 and
//! CloudFront adapters, callback delivery) on top of the pure contract and
//! archive primitives in `site_deploy_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
