//! Shared static-site deployment domain primitives.
//!
//! This crate owns the provisioning request/response contract, archive
//! extraction, and scratch workspace handling. It intentionally excludes AWS SDK,
//! HTTP, and Lambda runtime concerns; those live in `site_deploy_lambda`.

pub mod archive;
pub mod content_type;
pub mod contract;
pub mod error;
pub mod scratch;

pub use error::DeploymentError;
