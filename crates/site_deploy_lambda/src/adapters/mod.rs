//! Collaborator seams. Each trait has one production adapter here; tests swap
//! in recording doubles.

pub mod callback;
pub mod edge_cache;
pub mod object_store;
pub mod webhook;
