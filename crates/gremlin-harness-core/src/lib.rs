//! # Gremlin Harness Core
//!
//! Pure schema-inference and script-generation logic for Gremlin Harness:
//! the shared data model, GraphSON decoding, constraint/index text parsing,
//! schema synthesis from sampled documents, and Gremlin script generation.
//!
//! This crate contains no tokio, network, or filesystem dependencies. Every
//! function is a deterministic transformation of its inputs, so it is safe to
//! call from any number of threads.

pub mod constraints;
pub mod document;
pub mod graphson;
pub mod models;
pub mod script;
pub mod spatial;
pub mod synthesize;
