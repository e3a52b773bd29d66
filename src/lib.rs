//! # Gremlin Harness
//!
//! Schema reverse engineering and script generation for Gremlin property
//! graphs.
//!
//! Reverse engineering samples vertices and edges per label, decodes typed
//! (GraphSON) results, folds constraint and index catalogues in, and
//! produces JSON-Schema-like packages per label and relationship type.
//! Forward engineering turns such a model back into a Gremlin script that
//! recreates the vertices and edges.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ GraphSource │──▶│    Sampling      │──▶│   Packages   │
//! │ Gremlin/Dump│   │ decode+synthesize│   │ (JSON out)   │
//! └─────────────┘   └──────────────────┘   └──────────────┘
//!
//! ┌─────────────┐   ┌──────────────────┐
//! │ Model JSON  │──▶│ Script generator │──▶ g.addV(...) / g.addE(...)
//! └─────────────┘   └──────────────────┘
//! ```
//!
//! The pure engine (decoder, constraint parser, synthesizer, spatial
//! registry, script generator) lives in the `gremlin-harness-core` crate;
//! this crate adds configuration, logging, sources and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! gremlin-harness labels --dump ./snapshot.json
//! gremlin-harness reverse --dump ./snapshot.json --labels Person,City
//! gremlin-harness forward --model ./model.json --output ./create.groovy
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Logger setup |
//! | [`error`] | `{message, stack}` error reports |
//! | [`source`] | Graph source abstraction |
//! | [`gremlin`] | Gremlin traversal adapter |
//! | [`dump`] | JSON snapshot source |
//! | [`sampling`] | Reverse-engineering orchestration |
//! | [`reverse`] | `reverse` command |
//! | [`forward`] | `forward` command |
//! | [`labels`] | `labels` command |

pub mod config;
pub mod dump;
pub mod error;
pub mod forward;
pub mod gremlin;
pub mod labels;
pub mod logging;
pub mod reverse;
pub mod sampling;
pub mod source;
