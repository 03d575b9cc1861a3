//! rk-import library interface
//!
//! Batch import and upload pipeline for a ReadKnows library server.
//! Exposed as a library so integration tests can drive the pipeline with
//! their own collaborators and a local HTTP double.

pub mod commands;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod selection;
pub mod services;

pub use crate::error::{ImportError, ImportResult};
pub use crate::pipeline::{BatchPipeline, RunReport, RunStatus};
pub use crate::selection::SelectionSet;
