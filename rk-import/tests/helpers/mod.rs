//! Test helper modules for rk-import integration tests
//!
//! - FakeServer: in-process ReadKnows API double on an ephemeral port
//! - candidate builders and a scripted collaborator for pipeline tests

#![allow(dead_code)]

pub mod fake_server;
pub mod scripted;

pub use fake_server::FakeServer;
pub use scripted::{scanned, scanned_selection, Script, ScriptedCollaborator};
