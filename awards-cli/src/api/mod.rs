//! Document script service client
//!
//! The live tracker documents are edited through a small set of script
//! functions exposed over a JSON RPC endpoint. [`ScriptService`] is the seam:
//! [`ScriptClient`] talks HTTP, tests use an in-memory document.

pub mod client;
pub mod error;
pub mod functions;
pub mod models;

#[cfg(test)]
pub mod memory;

pub use client::{ScriptClient, ScriptService};
pub use error::RemoteError;
pub use functions::{DocumentHandle, RemoteCall, create_document};
