//! # ednova (library)
//!
//! Library surface of the EdNova binary, exposing the HTTP API and CLI
//! modules so integration tests can build the router in-process.

pub mod api;
pub mod cli;
