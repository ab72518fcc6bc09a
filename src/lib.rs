//! Core library for the `wirebench` CLI.
//!
//! A fixed pool of workers each holds one TCP, HTTP, or WebSocket connection
//! to a single target and runs request/response cycles against it. Results
//! are merged into one aggregate that decides the final throughput report,
//! or aborts the whole run on the first fatal failure.
pub mod args;
pub mod config;
pub mod domain;
pub mod driver;
pub mod engine;
pub mod entry;
pub mod error;
pub mod report;
pub mod system;
