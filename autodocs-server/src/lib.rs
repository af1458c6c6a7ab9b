//! autodocs-server: HTTP front end for the autodocs agent pipeline.
//!
//! A run request creates a task record, then the [`orchestrator::Pipeline`]
//! drives research → write → deploy either inline or on a background tokio
//! task. Clients poll the [`store`] through the API for progress.

pub mod config;
pub mod orchestrator;
pub mod server;
pub mod store;
pub mod web;
