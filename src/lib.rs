//! rts-graph library: incremental dependency graphs for regression test selection.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
