//! Ambit Tools - Developer utilities for inspecting ambit analyses
//!
//! This crate renders forests, derivations and charts, builds text and JSON
//! reports, and hosts the `ambit` command-line front end.

pub mod cli;
pub mod report;
pub mod visualize;

pub use report::{Summary, render_cache_stats, render_report, render_summary, snapshot};
pub use visualize::*;
