//! sift runner library.
//!
//! Exposes the runner's building blocks for integration testing.
//! In production, `sift-runner` is used as a binary (main.rs).

pub mod cli;
pub mod handler;
pub mod logging;
pub mod metrics_export;
