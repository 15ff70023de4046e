//! Data models shared across the pipeline.

pub mod config;
pub mod report;
pub mod transaction;
