//! Driver pieces for the hostmon binary, exposed for tests.

pub mod args;
pub mod config;
pub mod monitors;
pub mod report;
