//! Report rendering.

pub mod generator;

pub use generator::{generate_details_report, generate_top_report};
