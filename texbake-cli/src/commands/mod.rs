//! CLI commands.

pub mod bake;
pub mod common;
