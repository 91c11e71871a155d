//! Command line interface

pub mod commands;
pub mod deploy;
pub mod display;

pub use commands::{CliArgs, Commands, GlobalArgs};
