//! Water
//!
//! Command-line driver of the Water compiler: reads source files, runs
//! the compiler crates over them and writes the resulting class files.
//!
//! - [`cli`]: argument parsing for the `water` binary
//! - [`driver`]: [`run`], and the mapping of failures to exit codes

pub mod cli;
pub mod driver;

pub use cli::Cli;
pub use driver::{run, DriverError, Options};

pub use water_compiler::OptimizationConfig;
pub use water_core::VERSION;

/// Line printed by `water --version`.
pub fn version_line() -> String {
    format!("Water Compiler (Rust): {}", VERSION)
}
