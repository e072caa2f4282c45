// # zonesync
//
// Thin integration layer: argument parsing, credentials loading, record
// store construction and logging setup. All DNS logic lives in
// zonesync-core.

pub mod cli;
pub mod logging;
pub mod providers;

pub use cli::{Cli, Command};
