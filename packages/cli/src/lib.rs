//! # dirb
//!
//! Command-line access to a directory of JSON documents.
//!
//! ## Usage
//!
//! ```bash
//! dirb -d ~/shop init
//! dirb -d ~/shop create '{"title": "Dune"}'      # prints the new name
//! dirb -d ~/shop get Xk3_a9Q --pretty
//! dirb -d ~/shop update Xk3_a9Q '{"stock": 3}'
//! echo '{"title": "Emma"}' | dirb -d ~/shop overwrite Xk3_a9Q -
//! dirb -d ~/shop rm Xk3_a9Q
//! dirb -d ~/shop -c bk ls                        # the books collection
//! ```
//!
//! `DIRB_DIR` stands in for `--dir`; without either the current directory
//! is used. Generated names can start with `-`, so pass them after `--`
//! (`dirb get -- -x4Tq0b`).

pub mod cli;
pub mod commands;
pub mod registry;

pub use cli::{Cli, Command};
pub use commands::{run, run_with, CliError};
pub use registry::{Collection, Registry, RegistryError};
