//! nsh — a small interactive command shell.
//!
//! The crate provides the pieces of a classic read-eval-print shell: a
//! whitespace tokenizer, a fixed registry of built-in commands, `$VAR`
//! expansion inside `echo`, and launchers for external programs and shell
//! scripts. The main entry point is [`Interpreter`], which ties those pieces
//! together into the interactive loop exposed by the `nsh` binary.
//!
//! The public modules [`command`] and [`env`] expose the traits and types
//! needed to implement additional commands and to interact with the process
//! environment.

mod builtin;
pub mod command;
pub mod env;
mod expand;
mod external;
mod interpreter;
mod io_adapters;
mod lexer;
pub mod style;

/// The interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
pub use io_adapters::{MemReader, MemWriter};
