use crate::env::Environment;
use anyhow::Result;
use std::io::{Read, Write};
use std::process::Stdio;

/// Process exit code as shells report it.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// mirroring the POSIX convention.
pub type ExitCode = i32;

/// Abstraction over a readable input stream that can also be converted into
/// a [`Stdio`] handle when a child process is spawned.
///
/// Implementors typically wrap standard input or an in-memory buffer. A
/// blanket implementation exists for any type that implements `Read` and
/// `Into<Stdio>`.
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle when a child process is spawned.
///
/// A blanket implementation exists for any type that implements `Write` and `Into<Stdio>`.
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Object-safe trait for anything the dispatcher can execute: built-ins,
/// external programs and shell scripts.
pub trait ExecutableCommand {
    /// Executes the command to completion and returns its exit status.
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that recognizes a command name and builds an executable for it.
///
/// Returns `None` when the factory doesn't recognize `name`, letting the
/// dispatcher fall through to the next factory in line. Implementations can
/// use the environment to resolve executables (e.g. via PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
