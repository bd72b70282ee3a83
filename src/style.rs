//! Terminal colors and the startup banner.
//!
//! All styling uses 24-bit ANSI escape sequences written straight to the
//! stream. The exact color values are presentation only; nothing parses them
//! back.

use std::io::{self, Write};

/// Regular output, white/light gray.
pub const FG: &str = "\x1b[38;2;230;230;230m";
/// Dimmed text.
pub const DIM: &str = "\x1b[38;2;154;160;166m";
/// Bright cyan for the prompt and command names.
pub const ACCENT: &str = "\x1b[38;2;100;200;255m";
/// Bright green for success.
pub const OK: &str = "\x1b[38;2;100;255;100m";
/// Bright yellow/orange for warnings.
pub const WARN: &str = "\x1b[38;2;255;200;100m";
/// Bright red for errors.
pub const ERR: &str = "\x1b[38;2;255;100;100m";
/// Softer blue for informational text.
pub const INFO: &str = "\x1b[38;2;150;200;255m";
/// Reset to the terminal default.
pub const RESET: &str = "\x1b[0m";

/// Render the startup banner. Also used by the `clear` builtin after it
/// erases the screen.
pub fn banner(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{ACCENT}nsh — Nova Shell{RESET}")?;
    writeln!(out, "{INFO}nsh v{}{RESET}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "{INFO}Type `help` to show available commands!{RESET}")?;
    writeln!(out)
}
