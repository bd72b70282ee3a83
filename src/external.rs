use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::style;
use anyhow::{Result, anyhow};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Interpreter used for shell scripts, resolved through PATH first.
const SCRIPT_INTERPRETER: &str = "bash";
/// Fallback when the PATH lookup for the interpreter fails.
const SCRIPT_INTERPRETER_FALLBACK: &str = "/bin/bash";

/// Decide whether `path` names a shell script rather than an ordinary
/// executable.
///
/// A file is a script when its last `.`-separated suffix is `sh`, or when it
/// exists and starts with the `#!` shebang marker. The shebang's interpreter
/// path is deliberately ignored; scripts always run through the external
/// interpreter. Detection only selects the launcher.
pub fn is_script(path: &Path) -> bool {
    if path.extension().is_some_and(|ext| ext == "sh") {
        return true;
    }
    let mut magic = [0u8; 2];
    match File::open(path) {
        Ok(mut file) => file.read_exact(&mut magic).is_ok() && &magic == b"#!",
        Err(_) => false,
    }
}

/// Command that is not a builtin: an external program launched directly.
pub struct ExternalCommand {
    name: String,
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// Resolve `name` against PATH. When the lookup fails the raw name is
    /// kept so the spawn error carries the OS diagnostic for it.
    pub fn resolve(env: &Environment, name: &str, args: &[&str]) -> Self {
        let program = env
            .get_var("PATH")
            .and_then(|paths| {
                find_command_path(OsStr::new(&paths), Path::new(name))
                    .map(|p| p.into_owned().into_os_string())
            })
            .unwrap_or_else(|| name.into());
        Self {
            name: name.to_string(),
            program,
            args: args.iter().map(|a| a.into()).collect(),
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// Catch-all: every name that reaches this factory becomes an external
    /// launch, so it must come last in the dispatcher's factory list.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::resolve(env, name, args)))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let mut child = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin.stdio())
            .stdout(stdout.stdio())
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn()
            .map_err(|e| anyhow!("{}: {}", self.name, e))?;
        let exit_status = child.wait()?;
        match exit_status.code() {
            Some(code) => Ok(code),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

/// A shell script run through the external `bash` interpreter.
///
/// The script path is passed as the interpreter's first argument; the
/// script's own arguments follow.
pub struct ScriptCommand {
    path: OsString,
    args: Vec<OsString>,
}

impl ScriptCommand {
    pub fn new(path: &str, args: &[&str]) -> Self {
        Self {
            path: path.into(),
            args: args.iter().map(|a| a.into()).collect(),
        }
    }
}

impl CommandFactory for Factory<ScriptCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if is_script(Path::new(name)) {
            Some(Box::new(ScriptCommand::new(name, args)))
        } else {
            None
        }
    }
}

impl ExecutableCommand for ScriptCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let interpreter = env
            .get_var("PATH")
            .and_then(|paths| {
                find_command_path(OsStr::new(&paths), Path::new(SCRIPT_INTERPRETER))
                    .map(Cow::into_owned)
            })
            .unwrap_or_else(|| PathBuf::from(SCRIPT_INTERPRETER_FALLBACK));

        let spawned = std::process::Command::new(interpreter)
            .arg(&self.path)
            .args(&self.args)
            .stdin(stdin.stdio())
            .stdout(stdout.stdio())
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                eprintln!("{}exec failed: {}{}", style::ERR, e, style::RESET);
                return Ok(-1);
            }
        };

        let exit_status = child.wait()?;
        // A script killed by a signal has no exit code to propagate.
        Ok(exit_status.code().unwrap_or(-1))
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returned if it exists.
/// - Relative path with multiple components (e.g. `bin/sh`): returned if it exists.
/// - `./`-prefixed path: returned if it exists.
/// - Single component (no separators): each directory in `search_paths`
///   (PATH) is searched and the first existing match returned.
/// - Empty path: `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(only), None) => find_in_path(search_paths, only.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(cmd);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
