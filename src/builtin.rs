use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::expand::expand_arg;
use crate::interpreter::Factory;
use crate::style;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env as stdenv;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Every name the registry recognizes. Backs both registry membership checks
/// and tab completion.
pub const BUILTIN_NAMES: &[&str] = &[
    "exit", "cd", "echo", "export", "clear", "help", "pwd", "dir",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided IO streams and environment.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, &mut stdin, &mut stdout, env) {
            Ok(code) => Ok(code),
            Err(e) => {
                // Diagnostics go to stderr; command output stays on stdout.
                eprintln!("{}{}{}", style::ERR, e, style::RESET);
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.is_error {
            eprint!("{}", self.output);
            Ok(1)
        } else {
            stdout.write_all(self.output.as_bytes())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            // Builtin arguments are plain tokens, never options. The
            // end-of-options marker keeps argh from reading dash-prefixed
            // tokens (`echo -n`, `echo --help`) as flags.
            let mut argv = Vec::with_capacity(args.len() + 1);
            argv.push("--");
            argv.extend_from_slice(args);
            Some(match T::from_args(&[name], &argv) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Exit the shell with a success status.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        std::process::exit(0)
    }
}

fn print_cwd(stdout: &mut dyn Write) -> Result<ExitCode> {
    let cwd = stdenv::current_dir().map_err(|e| anyhow!("pwd: {}", e))?;
    writeln!(stdout, "{}", cwd.display())?;
    Ok(0)
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        print_cwd(stdout)
    }
}

#[derive(FromArgs)]
/// Print the current working directory, same as `pwd`.
pub struct Dir {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Dir {
    fn name() -> &'static str {
        "dir"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        print_cwd(stdout)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, changes to the directory named by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow!("cd: HOME not set")),
            },
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir).map_err(|e| anyhow!("cd: {}", e))?;
        stdenv::set_current_dir(&canonical).map_err(|e| anyhow!("cd: {}", e))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Set or list exported variables.
/// `export NAME=VALUE` sets NAME; `export NAME` ensures NAME is present;
/// a bare `export` lists every variable.
pub struct Export {
    #[argh(positional)]
    /// NAME=VALUE binding or a bare NAME; lists all variables when omitted
    pub binding: Option<String>,
}

impl BuiltinCommand for Export {
    fn name() -> &'static str {
        "export"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match self.binding {
            None => {
                // Sorted so the listing is stable across runs.
                let mut bindings: Vec<_> = env.vars.iter().collect();
                bindings.sort();
                for (name, value) in bindings {
                    writeln!(stdout, "declare -x {}={}", name, value)?;
                }
            }
            Some(binding) => match binding.split_once('=') {
                Some((name, value)) => env.set_var(name, value),
                None => {
                    if env.get_var(&binding).is_none() {
                        env.set_var(binding, "");
                    }
                }
            },
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output separated by single spaces,
/// expanding `$NAME` and `${NAME}` references, followed by a newline.
pub struct Echo {
    #[argh(positional, greedy)]
    /// text to print; `$VAR` references are expanded
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let expanded: Vec<String> = self.args.iter().map(|arg| expand_arg(arg, env)).collect();
        writeln!(stdout, "{}", expanded.join(" "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen and redraw the banner.
pub struct Clear {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        // Home the cursor, then erase the display.
        write!(stdout, "\x1b[H\x1b[2J")?;
        style::banner(stdout)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show the list of built-in commands.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        let entries: &[(&str, &str)] = &[
            ("exit", "Exit the shell"),
            ("pwd, dir", "Print current working directory"),
            ("cd <directory>", "Change directory"),
            ("export", "List all environment variables"),
            ("export VAR=value", "Set and export environment variable"),
            ("export VAR", "Export existing variable"),
            ("echo [text]", "Print text (supports $VAR expansion)"),
            ("clear", "Clear the screen"),
            ("help", "Show this help message"),
        ];
        for (name, description) in entries {
            writeln!(
                stdout,
                "  {}{:<20}{} {}{}{}",
                style::ACCENT,
                name,
                style::RESET,
                style::DIM,
                description,
                style::RESET
            )?;
        }
        writeln!(stdout)?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    // The working directory is process-global; tests that read or change it
    // must not interleave.
    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("nsh_test_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[test]
    fn pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let mut out = Vec::new();
        let cmd = Pwd { _args: Vec::new() };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env);
        assert!(res.is_ok());

        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, format!("{}\n", cur.display()));
    }

    #[test]
    fn dir_prints_current_dir_like_pwd() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let mut out = Vec::new();
        let cmd = Dir { _args: Vec::new() };
        cmd.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", cur.display())
        );
    }

    #[test]
    fn echo_expands_variables_and_joins_with_single_spaces() {
        let mut env = Environment::new();
        env.set_var("GREETING", "hello");

        let mut out = Vec::new();
        let echo = Echo {
            args: vec!["$GREETING".to_string(), "world".to_string()],
        };
        echo.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "hello world\n");
    }

    #[test]
    fn echo_without_args_prints_a_newline() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let echo = Echo { args: Vec::new() };
        echo.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n");
    }

    #[test]
    fn echo_unset_variable_leaves_single_space() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let echo = Echo {
            args: vec!["a$NSH_SURELY_UNSET_VAR_42".to_string(), "b".to_string()],
        };
        echo.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a b\n");
    }

    #[test]
    fn export_sets_a_binding_visible_to_echo() {
        let mut env = Environment::new();
        let export = Export {
            binding: Some("NSH_TEST_EXPORT=value42".to_string()),
        };
        export
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(env.get_var("NSH_TEST_EXPORT").as_deref(), Some("value42"));

        let mut out = Vec::new();
        let echo = Echo {
            args: vec!["${NSH_TEST_EXPORT}".to_string()],
        };
        echo.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "value42\n");
    }

    #[test]
    fn export_splits_on_first_equals_only() {
        let mut env = Environment::new();
        let export = Export {
            binding: Some("NSH_EQ=a=b=c".to_string()),
        };
        export
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(env.get_var("NSH_EQ").as_deref(), Some("a=b=c"));
    }

    #[test]
    fn export_bare_name_creates_empty_binding_when_absent() {
        let mut env = Environment::new();
        let export = Export {
            binding: Some("NSH_SURELY_UNSET_VAR_42".to_string()),
        };
        export
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(env.get_var("NSH_SURELY_UNSET_VAR_42").as_deref(), Some(""));
    }

    #[test]
    fn export_bare_name_keeps_existing_value() {
        let mut env = Environment::new();
        env.set_var("NSH_KEEP", "kept");
        let export = Export {
            binding: Some("NSH_KEEP".to_string()),
        };
        export
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(env.get_var("NSH_KEEP").as_deref(), Some("kept"));
    }

    #[test]
    fn export_without_args_lists_declare_lines_sorted() {
        let mut env = Environment::new();
        env.vars.clear();
        env.set_var("B_VAR", "2");
        env.set_var("A_VAR", "1");

        let mut out = Vec::new();
        let export = Export { binding: None };
        export
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();

        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "declare -x A_VAR=1\ndeclare -x B_VAR=2\n");
    }

    #[test]
    fn cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let cmd = Cd {
            target: Some(canonical_temp.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);
        assert!(res.is_ok());

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn cd_without_target_goes_home() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());

        let cmd = Cd { target: None };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);
        assert!(res.is_ok());

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        assert_eq!(new_cwd, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn cd_without_target_and_without_home_errors_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        env.vars.remove("HOME");

        let cmd = Cd { target: None };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert_eq!(res.unwrap_err().to_string(), "cd: HOME not set");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn cd_nonexistent_path_errors_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::new();
        let cmd = Cd {
            target: Some(format!("nsh_nonexistent_dir_{}", std::process::id())),
        };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert!(res.unwrap_err().to_string().starts_with("cd: "));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn help_lists_every_builtin() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let help = Help { _args: Vec::new() };
        help.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        let s = String::from_utf8(out).unwrap();
        for name in ["exit", "pwd, dir", "cd", "export", "echo", "clear", "help"] {
            assert!(s.contains(name), "help output should mention {name}");
        }
    }

    #[test]
    fn clear_homes_cursor_and_redraws_banner() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let clear = Clear { _args: Vec::new() };
        clear
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("\x1b[H\x1b[2J"));
        assert!(s.contains("Nova Shell"));
    }

    #[test]
    fn builtin_names_cover_the_registry() {
        for name in ["exit", "cd", "echo", "export", "clear", "help", "pwd", "dir"] {
            assert!(is_builtin(name));
        }
        assert!(!is_builtin("ls"));
    }
}
