use crate::builtin::{self, Cd, Clear, Dir, Echo, Exit, Export, Help, Pwd};
use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::external::{self, ExternalCommand, ScriptCommand};
use crate::lexer;
use crate::style;
use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::{DefaultHistory, History};
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::io::Read;
use std::path::Path;
use std::process::Stdio;

/// Prompt shown for every interactive line.
const PROMPT: &str = "nsh $ ";
/// History lives in the working directory the shell was started from.
const HISTORY_FILE: &str = "history.txt";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports command types defined in this crate — builtins,
/// ScriptCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The shell's dispatcher and interactive driver.
///
/// The interpreter maintains an [`Environment`] and an ordered list of
/// [`CommandFactory`] objects that are queried to create commands by name.
/// See [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use nsh::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Run a single command invocation by name with arguments, inheriting
    /// the shell's standard streams.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<ExitCode> {
        let stdin = InheritedStdin(std::io::stdin().lock());
        self.run_with_io(name, args, Box::new(stdin), Box::new(std::io::stdout()))
    }

    fn run_with_io(
        &mut self,
        name: &str,
        args: &[&str],
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
    ) -> Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                return cmd.execute(stdin, stdout, &mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// One full dispatch cycle: tokenize, classify, execute.
    ///
    /// Blank lines are a no-op. A script that exits non-zero is reported
    /// explicitly; external programs surface their status silently through
    /// the returned code.
    pub fn dispatch_line(&mut self, line: &str) -> Result<ExitCode> {
        let stdin = InheritedStdin(std::io::stdin().lock());
        self.dispatch_line_io(line, Box::new(stdin), Box::new(std::io::stdout()))
    }

    pub(crate) fn dispatch_line_io(
        &mut self,
        line: &str,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
    ) -> Result<ExitCode> {
        let tokens = lexer::split_into_tokens(line);
        let Some((name, args)) = tokens.split_first() else {
            return Ok(0);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let code = self.run_with_io(name, &args, stdin, stdout)?;
        if code != 0 && !builtin::is_builtin(name) && external::is_script(Path::new(name)) {
            eprintln!(
                "{}Script exited with status: {}{}",
                style::WARN,
                code,
                style::RESET
            );
        }
        Ok(code)
    }

    /// Non-interactive invocation: run `path` directly, bypassing the
    /// builtin registry. Scripts propagate their exit status; ordinary
    /// programs report success once they have been waited for.
    pub fn run_file(&mut self, path: &str, args: &[&str]) -> Result<ExitCode> {
        let stdin: Box<dyn Stdin> = Box::new(InheritedStdin(std::io::stdin().lock()));
        let stdout: Box<dyn Stdout> = Box::new(std::io::stdout());
        if external::is_script(Path::new(path)) {
            Box::new(ScriptCommand::new(path, args)).execute(stdin, stdout, &mut self.env)
        } else {
            Box::new(ExternalCommand::resolve(&self.env, path, args))
                .execute(stdin, stdout, &mut self.env)?;
            Ok(0)
        }
    }

    /// The interactive read-eval-print loop.
    ///
    /// Prints the banner, loads history from [`HISTORY_FILE`], registers tab
    /// completion for builtin names and then reads, dispatches and records
    /// lines until end-of-input.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl: Editor<BuiltinCompleter, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(BuiltinCompleter));

        style::banner(&mut std::io::stdout())?;
        // Missing history is fine on first start.
        let _ = rl.load_history(HISTORY_FILE);

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.dispatch_line(&line) {
                        eprintln!("{}{}{}", style::ERR, e, style::RESET);
                    }
                    let _ = rl.add_history_entry(line.as_str());
                    persist_history(rl.history_mut(), Path::new(HISTORY_FILE));
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// The full registry: builtins first, then the script launcher, then the
    /// external launcher as the catch-all.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Dir>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Export>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Clear>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<ScriptCommand>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

/// History persistence is best effort: a failed write is reported and the
/// session continues.
fn persist_history(history: &mut dyn History, path: &Path) {
    if let Err(err) = history.save(path) {
        eprintln!(
            "{}nsh: could not save history: {}{}",
            style::WARN,
            err,
            style::RESET
        );
    }
}

struct InheritedStdin<'a>(std::io::StdinLock<'a>);

impl Read for InheritedStdin<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin<'_> {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}

/// Tab completion over the builtin names.
///
/// Completion only applies while the command name is still being typed:
/// once the prefix contains a space nothing is offered.
pub struct BuiltinCompleter;

/// Candidates for the buffer prefix `line[..pos]`: every builtin name with
/// that case-sensitive prefix, but only while the command word is still
/// being typed. Returns the offset the replacement starts at.
fn builtin_candidates(line: &str, pos: usize) -> (usize, Vec<&'static str>) {
    let word = line[..pos].trim_start_matches(' ');
    if word.contains(' ') {
        return (pos, Vec::new());
    }
    let names = builtin::BUILTIN_NAMES
        .iter()
        .copied()
        .filter(|name| name.starts_with(word))
        .collect();
    (pos - word.len(), names)
}

impl Completer for BuiltinCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, names) = builtin_candidates(line, pos);
        let candidates = names
            .into_iter()
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for BuiltinCompleter {
    type Hint = String;
}

impl Highlighter for BuiltinCompleter {}
impl Validator for BuiltinCompleter {}
impl Helper for BuiltinCompleter {}
