use argh::FromArgs;
use nsh::{Interpreter, style};

#[derive(FromArgs)]
/// nsh — Nova Shell, a small interactive command shell.
///
/// Without arguments an interactive prompt is started. When a path is given
/// it runs non-interactively: shell scripts go through `bash` and the shell
/// exits with the script's status; other programs run directly.
struct ShellArgs {
    #[argh(positional, greedy)]
    /// program or script to run, followed by its arguments
    command: Vec<String>,
}

fn main() {
    let args: ShellArgs = argh::from_env();
    let mut shell = Interpreter::default();

    let code = match args.command.split_first() {
        Some((path, rest)) => {
            let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
            match shell.run_file(path, &rest) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("{}{}{}", style::ERR, err, style::RESET);
                    1
                }
            }
        }
        None => match shell.repl() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{}nsh: {}{}", style::ERR, err, style::RESET);
                1
            }
        },
    };
    std::process::exit(code);
}
