//! `$NAME` and `${NAME}` expansion for the `echo` built-in.

use crate::env::Environment;

/// Longest variable name considered during lookup. Longer names are silently
/// truncated, matching the fixed name buffer of classic implementations.
const MAX_VAR_NAME: usize = 255;

/// Expand every `$NAME` / `${NAME}` reference in `arg` against `env`.
///
/// - `${NAME}` expands `NAME`; an empty or unterminated brace form emits a
///   literal `$` and scanning resumes at the byte after it.
/// - `$` followed by a maximal run of `[A-Za-z0-9_]` expands that name.
/// - `$` followed by anything else is a literal `$`.
/// - Unset variables expand to the empty string.
pub fn expand_arg(arg: &str, env: &Environment) -> String {
    let chars: Vec<char> = arg.chars().collect();
    let mut out = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] != '$' {
            out.push(chars[pos]);
            pos += 1;
            continue;
        }

        if chars.get(pos + 1) == Some(&'{') {
            let name_start = pos + 2;
            match chars[name_start..].iter().position(|&c| c == '}') {
                Some(len) if len > 0 => {
                    let name: String = chars[name_start..name_start + len].iter().collect();
                    out.push_str(&lookup(env, name));
                    pos = name_start + len + 1;
                }
                // `${}` or a missing closing brace: keep the `$` literal.
                _ => {
                    out.push('$');
                    pos += 1;
                }
            }
        } else {
            let mut end = pos + 1;
            while end < chars.len() && is_name_char(chars[end]) {
                end += 1;
            }
            if end == pos + 1 {
                out.push('$');
                pos += 1;
            } else {
                let name: String = chars[pos + 1..end].iter().collect();
                out.push_str(&lookup(env, name));
                pos = end;
            }
        }
    }

    out
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lookup(env: &Environment, mut name: String) -> String {
    if name.len() > MAX_VAR_NAME {
        let mut cut = MAX_VAR_NAME;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    env.get_var(&name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        for (k, v) in pairs {
            env.set_var(*k, *v);
        }
        env
    }

    #[test]
    fn strings_without_dollar_pass_through() {
        let env = Environment::new();
        assert_eq!(expand_arg("hello-world_42", &env), "hello-world_42");
        assert_eq!(expand_arg("", &env), "");
    }

    #[test]
    fn simple_reference_expands() {
        let env = env_with(&[("GREETING", "hello")]);
        assert_eq!(expand_arg("$GREETING", &env), "hello");
    }

    #[test]
    fn brace_form_expands_inside_a_word() {
        let env = env_with(&[("FOO", "x")]);
        assert_eq!(expand_arg("a${FOO}b", &env), "axb");
    }

    #[test]
    fn unterminated_brace_keeps_dollar_literal() {
        let env = env_with(&[("FOO", "x")]);
        assert_eq!(expand_arg("${FOO", &env), "${FOO");
    }

    #[test]
    fn empty_brace_keeps_dollar_literal() {
        let env = Environment::new();
        assert_eq!(expand_arg("x${}y", &env), "x${}y");
    }

    #[test]
    fn bare_dollar_is_literal() {
        let env = Environment::new();
        assert_eq!(expand_arg("$", &env), "$");
        assert_eq!(expand_arg("$!", &env), "$!");
        assert_eq!(expand_arg("100$", &env), "100$");
    }

    #[test]
    fn unset_variable_expands_to_empty() {
        let env = Environment::new();
        assert_eq!(expand_arg("a$NSH_SURELY_UNSET_VAR_42", &env), "a");
    }

    #[test]
    fn name_run_stops_at_non_name_byte() {
        let env = env_with(&[("A", "1")]);
        assert_eq!(expand_arg("$A-$A", &env), "1-1");
    }

    #[test]
    fn overlong_name_is_truncated_before_lookup() {
        let long = "A".repeat(300);
        let truncated = "A".repeat(MAX_VAR_NAME);
        let env = env_with(&[(truncated.as_str(), "v")]);
        assert_eq!(expand_arg(&format!("${long}"), &env), "v");
    }
}
