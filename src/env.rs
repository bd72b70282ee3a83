use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Process-wide variable bindings and the current working directory.
///
/// The map is seeded from the parent process environment at startup. `export`
/// is the only writer; `echo` expansion and child launch are the readers.
/// Children receive the map on top of the environment they inherit.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
}

impl Environment {
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Look up a variable. The map is the single source of truth; a binding
    /// removed from it is gone even if the process environment still has it.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_seeded_from_the_process_environment() {
        let env = Environment::new();
        assert_eq!(env.get_var("PATH"), stdenv::var("PATH").ok());
    }

    #[test]
    fn removed_binding_stays_gone() {
        let mut env = Environment::new();
        env.set_var("NSH_ENV_TEST", "v");
        assert_eq!(env.get_var("NSH_ENV_TEST").as_deref(), Some("v"));
        env.vars.remove("NSH_ENV_TEST");
        assert!(env.get_var("NSH_ENV_TEST").is_none());
    }
}
