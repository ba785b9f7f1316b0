//! Plugin capability interface.
//!
//! Plugins are external collaborators that extend the engine with verbs or
//! validation checks. They are plain trait implementations registered into
//! a lookup table before the pipeline runs for the first time; discovery
//! and loading are out of scope.

use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::output::CommandResult;
use crate::parser::{self, ParsedCommand};
use crate::projection::Projection;

/// A plugin-supplied verb. Consulted by the intent classifier before the
/// built-in grammar.
pub trait VerbPlugin {
    /// The verb token this plugin claims. Lowercase, no whitespace.
    fn verb(&self) -> &str;

    /// One-line help text shown by `help`.
    fn help(&self) -> &str;

    /// Execute with the raw argument text (everything after the verb).
    fn execute(&self, args: &str, engine: &mut Engine) -> Result<CommandResult>;
}

/// A plugin-supplied validation check, run by the validation stage after
/// the built-in checks.
pub trait CommandCheck {
    fn name(&self) -> &str;

    fn check(&self, command: &ParsedCommand, projection: &Projection) -> Result<()>;
}

#[derive(Default)]
pub struct PluginRegistry {
    verbs: HashMap<String, Rc<dyn VerbPlugin>>,
    checks: Vec<Rc<dyn CommandCheck>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verb handler. Built-in verbs and duplicates are rejected.
    pub fn register_verb(&mut self, plugin: Rc<dyn VerbPlugin>) -> Result<()> {
        let verb = plugin.verb().to_lowercase();
        if verb.is_empty() || verb.contains(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "invalid plugin verb '{verb}'"
            )));
        }
        if parser::canonical_verb(&verb).is_some() {
            return Err(Error::Validation(format!(
                "plugin verb '{verb}' collides with a built-in verb"
            )));
        }
        if self.verbs.contains_key(&verb) {
            return Err(Error::Validation(format!(
                "plugin verb '{verb}' is already registered"
            )));
        }
        self.verbs.insert(verb, plugin);
        Ok(())
    }

    pub fn register_check(&mut self, check: Rc<dyn CommandCheck>) {
        self.checks.push(check);
    }

    pub fn verb(&self, name: &str) -> Option<Rc<dyn VerbPlugin>> {
        self.verbs.get(name).cloned()
    }

    pub fn checks(&self) -> &[Rc<dyn CommandCheck>] {
        &self.checks
    }

    /// Registered verbs in sorted order, for `help`.
    pub fn verb_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.verbs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("verbs", &self.verb_names())
            .field("checks", &self.checks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl VerbPlugin for Noop {
        fn verb(&self) -> &str {
            "noop"
        }

        fn help(&self) -> &str {
            "do nothing"
        }

        fn execute(&self, _args: &str, _engine: &mut Engine) -> Result<CommandResult> {
            Ok(CommandResult::success(serde_json::json!({}), None))
        }
    }

    #[test]
    fn builtin_collision_is_rejected() {
        struct Shadow;
        impl VerbPlugin for Shadow {
            fn verb(&self) -> &str {
                "add"
            }
            fn help(&self) -> &str {
                "shadow"
            }
            fn execute(&self, _args: &str, _engine: &mut Engine) -> Result<CommandResult> {
                unreachable!()
            }
        }

        let mut registry = PluginRegistry::new();
        let err = registry.register_verb(Rc::new(Shadow)).expect_err("collision");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register_verb(Rc::new(Noop)).expect("first");
        assert!(registry.register_verb(Rc::new(Noop)).is_err());
        assert_eq!(registry.verb_names(), vec!["noop"]);
    }
}
