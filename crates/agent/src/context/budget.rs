//! Per-model context budgets.

use chatrelay_core::error::{Error, Result};
use std::collections::HashMap;

/// Model name → context size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLimits {
    limits: HashMap<String, usize>,
}

impl ModelLimits {
    /// The built-in table.
    pub fn with_defaults() -> Self {
        let mut limits = Self::empty();
        limits.set("gpt-3.5-turbo", 4096);
        limits.set("gpt-3.5-turbo-16k", 16384);
        limits
    }

    pub fn empty() -> Self {
        Self {
            limits: HashMap::new(),
        }
    }

    pub fn set(&mut self, model: impl Into<String>, limit: usize) {
        self.limits.insert(model.into(), limit);
    }

    /// Layer configured entries over this table; same-name entries win.
    pub fn with_overrides(mut self, overrides: &HashMap<String, usize>) -> Self {
        for (model, limit) in overrides {
            self.set(model.clone(), *limit);
        }
        self
    }

    pub fn get(&self, model: &str) -> Option<usize> {
        self.limits.get(model).copied()
    }
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Maximum cumulative character count handed to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget(usize);

impl ContextBudget {
    pub fn new(chars: usize) -> Self {
        Self(chars)
    }

    /// Half the model's size limit. Unknown models fail closed.
    pub fn for_model(model: &str, limits: &ModelLimits) -> Result<Self> {
        limits
            .get(model)
            .map(|limit| Self(limit / 2))
            .ok_or_else(|| Error::UnknownModel(model.to_string()))
    }

    /// An explicit override wins without consulting the table.
    pub fn resolve(model: &str, limits: &ModelLimits, override_chars: Option<usize>) -> Result<Self> {
        match override_chars {
            Some(chars) => Ok(Self(chars)),
            None => Self::for_model(model, limits),
        }
    }

    pub fn chars(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models() {
        let limits = ModelLimits::with_defaults();
        assert_eq!(
            ContextBudget::for_model("gpt-3.5-turbo-16k", &limits).unwrap().chars(),
            8192
        );
        assert_eq!(
            ContextBudget::for_model("gpt-3.5-turbo", &limits).unwrap().chars(),
            2048
        );
    }

    #[test]
    fn unknown_model_fails_closed() {
        let err = ContextBudget::for_model("gpt-9", &ModelLimits::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownModel(ref m) if m == "gpt-9"));
    }

    #[test]
    fn odd_limit_rounds_down() {
        let mut limits = ModelLimits::empty();
        limits.set("tiny", 7);
        assert_eq!(ContextBudget::for_model("tiny", &limits).unwrap().chars(), 3);
    }

    #[test]
    fn configured_limits_override_builtins() {
        let overrides = HashMap::from([
            ("gpt-3.5-turbo".to_string(), 1000),
            ("gpt-4o".to_string(), 128_000),
        ]);
        let limits = ModelLimits::with_defaults().with_overrides(&overrides);
        assert_eq!(limits.get("gpt-3.5-turbo"), Some(1000));
        assert_eq!(limits.get("gpt-4o"), Some(128_000));
        assert_eq!(limits.get("gpt-3.5-turbo-16k"), Some(16384));
    }

    #[test]
    fn override_skips_table() {
        let budget = ContextBudget::resolve("not-in-table", &ModelLimits::empty(), Some(500)).unwrap();
        assert_eq!(budget.chars(), 500);
        assert!(ContextBudget::resolve("not-in-table", &ModelLimits::empty(), None).is_err());
    }
}
