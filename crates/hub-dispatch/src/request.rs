//! Request parameters.

use std::collections::BTreeMap;

/// Ordered string parameters of a route or request.
pub type Query = BTreeMap<String, String>;

/// Parameters of the request being dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    vars: Query,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_query(vars: Query) -> Self {
        Self { vars }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Reads `key` through the command filter: only `[A-Za-z0-9_.-]` survive
    /// and leading dots are dropped. Missing or empty values give `default`.
    pub fn get_cmd(&self, key: &str, default: &str) -> String {
        match self.get(key).map(cmd) {
            Some(v) if !v.is_empty() => v,
            _ => default.to_string(),
        }
    }

    pub fn vars(&self) -> &Query {
        &self.vars
    }
}

/// The command filter applied by [`Request::get_cmd`].
pub fn cmd(value: &str) -> String {
    let filtered: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    filtered.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cmd_filters() {
        let req = Request::new()
            .with("controller", "../entries;drop")
            .with("task", "")
            .with("view", "..hidden");
        assert_eq!(req.get_cmd("controller", "x"), "entriesdrop");
        assert_eq!(req.get_cmd("task", "display"), "display");
        assert_eq!(req.get_cmd("missing", "blog"), "blog");
        assert_eq!(req.get_cmd("view", ""), "hidden");
    }

    #[test]
    fn test_vars_are_ordered() {
        let req = Request::new().with("task", "b").with("controller", "a");
        let keys: Vec<&String> = req.vars().keys().collect();
        assert_eq!(keys, vec!["controller", "task"]);
    }
}
