//! Expression capture: quoting an expression together with the lexical
//! context it was written in.
//!
//! A [`Capture`] is created at the call site of a user-defined function and
//! handed, unevaluated, to a verb that evaluates it later against a table.
//! Name resolution is deferred entirely: capturing `min(Sepal.Length)` in a
//! scope with no such column succeeds, and the missing name surfaces only
//! when the capture is evaluated.
//!
//! The [`Env`] carries the caller's scalar bindings. At evaluation time a
//! table column always wins over a same-named binding.
//!
//! ```
//! use tidyframe::{Capture, Env, ColumnValue};
//!
//! let env = Env::new().bind("threshold", ColumnValue::Float64(5.0));
//! let capture = Capture::with_env("Sepal.Length > threshold", env).unwrap();
//! assert_eq!(capture.source(), "Sepal.Length > threshold");
//! ```

use crate::column::ColumnValue;
use crate::error::Result;
use crate::expr::{parse_expr, Expr};
use std::collections::HashMap;

/// A snapshot of the caller's lexical scope: named scalar bindings that a
/// capture can fall back to when a name is not a table column.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: HashMap<String, ColumnValue>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Add a binding, consuming and returning the environment so bindings
    /// chain at the capture site.
    pub fn bind(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// An unevaluated expression plus the environment captured with it.
///
/// Immutable once created: a capture can be evaluated any number of times
/// but never changed.
#[derive(Debug, Clone)]
pub struct Capture {
    source: String,
    expr: Expr,
    env: Env,
}

impl Capture {
    /// Capture an expression with an empty environment.
    ///
    /// Fails only on syntax errors; unresolved names fail later, at
    /// evaluation time.
    ///
    /// ```
    /// use tidyframe::Capture;
    ///
    /// let capture = Capture::parse("petal_area / 2").unwrap();
    /// assert!(Capture::parse("petal_area /").is_err());
    /// ```
    pub fn parse(source: &str) -> Result<Capture> {
        Self::with_env(source, Env::new())
    }

    /// Capture an expression carrying a snapshot of the caller's bindings.
    pub fn with_env(source: &str, env: Env) -> Result<Capture> {
        let expr = parse_expr(source)?;
        Ok(Capture {
            source: source.to_string(),
            expr,
            env,
        })
    }

    /// The original expression text, kept for logging and error context.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// All names the expression references, sorted and deduped.
    pub fn referenced_names(&self) -> Vec<String> {
        self.expr.referenced_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defers_name_resolution() {
        // No table, no environment: capturing still succeeds
        let capture = Capture::parse("no_such_column * 2").unwrap();
        assert_eq!(capture.referenced_names(), vec!["no_such_column".to_string()]);
    }

    #[test]
    fn test_capture_rejects_syntax_errors() {
        assert!(Capture::parse("a +").is_err());
        assert!(Capture::parse("(a").is_err());
    }

    #[test]
    fn test_env_bindings() {
        let env = Env::new()
            .bind("threshold", ColumnValue::Float64(5.0))
            .bind("label", ColumnValue::String("setosa".to_string()));

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("threshold").unwrap().as_f64(), Some(5.0));
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn test_capture_keeps_source_text() {
        let capture = Capture::parse("max(x) - min(x)").unwrap();
        assert_eq!(capture.source(), "max(x) - min(x)");
    }

    #[test]
    fn test_rebinding_before_capture_wins() {
        let env = Env::new()
            .bind("k", ColumnValue::Int64(1))
            .bind("k", ColumnValue::Int64(2));
        assert_eq!(env.get("k").unwrap().as_i64(), Some(2));
    }
}
