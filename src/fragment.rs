//! Parameterized SQL pieces.
//!
//! A [`Fragment`] is SQL text plus the ordered arguments for its positional `?`
//! placeholders. Every constructor keeps the number of `?` in the text equal to
//! the number of arguments, in the same left-to-right order; combinators build new
//! fragments instead of mutating existing ones.

use serde::Serialize;

use crate::param::{Bindings, ParamLevel, ValueParam};
use crate::value::Value;

/// One positional argument of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Concrete scalar.
    Value(Value),
    /// Value-level placeholder, resolved when a statement is generated.
    Param(ValueParam),
}

impl Arg {
    /// A concrete argument.
    pub fn value(value: impl Into<Value>) -> Self {
        Arg::Value(value.into())
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<ValueParam> for Arg {
    fn from(param: ValueParam) -> Self {
        Arg::Param(param)
    }
}

/// Counts positional placeholders in `sql`.
pub fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}

/// Immutable `(text, ordered arguments)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    text: String,
    args: Vec<Arg>,
}

impl Fragment {
    /// Creates a fragment, checking that `text` holds one `?` per argument.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::{Arg, Fragment};
    ///
    /// let f = Fragment::new("age between ? and ?", vec![Arg::value(18), Arg::value(65)])?;
    /// assert_eq!(f.args().len(), 2);
    ///
    /// assert!(Fragment::new("age > ?", vec![]).is_err());
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn new(text: impl Into<String>, args: Vec<Arg>) -> crate::Result<Self> {
        let text: String = text.into();
        let placeholders = placeholder_count(&text);
        if placeholders != args.len() {
            return Err(crate::Error::PlaceholderMismatch {
                placeholders,
                values: args.len(),
            });
        }
        Ok(Self { text, args })
    }

    /// Literal SQL with no arguments, rejecting text that holds a `?`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::Fragment;
    ///
    /// assert_eq!(Fragment::literal("now()")?.sql(), "now()");
    /// assert!(Fragment::literal("a = ?").is_err());
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn literal(sql: impl Into<String>) -> crate::Result<Self> {
        Self::new(sql, Vec::new())
    }

    /// Literal SQL with no arguments, taken as is; the caller guarantees it holds
    /// no `?`.
    pub(crate) fn text(sql: impl Into<String>) -> Self {
        Self {
            text: sql.into(),
            args: Vec::new(),
        }
    }

    /// The vacuous fragment: empty text, no arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A bare `?` carrying one argument.
    pub fn placeholder(arg: impl Into<Arg>) -> Self {
        Self {
            text: "?".to_owned(),
            args: vec![arg.into()],
        }
    }

    /// Text with one `?` placeholder and exactly one argument, without re-scanning.
    pub(crate) fn single(text: String, arg: Arg) -> Self {
        Self {
            text,
            args: vec![arg],
        }
    }

    pub fn sql(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// `true` when the text is empty; such a fragment contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Value-level placeholders carried by this fragment, in argument order.
    pub fn params(&self) -> impl Iterator<Item = &ValueParam> {
        self.args.iter().filter_map(|arg| match arg {
            Arg::Param(p) => Some(p),
            Arg::Value(_) => None,
        })
    }

    /// Joins fragments (or literal text) with `joiner`, concatenating arguments in
    /// the same order.
    ///
    /// The joiner is only inserted once the accumulated text is non-empty, so
    /// leading empty parts leave no dangling separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::{Arg, Fragment, ValueParam};
    ///
    /// let f = Fragment::concat(", ", [
    ///     Fragment::literal("a")?,
    ///     Fragment::placeholder(Arg::value(3)),
    ///     ValueParam::new("b").slot(),
    /// ]);
    /// assert_eq!(f.sql(), "a, ?, ?");
    /// assert_eq!(f.args().len(), 2);
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn concat<I, F>(joiner: &str, parts: I) -> Fragment
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        let mut out = Fragment::empty();
        for part in parts {
            let part: Fragment = part.into();
            if !out.text.is_empty() {
                out.text.push_str(joiner);
            }
            out.text.push_str(&part.text);
            out.args.extend(part.args);
        }
        out
    }

    /// Prefixes a compiled condition with `where`, or stays empty when there is
    /// no condition.
    pub fn where_clause(self) -> Fragment {
        self.prefixed("where ")
    }

    pub(crate) fn prefixed(self, keyword: &str) -> Fragment {
        if self.text.is_empty() {
            return self;
        }
        Fragment {
            text: format!("{keyword}{}", self.text),
            args: self.args,
        }
    }

    /// Wraps the text in parentheses.
    pub(crate) fn parenthesized(self) -> Fragment {
        Fragment {
            text: format!("({})", self.text),
            args: self.args,
        }
    }

    /// Resolves every value-level placeholder against `bindings`, falling back to
    /// each placeholder's default.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`](crate::Error::MissingParameter) for the first
    ///   placeholder that has neither a binding nor a default
    /// - [`Error::PlaceholderMismatch`](crate::Error::PlaceholderMismatch) when the
    ///   text holds a different number of `?` than there are values
    pub fn resolve(&self, bindings: &Bindings) -> crate::Result<Statement> {
        self.resolve_with(|param| {
            param
                .resolve(ParamLevel::Value, bindings.value_binding(param.key()))
                .cloned()
        })
    }

    pub(crate) fn resolve_with<F>(&self, mut lookup: F) -> crate::Result<Statement>
    where
        F: FnMut(&ValueParam) -> crate::Result<Value>,
    {
        let values = self
            .args
            .iter()
            .map(|arg| match arg {
                Arg::Value(v) => Ok(v.clone()),
                Arg::Param(p) => lookup(p),
            })
            .collect::<crate::Result<Vec<_>>>()?;
        let placeholders = placeholder_count(&self.text);
        if placeholders != values.len() {
            return Err(crate::Error::PlaceholderMismatch {
                placeholders,
                values: values.len(),
            });
        }
        Ok(Statement {
            sql: self.text.clone(),
            values,
        })
    }
}

impl From<Statement> for Fragment {
    fn from(stmt: Statement) -> Self {
        Fragment {
            text: stmt.sql,
            args: stmt.values.into_iter().map(Arg::Value).collect(),
        }
    }
}

/// A fully resolved fragment: plain SQL text and a flat list of concrete values,
/// ready to hand to a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    sql: String,
    values: Vec<Value>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }
}
