//! Named, lazily resolved placeholders.
//!
//! A placeholder lives in one of two namespaces:
//!
//! - **block-level** ([`BlockParam`]): stands for a whole sub-fragment and appears
//!   bare in a template's segment list;
//! - **value-level** ([`ValueParam`]): stands for one scalar and appears inside a
//!   fragment's argument list.
//!
//! Resolution is decided at generation time: a binding supplied by the caller wins
//! over the placeholder's inline default; with neither, resolution fails with
//! [`Error::MissingParameter`](crate::Error::MissingParameter).

use std::collections::HashMap;
use std::fmt;

use crate::fragment::{Arg, Fragment};
use crate::value::{ParamKey, Value};

/// Which namespace a placeholder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLevel {
    Block,
    Value,
}

impl fmt::Display for ParamLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamLevel::Block => f.write_str("block"),
            ParamLevel::Value => f.write_str("value"),
        }
    }
}

/// Resolution state of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<T> {
    Unbound,
    Defaulted(T),
    Bound(T),
}

impl<T> Resolution<T> {
    /// The resolved payload, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Resolution::Unbound => None,
            Resolution::Defaulted(v) | Resolution::Bound(v) => Some(v),
        }
    }

    pub fn as_ref(&self) -> Resolution<&T> {
        match self {
            Resolution::Unbound => Resolution::Unbound,
            Resolution::Defaulted(v) => Resolution::Defaulted(v),
            Resolution::Bound(v) => Resolution::Bound(v),
        }
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self, Resolution::Unbound)
    }
}

/// A named placeholder with an optional inline default.
///
/// `T` is the payload of the namespace: [`Fragment`] for block-level placeholders,
/// [`Value`] for value-level ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Param<T> {
    key: ParamKey,
    default: Option<T>,
}

/// Placeholder substituted by an entire sub-fragment.
pub type BlockParam = Param<Fragment>;

/// Placeholder substituted by one scalar inside a fragment's argument list.
pub type ValueParam = Param<Value>;

impl<T> Param<T> {
    /// Creates an unbound placeholder.
    pub fn new(key: impl Into<ParamKey>) -> Self {
        Self {
            key: key.into(),
            default: None,
        }
    }

    /// Sets the inline default, replacing any previous one.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::{Resolution, Value, ValueParam};
    ///
    /// let p = ValueParam::new("limit").with_default(10);
    /// assert_eq!(p.resolution(None), Resolution::Defaulted(&Value::Int(10)));
    /// ```
    pub fn with_default(mut self, value: impl Into<T>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn key(&self) -> &ParamKey {
        &self.key
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// Tri-state resolution against an optional caller binding.
    pub fn resolution<'a>(&'a self, binding: Option<&'a T>) -> Resolution<&'a T> {
        match (binding, self.default.as_ref()) {
            (Some(bound), _) => Resolution::Bound(bound),
            (None, Some(default)) => Resolution::Defaulted(default),
            (None, None) => Resolution::Unbound,
        }
    }

    pub(crate) fn resolve<'a>(
        &'a self,
        level: ParamLevel,
        binding: Option<&'a T>,
    ) -> crate::Result<&'a T> {
        let resolution = self.resolution(binding);
        tracing::trace!(%level, key = %self.key, bound = matches!(resolution, Resolution::Bound(_)), "resolving placeholder");
        resolution
            .value()
            .ok_or_else(|| crate::Error::missing(level, &self.key))
    }
}

impl ValueParam {
    /// Wraps the placeholder into a fragment whose text holds exactly one `?`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlaceholderMismatch`](crate::Error::PlaceholderMismatch)
    /// when `sql` does not contain exactly one placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::ValueParam;
    ///
    /// let f = ValueParam::new("name").to_fragment("upper(?)")?;
    /// assert_eq!(f.sql(), "upper(?)");
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn to_fragment(self, sql: &str) -> crate::Result<Fragment> {
        Fragment::new(sql, vec![Arg::Param(self)])
    }

    /// A bare `?` fragment bound to this placeholder.
    pub fn slot(self) -> Fragment {
        Fragment::placeholder(Arg::Param(self))
    }
}

/// Maps each field name to a `?` fragment whose value-level placeholder is keyed
/// by the same name, ready for [`Template::insert`](crate::Template::insert) and
/// [`Template::update`](crate::Template::update).
///
/// # Examples
///
/// ```
/// use sqlx_fragments::param::slots;
///
/// let fields = slots(["name", "email"]);
/// assert_eq!(fields[1].0, "email");
/// assert_eq!(fields[1].1.sql(), "?");
/// ```
pub fn slots<I, S>(fields: I) -> Vec<(String, Fragment)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .map(|field| {
            let field: String = field.into();
            let slot = ValueParam::new(field.clone()).slot();
            (field, slot)
        })
        .collect()
}

/// Caller-supplied bindings for one generation.
///
/// Block bindings replace block-level placeholders with sub-fragments, value
/// bindings replace value-level placeholders with scalars. The two namespaces
/// never see each other's keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    blocks: HashMap<ParamKey, Fragment>,
    values: HashMap<ParamKey, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a block-level placeholder.
    pub fn block(mut self, key: impl Into<ParamKey>, fragment: impl Into<Fragment>) -> Self {
        self.set_block(key, fragment);
        self
    }

    /// Binds a value-level placeholder.
    pub fn value(mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.set_value(key, value);
        self
    }

    pub fn set_block(&mut self, key: impl Into<ParamKey>, fragment: impl Into<Fragment>) {
        self.blocks.insert(key.into(), fragment.into());
    }

    pub fn set_value(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn block_binding(&self, key: &ParamKey) -> Option<&Fragment> {
        self.blocks.get(key)
    }

    pub fn value_binding(&self, key: &ParamKey) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_param_starts_unbound() {
        let p = ValueParam::new("id");
        assert!(p.resolution(None).is_unbound());
    }

    #[test]
    fn test_binding_beats_default() {
        let p = ValueParam::new("id").with_default(1);
        let bound = Value::Int(2);
        assert_eq!(p.resolution(Some(&bound)), Resolution::Bound(&Value::Int(2)));
        assert_eq!(p.resolution(None), Resolution::Defaulted(&Value::Int(1)));
    }

    #[test]
    fn test_later_default_replaces_earlier() {
        let p = ValueParam::new("id").with_default(1).with_default(3);
        assert_eq!(p.default_value(), Some(&Value::Int(3)));
    }

    #[test]
    fn test_resolve_missing() {
        let p = BlockParam::new(0usize);
        let err = p.resolve(ParamLevel::Block, None).unwrap_err();
        match err {
            Error::MissingParameter { level, key } => {
                assert_eq!(level, ParamLevel::Block);
                assert_eq!(key, ParamKey::Index(0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_fragment_requires_one_placeholder() {
        assert!(ValueParam::new("a").to_fragment("? + ?").is_err());
        assert!(ValueParam::new("a").to_fragment("lower(?)").is_ok());
    }

    #[test]
    fn test_bindings_keep_namespaces_apart() {
        let bindings = Bindings::new().value("k", 7).block("k", Fragment::text("t.k = 1"));
        assert_eq!(bindings.value_binding(&"k".into()), Some(&Value::Int(7)));
        assert_eq!(bindings.block_binding(&"k".into()).map(Fragment::sql), Some("t.k = 1"));
    }
}
