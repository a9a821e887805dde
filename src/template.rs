//! Reusable statement skeletons with deferred parameter binding.
//!
//! A [`Template`] is an ordered list of [`Segment`]s: literal text, block-level
//! placeholders and fragments (whose arguments may hold value-level
//! placeholders). Nothing is resolved until [`Template::generate_with`], which
//! works on `&self` and returns a fresh [`Statement`], so one template can serve
//! any number of generations, from any number of threads, each with its own
//! [`Bindings`].
//!
//! Resolution order for each placeholder: the call's bindings, then overrides
//! stored on the template, then the placeholder's inline default.

use std::collections::BTreeMap;

use crate::fragment::{Arg, Fragment, Statement};
use crate::order::OrderBy;
use crate::param::{BlockParam, Bindings, ParamLevel, Resolution, ValueParam};
use crate::value::{ParamKey, Value};
use crate::Error;

/// One element of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal SQL text, emitted as is. A `?` here has no value and fails
    /// generation with [`Error::PlaceholderMismatch`].
    Text(String),
    /// Placeholder for a whole sub-fragment.
    Block(BlockParam),
    /// Fragment, possibly carrying value-level placeholders.
    Fragment(Fragment),
}

impl From<&str> for Segment {
    fn from(sql: &str) -> Self {
        Segment::Text(sql.to_owned())
    }
}

impl From<String> for Segment {
    fn from(sql: String) -> Self {
        Segment::Text(sql)
    }
}

impl From<BlockParam> for Segment {
    fn from(param: BlockParam) -> Self {
        Segment::Block(param)
    }
}

impl From<Fragment> for Segment {
    fn from(fragment: Fragment) -> Self {
        Segment::Fragment(fragment)
    }
}

impl From<OrderBy> for Segment {
    fn from(order: OrderBy) -> Self {
        Segment::Fragment(order.to_fragment())
    }
}

impl From<Statement> for Segment {
    fn from(stmt: Statement) -> Self {
        Segment::Fragment(stmt.into())
    }
}

/// Reusable statement skeleton.
///
/// # Examples
///
/// ```
/// use sqlx_fragments::filter::{compile, Node};
/// use sqlx_fragments::{BlockParam, Bindings, FieldMap, Segment, Template, Value, ValueParam};
///
/// let fields = FieldMap::new().with("active", "u.active");
/// let active = compile(&Node::compare("active", "=", true), &fields)?.where_clause();
///
/// let template = Template::new([
///     Segment::from("select id from users u "),
///     Segment::from(BlockParam::new("where").with_default(active)),
///     Segment::from(" offset "),
///     Segment::from(ValueParam::new("skip").slot()),
///     Segment::from(" rows"),
/// ]);
///
/// assert!(template.generate().is_err());
///
/// let stmt = template.generate_with(&Bindings::new().value("skip", 20))?;
/// assert_eq!(stmt.sql(), "select id from users u where (u.active) = ? offset ? rows");
/// assert_eq!(stmt.values(), &[Value::Bool(true), Value::Int(20)]);
/// # Ok::<(), sqlx_fragments::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
    blocks: BTreeMap<ParamKey, Resolution<Fragment>>,
    values: BTreeMap<ParamKey, Resolution<Value>>,
}

impl Template {
    /// Builds a template, registering every block-level placeholder and every
    /// value-level placeholder found in fragment segments as unbound.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        let segments: Vec<Segment> = segments.into_iter().map(Into::into).collect();
        let mut blocks = BTreeMap::new();
        let mut values = BTreeMap::new();
        for segment in &segments {
            match segment {
                Segment::Text(_) => {}
                Segment::Block(param) => {
                    blocks.insert(param.key().clone(), Resolution::Unbound);
                }
                Segment::Fragment(fragment) => {
                    for param in fragment.params() {
                        values.insert(param.key().clone(), Resolution::Unbound);
                    }
                }
            }
        }
        Self {
            segments,
            blocks,
            values,
        }
    }

    /// Loads a template from JSON.
    ///
    /// The input is an array whose elements are:
    ///
    /// - a string: literal text;
    /// - `{"param": key, "default": sql}`: block-level placeholder, the default
    ///   being literal text (optional);
    /// - `{"sql": text, "values": [...]}`: fragment, where each value is a scalar
    ///   or `{"param": key, "default": scalar}` for a value-level placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSegmentType`] for any other element, and
    /// [`Error::PlaceholderMismatch`] when a fragment's text and values disagree
    /// or when literal text (a string segment or a block default) holds a `?`.
    pub fn from_json(json: &serde_json::Value) -> crate::Result<Self> {
        let elements = json
            .as_array()
            .ok_or_else(|| Error::UnknownSegmentType(format!("expected an array of segments, got {json}")))?;
        let segments = elements
            .iter()
            .map(segment_from_json)
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self::new(segments))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Keys of the block-level placeholders.
    pub fn block_keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.blocks.keys()
    }

    /// Keys of the value-level placeholders.
    pub fn value_keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.values.keys()
    }

    /// Stores block-level overrides on the template, replacing earlier ones.
    pub fn set_block_overrides<I, K, F>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, F)>,
        K: Into<ParamKey>,
        F: Into<Fragment>,
    {
        for (key, fragment) in overrides {
            self.blocks.insert(key.into(), Resolution::Bound(fragment.into()));
        }
    }

    /// Stores value-level overrides on the template, replacing earlier ones.
    pub fn set_value_overrides<I, K, V>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ParamKey>,
        V: Into<Value>,
    {
        for (key, value) in overrides {
            self.values.insert(key.into(), Resolution::Bound(value.into()));
        }
    }

    /// Generates a statement using only stored overrides and defaults.
    pub fn generate(&self) -> crate::Result<Statement> {
        self.generate_with(&Bindings::default())
    }

    /// Generates a statement.
    ///
    /// Block-level placeholders are substituted first and all segments are
    /// concatenated in order; then every value-level placeholder in the combined
    /// argument list is resolved left to right. The template itself is never
    /// modified.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] for the first placeholder without a binding,
    ///   stored override or default
    /// - [`Error::PlaceholderMismatch`] when the generated text holds a different
    ///   number of `?` than there are values
    pub fn generate_with(&self, bindings: &Bindings) -> crate::Result<Statement> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let part = match segment {
                Segment::Text(sql) => Fragment::text(sql.as_str()),
                Segment::Fragment(fragment) => fragment.clone(),
                Segment::Block(param) => {
                    let binding = bindings
                        .block_binding(param.key())
                        .or_else(|| stored(&self.blocks, param.key()));
                    param.resolve(ParamLevel::Block, binding)?.clone()
                }
            };
            parts.push(part);
        }

        let statement = Fragment::concat("", parts).resolve_with(|param| {
            let binding = bindings
                .value_binding(param.key())
                .or_else(|| stored(&self.values, param.key()));
            param.resolve(ParamLevel::Value, binding).cloned()
        })?;
        tracing::debug!(sql = %statement.sql(), values = statement.values().len(), "generated statement");
        Ok(statement)
    }
}

fn stored<'a, T>(table: &'a BTreeMap<ParamKey, Resolution<T>>, key: &ParamKey) -> Option<&'a T> {
    table.get(key).and_then(|r| r.as_ref().value())
}

fn param_key(json: &serde_json::Value) -> crate::Result<ParamKey> {
    match json {
        serde_json::Value::String(name) => Ok(ParamKey::Name(name.clone())),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(ParamKey::Index)
            .ok_or_else(|| Error::UnknownSegmentType(format!("parameter key {n}"))),
        other => Err(Error::UnknownSegmentType(format!("parameter key {other}"))),
    }
}

fn segment_from_json(json: &serde_json::Value) -> crate::Result<Segment> {
    match json {
        serde_json::Value::String(sql) => Ok(Segment::Fragment(Fragment::literal(sql.as_str())?)),
        serde_json::Value::Object(obj) if obj.contains_key("param") => {
            let mut param = BlockParam::new(param_key(&obj["param"])?);
            match obj.get("default") {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::String(sql)) => {
                    param = param.with_default(Fragment::literal(sql.as_str())?)
                }
                Some(other) => {
                    return Err(Error::UnknownSegmentType(format!("block default {other}")))
                }
            }
            Ok(Segment::Block(param))
        }
        serde_json::Value::Object(obj) if obj.contains_key("sql") => {
            let sql = obj["sql"]
                .as_str()
                .ok_or_else(|| Error::UnknownSegmentType(format!("fragment text {}", obj["sql"])))?;
            let args = match obj.get("values") {
                None => Vec::new(),
                Some(serde_json::Value::Array(values)) => {
                    values.iter().map(arg_from_json).collect::<crate::Result<_>>()?
                }
                Some(other) => {
                    return Err(Error::UnknownSegmentType(format!("fragment values {other}")))
                }
            };
            Ok(Segment::Fragment(Fragment::new(sql, args)?))
        }
        other => Err(Error::UnknownSegmentType(other.to_string())),
    }
}

fn arg_from_json(json: &serde_json::Value) -> crate::Result<Arg> {
    match json {
        serde_json::Value::Object(obj) if obj.contains_key("param") => {
            let mut param = ValueParam::new(param_key(&obj["param"])?);
            if let Some(default) = obj.get("default") {
                param = param.with_default(serde_json::from_value::<Value>(default.clone())?);
            }
            Ok(Arg::Param(param))
        }
        other => Ok(Arg::Value(serde_json::from_value(other.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldMap;
    use crate::filter::{compile, Node};
    use std::sync::Arc;

    fn where_default() -> Fragment {
        let fields = FieldMap::new().with("a", "t.a");
        compile(&Node::compare("a", "=", 1), &fields)
            .unwrap()
            .where_clause()
    }

    fn skeleton() -> Template {
        Template::new([
            Segment::from("select * from t "),
            Segment::from(BlockParam::new("where").with_default(where_default())),
            Segment::from(" and t.k = "),
            Segment::from(ValueParam::new("k").slot()),
        ])
    }

    #[test]
    fn test_collects_pending_keys() {
        let template = skeleton();
        assert_eq!(template.block_keys().collect::<Vec<_>>(), vec![&ParamKey::from("where")]);
        assert_eq!(template.value_keys().collect::<Vec<_>>(), vec![&ParamKey::from("k")]);
    }

    #[test]
    fn test_generate_missing_value_parameter() {
        let err = skeleton().generate().unwrap_err();
        match err {
            Error::MissingParameter { level, key } => {
                assert_eq!(level, ParamLevel::Value);
                assert_eq!(key, ParamKey::from("k"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generate_uses_block_default() {
        let stmt = skeleton()
            .generate_with(&Bindings::new().value("k", 7))
            .unwrap();
        assert_eq!(stmt.sql(), "select * from t where (t.a) = ? and t.k = ?");
        assert_eq!(stmt.values(), &[Value::Int(1), Value::Int(7)]);
    }

    #[test]
    fn test_generate_block_override() {
        let other = Fragment::new("where t.b = ?", vec![Arg::value("x")]).unwrap();
        let stmt = skeleton()
            .generate_with(&Bindings::new().value("k", 7).block("where", other))
            .unwrap();
        assert_eq!(stmt.sql(), "select * from t where t.b = ? and t.k = ?");
        assert_eq!(stmt.values(), &[Value::from("x"), Value::Int(7)]);
    }

    #[test]
    fn test_missing_block_parameter() {
        let template = Template::new([Segment::from("select 1 "), Segment::from(BlockParam::new(0usize))]);
        assert!(matches!(
            template.generate(),
            Err(Error::MissingParameter { level: ParamLevel::Block, .. })
        ));
    }

    #[test]
    fn test_stored_overrides_and_call_bindings() {
        let mut template = skeleton();
        template.set_value_overrides([("k", 1)]);
        template.set_value_overrides([("k", 2)]);
        assert_eq!(template.generate().unwrap().values()[1], Value::Int(2));

        let stmt = template.generate_with(&Bindings::new().value("k", 3)).unwrap();
        assert_eq!(stmt.values()[1], Value::Int(3));

        template.set_block_overrides([("where", Fragment::empty())]);
        assert_eq!(template.generate().unwrap().sql(), "select * from t  and t.k = ?");
    }

    #[test]
    fn test_value_placeholder_inside_bound_block() {
        let template = Template::new([Segment::from("select 1 "), Segment::from(BlockParam::new("w"))]);
        let block = Fragment::named("where id = :id").unwrap();
        let bindings = Bindings::new().block("w", block).value("id", 9);
        let stmt = template.generate_with(&bindings).unwrap();
        assert_eq!(stmt.sql(), "select 1 where id = ?");
        assert_eq!(stmt.values(), &[Value::Int(9)]);
    }

    #[test]
    fn test_generate_leaves_template_untouched() {
        let template = skeleton();
        let before = template.clone();
        template.generate_with(&Bindings::new().value("k", 7)).unwrap();
        assert_eq!(template, before);
    }

    #[test]
    fn test_shared_template_across_threads() {
        let template = Arc::new(skeleton());
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8i64)
                .map(|i| {
                    let template = Arc::clone(&template);
                    scope.spawn(move || template.generate_with(&Bindings::new().value("k", i)).unwrap())
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                let stmt = handle.join().unwrap();
                assert_eq!(stmt.values()[1], Value::Int(i as i64));
            }
        });
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!([
            "select * from t ",
            {"param": "where", "default": "where t.a = 1"},
            {"sql": " and t.k = ? and t.j = ?", "values": [{"param": "k"}, 5]},
        ]);
        let template = Template::from_json(&json).unwrap();
        let stmt = template.generate_with(&Bindings::new().value("k", "v")).unwrap();
        assert_eq!(stmt.sql(), "select * from t where t.a = 1 and t.k = ? and t.j = ?");
        assert_eq!(stmt.values(), &[Value::from("v"), Value::Int(5)]);
    }

    #[test]
    fn test_generate_rejects_question_mark_in_text() {
        let template = Template::new([
            Segment::from("select * from t where a = "),
            Segment::from(Fragment::placeholder(Arg::value(1))),
            Segment::from(" and b = ?"),
        ]);
        assert!(matches!(
            template.generate(),
            Err(Error::PlaceholderMismatch { placeholders: 2, values: 1 })
        ));
    }

    #[test]
    fn test_generate_rejects_unbalanced_block_binding() {
        let template = Template::new([Segment::from("select 1 "), Segment::from(BlockParam::new("w"))]);
        let bindings = Bindings::new().block("w", Fragment::text("where a = ?"));
        assert!(matches!(
            template.generate_with(&bindings),
            Err(Error::PlaceholderMismatch { placeholders: 1, values: 0 })
        ));
    }

    #[test]
    fn test_from_json_rejects_question_mark_in_literals() {
        let json = serde_json::json!([
            "select * from t where a = ",
            {"sql": "?", "values": [1]},
            " and b = ?",
        ]);
        assert!(matches!(
            Template::from_json(&json),
            Err(Error::PlaceholderMismatch { placeholders: 1, values: 0 })
        ));

        let json = serde_json::json!(["select 1 ", {"param": "w", "default": "where a = ?"}]);
        assert!(matches!(
            Template::from_json(&json),
            Err(Error::PlaceholderMismatch { placeholders: 1, values: 0 })
        ));
    }

    #[test]
    fn test_from_json_unknown_segment() {
        let json = serde_json::json!(["select 1", 42]);
        assert!(matches!(Template::from_json(&json), Err(Error::UnknownSegmentType(_))));
        let json = serde_json::json!([{"table": "t"}]);
        assert!(matches!(Template::from_json(&json), Err(Error::UnknownSegmentType(_))));
    }
}
