//! Boolean-expression compiler for WHERE clauses.
//!
//! Caller input arrives as a [`Node`] tree of comparisons and `and`/`or` groups,
//! usually deserialized from JSON:
//!
//! ```json
//! { "op": "and", "blocks": [
//!     { "op": "=", "field": "status", "value": "active" },
//!     { "op": "or", "blocks": [
//!         { "op": ">=", "field": "age", "value": 18 },
//!         { "op": "is", "field": "guardian", "value": true }
//!     ] }
//! ] }
//! ```
//!
//! [`compile`] checks every field against a [`FieldMap`] and renders a fragment
//! where each operand is parenthesized, so mixing `and` and `or` never depends on
//! SQL precedence.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::fields::FieldMap;
use crate::fragment::{Arg, Fragment};
use crate::value::Value;
use crate::Error;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ne,
    Gte,
    Lte,
    Like,
    /// `is null` / `is not null`, chosen by the truthiness of the value.
    Is,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ne => "<>",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::Like => "like",
            CompareOp::Is => "is",
        }
    }

    /// Renders `(column) op ?` with one bound value, or the null test for `is`.
    pub fn render(self, column: &str, value: Value) -> Fragment {
        match self {
            CompareOp::Is if value.is_truthy() => Fragment::text(format!("({column}) is not null")),
            CompareOp::Is => Fragment::text(format!("({column}) is null")),
            op => Fragment::single(format!("({column}) {} ?", op.as_str()), Arg::Value(value)),
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(CompareOp::Eq),
            ">" => Ok(CompareOp::Gt),
            "<" => Ok(CompareOp::Lt),
            "<>" => Ok(CompareOp::Ne),
            ">=" => Ok(CompareOp::Gte),
            "<=" => Ok(CompareOp::Lte),
            "like" => Ok(CompareOp::Like),
            "is" => Ok(CompareOp::Is),
            other => Err(Error::InvalidOperation(format!("binary condition '{other}'"))),
        }
    }
}

/// Logic operator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }

    /// Joins operands with this operator.
    ///
    /// Operands with empty text are dropped rather than treated as `true`/`false`;
    /// the rest are each wrapped in parentheses. No operands (or only empty ones)
    /// yields an empty fragment.
    pub fn combine<I>(self, operands: I) -> Fragment
    where
        I: IntoIterator<Item = Fragment>,
    {
        let joiner = format!(" {} ", self.as_str());
        Fragment::concat(
            &joiner,
            operands
                .into_iter()
                .filter(|f| !f.is_empty())
                .map(Fragment::parenthesized),
        )
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(LogicOp::And),
            "or" => Ok(LogicOp::Or),
            other => Err(Error::InvalidOperation(format!("logic operation '{other}'"))),
        }
    }
}

/// Builds one comparison over an already validated column expression.
///
/// No allow-list check happens here; pass only trusted expressions as `column`.
///
/// # Examples
///
/// ```
/// use sqlx_fragments::filter::compare;
///
/// let f = compare("t.a", "=", 5)?;
/// assert_eq!(f.sql(), "(t.a) = ?");
///
/// let f = compare("t.deleted_at", "is", false)?;
/// assert_eq!(f.sql(), "(t.deleted_at) is null");
/// assert!(f.args().is_empty());
/// # Ok::<(), sqlx_fragments::Error>(())
/// ```
pub fn compare(column: &str, op: &str, value: impl Into<Value>) -> crate::Result<Fragment> {
    Ok(op.parse::<CompareOp>()?.render(column, value.into()))
}

/// Joins fragments with `and` / `or`; see [`LogicOp::combine`].
pub fn combine<I>(op: &str, operands: I) -> crate::Result<Fragment>
where
    I: IntoIterator<Item = Fragment>,
{
    Ok(op.parse::<LogicOp>()?.combine(operands))
}

/// Boolean-expression AST node.
///
/// Operators are kept as given and validated by [`compile`], so unknown ones
/// surface as [`Error::InvalidOperation`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum Node {
    /// Always-vacuous condition.
    Empty,
    Compare {
        field: String,
        op: String,
        value: Value,
    },
    Group {
        op: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn compare(field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        Node::Compare {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    pub fn group(op: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Group {
            op: op.into(),
            children,
        }
    }

    pub fn and(children: Vec<Node>) -> Self {
        Self::group("and", children)
    }

    pub fn or(children: Vec<Node>) -> Self {
        Self::group("or", children)
    }

    /// Reads a node from its JSON shape.
    ///
    /// `null`, `{}` and `{"op": ""}` are [`Node::Empty`]. Comparisons carry
    /// `field` and `value` (or `val`); a missing value reads as `null`. Groups
    /// carry their children under `blocks`.
    pub fn from_json(json: &serde_json::Value) -> crate::Result<Node> {
        let obj = match json {
            serde_json::Value::Null => return Ok(Node::Empty),
            serde_json::Value::Object(obj) => obj,
            other => return Err(Error::InvalidStructure(format!("expected an object node, got {other}"))),
        };
        let op = match obj.get("op") {
            None | Some(serde_json::Value::Null) => "",
            Some(serde_json::Value::String(op)) => op.as_str(),
            Some(other) => return Err(Error::InvalidOperation(format!("query operation {other}"))),
        };
        if op.is_empty() {
            return Ok(Node::Empty);
        }

        if op.parse::<CompareOp>().is_ok() {
            let field = obj
                .get("field")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| Error::InvalidStructure(format!("'{op}' condition without a field")))?;
            let value = match obj.get("value").or_else(|| obj.get("val")) {
                Some(v) => serde_json::from_value(v.clone())?,
                None => Value::Null,
            };
            return Ok(Node::compare(field, op, value));
        }

        if op.parse::<LogicOp>().is_ok() {
            let blocks = obj
                .get("blocks")
                .and_then(serde_json::Value::as_array)
                .ok_or_else(|| Error::InvalidStructure(format!("'{op}' group without blocks")))?;
            let children = blocks.iter().map(Node::from_json).collect::<crate::Result<_>>()?;
            return Ok(Node::group(op, children));
        }

        Err(Error::InvalidOperation(format!("query operation '{op}'")))
    }
}

impl TryFrom<serde_json::Value> for Node {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Node::from_json(&json)
    }
}

enum Task<'a> {
    Eval(&'a Node),
    Reduce,
}

/// Result-stack entry; the marker opens a group and is never a fragment.
enum Slot {
    Fragment(Fragment),
    Marker,
}

/// Compiles a boolean-expression tree into a condition fragment.
///
/// The tree is walked with explicit stacks, never recursion: an evaluation stack
/// of pending work, an operator stack of open groups and a result stack of
/// fragments separated by group markers. A group pushes its operator, a marker,
/// a reduce step and then its children; once the children are evaluated the
/// reduce step folds everything above the marker into one fragment. Children
/// keep their left-to-right order, both in the text and in the bound values.
///
/// # Errors
///
/// - [`Error::InvalidField`] for a field missing from `fields`
/// - [`Error::InvalidOperation`] for an unknown comparison or logic operator
/// - [`Error::InvalidStructure`] when the stacks do not reduce to one fragment;
///   every group is folded by its own reduce step, so no well-typed [`Node`]
///   reaches this and it only guards the stack bookkeeping
///
/// # Examples
///
/// ```
/// use sqlx_fragments::filter::{compile, Node};
/// use sqlx_fragments::{Arg, FieldMap};
///
/// let fields = FieldMap::new().with("a", "t.a").with("b", "t.b");
/// let node = Node::and(vec![Node::compare("a", "=", 1), Node::compare("b", "=", 2)]);
///
/// let f = compile(&node, &fields)?;
/// assert_eq!(f.sql(), "((t.a) = ?) and ((t.b) = ?)");
/// assert_eq!(f.args(), &[Arg::value(1), Arg::value(2)]);
/// # Ok::<(), sqlx_fragments::Error>(())
/// ```
pub fn compile(root: &Node, fields: &FieldMap) -> crate::Result<Fragment> {
    let mut eval = vec![Task::Eval(root)];
    let mut ops: Vec<LogicOp> = Vec::new();
    let mut results: Vec<Slot> = Vec::new();

    while let Some(task) = eval.pop() {
        match task {
            Task::Eval(Node::Empty) => results.push(Slot::Fragment(Fragment::empty())),
            Task::Eval(Node::Compare { field, op, value }) => {
                let column = fields.require(field)?;
                results.push(Slot::Fragment(compare(column, op, value.clone())?));
            }
            Task::Eval(Node::Group { op, children }) => {
                ops.push(op.parse::<LogicOp>()?);
                results.push(Slot::Marker);
                eval.push(Task::Reduce);
                eval.extend(children.iter().rev().map(Task::Eval));
            }
            Task::Reduce => {
                let op = ops
                    .pop()
                    .ok_or_else(|| Error::InvalidStructure("reduce without an open group".into()))?;
                let mut operands = Vec::new();
                loop {
                    match results.pop() {
                        Some(Slot::Fragment(f)) => operands.push(f),
                        Some(Slot::Marker) => break,
                        None => return Err(Error::InvalidStructure("missing group marker".into())),
                    }
                }
                operands.reverse();
                results.push(Slot::Fragment(op.combine(operands)));
            }
        }
    }

    if !ops.is_empty() || results.len() != 1 {
        return Err(Error::InvalidStructure(format!(
            "expression reduced to {} results",
            results.len()
        )));
    }
    match results.pop() {
        Some(Slot::Fragment(fragment)) => {
            tracing::debug!(sql = %fragment.sql(), values = fragment.args().len(), "compiled where expression");
            Ok(fragment)
        }
        _ => Err(Error::InvalidStructure("expression reduced to a bare marker".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::placeholder_count;

    fn fields() -> FieldMap {
        FieldMap::new().with("a", "t.a").with("b", "t.b").with("c", "t.c")
    }

    fn values(f: &Fragment) -> Vec<Value> {
        f.args()
            .iter()
            .map(|arg| match arg {
                Arg::Value(v) => v.clone(),
                Arg::Param(p) => panic!("unexpected placeholder {}", p.key()),
            })
            .collect()
    }

    #[test]
    fn test_compare_binds_one_value() {
        let f = compare("t.a", "=", 5).unwrap();
        assert_eq!(f.sql(), "(t.a) = ?");
        assert_eq!(values(&f), vec![Value::Int(5)]);
    }

    #[test]
    fn test_compare_is_renders_null_test() {
        assert_eq!(compare("t.a", "is", true).unwrap().sql(), "(t.a) is not null");
        assert_eq!(compare("t.a", "is", Value::Null).unwrap().sql(), "(t.a) is null");
    }

    #[test]
    fn test_compare_unknown_operator() {
        assert!(matches!(compare("t.a", "!=", 1), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_combine_drops_empty_operands() {
        let f = combine("or", [Fragment::empty(), compare("t.a", "=", 1).unwrap()]).unwrap();
        assert_eq!(f.sql(), "((t.a) = ?)");
        assert!(combine("and", [Fragment::empty()]).unwrap().is_empty());
        assert!(matches!(combine("xor", Vec::<Fragment>::new()), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_compile_single_comparison() {
        let f = compile(&Node::compare("a", "=", 5), &fields()).unwrap();
        assert_eq!(f.sql(), "(t.a) = ?");
        assert_eq!(values(&f), vec![Value::Int(5)]);
    }

    #[test]
    fn test_compile_group_keeps_child_order() {
        let node = Node::and(vec![Node::compare("a", "=", 1), Node::compare("b", "=", 2)]);
        let f = compile(&node, &fields()).unwrap();
        assert_eq!(f.sql(), "((t.a) = ?) and ((t.b) = ?)");
        assert_eq!(values(&f), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_compile_absorbs_empty_operand() {
        let node = Node::or(vec![Node::Empty, Node::compare("a", "=", 1)]);
        let f = compile(&node, &fields()).unwrap();
        assert_eq!(f.sql(), "((t.a) = ?)");
        assert_eq!(values(&f), vec![Value::Int(1)]);
    }

    #[test]
    fn test_compile_nested_group_after_leaf() {
        let node = Node::and(vec![
            Node::compare("a", "=", 1),
            Node::or(vec![Node::compare("b", "<", 2), Node::compare("c", ">", 3)]),
        ]);
        let f = compile(&node, &fields()).unwrap();
        assert_eq!(f.sql(), "((t.a) = ?) and (((t.b) < ?) or ((t.c) > ?))");
        assert_eq!(values(&f), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(placeholder_count(f.sql()), f.args().len());
    }

    #[test]
    fn test_compile_nested_group_first() {
        let node = Node::or(vec![
            Node::and(vec![Node::compare("a", "=", 1), Node::compare("b", "=", 2)]),
            Node::compare("c", "like", "x%"),
        ]);
        let f = compile(&node, &fields()).unwrap();
        assert_eq!(f.sql(), "(((t.a) = ?) and ((t.b) = ?)) or ((t.c) like ?)");
        assert_eq!(values(&f), vec![Value::Int(1), Value::Int(2), Value::from("x%")]);
    }

    #[test]
    fn test_compile_empty_root_and_empty_group() {
        assert!(compile(&Node::Empty, &fields()).unwrap().is_empty());
        assert!(compile(&Node::and(vec![]), &fields()).unwrap().is_empty());
        let node = Node::and(vec![Node::or(vec![Node::Empty]), Node::Empty]);
        assert!(compile(&node, &fields()).unwrap().is_empty());
    }

    #[test]
    fn test_compile_unknown_field() {
        let err = compile(&Node::compare("x", "=", 1), &fields()).unwrap_err();
        assert!(matches!(err, Error::InvalidField(f) if f == "x"));
    }

    #[test]
    fn test_compile_unknown_group_operator() {
        let node = Node::group("xor", vec![Node::compare("a", "=", 1)]);
        assert!(matches!(compile(&node, &fields()), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_node_from_json() {
        let node: Node = serde_json::from_str(
            r#"{"op": "and", "blocks": [
                {"op": "=", "field": "a", "val": 1},
                {"op": "is", "field": "b", "value": false},
                {}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            node,
            Node::and(vec![
                Node::compare("a", "=", 1),
                Node::compare("b", "is", false),
                Node::Empty,
            ])
        );
        let f = compile(&node, &fields()).unwrap();
        assert_eq!(f.sql(), "((t.a) = ?) and ((t.b) is null)");
    }

    #[test]
    fn test_node_from_json_rejects_array_value() {
        let json = serde_json::json!({"op": "=", "field": "a", "value": [1, 2]});
        assert!(matches!(Node::from_json(&json), Err(Error::Json(_))));
    }

    #[test]
    fn test_node_from_json_unknown_operation() {
        let json = serde_json::json!({"op": "between", "field": "a"});
        assert!(matches!(Node::from_json(&json), Err(Error::InvalidOperation(_))));
        let json = serde_json::json!({"op": "or"});
        assert!(matches!(Node::from_json(&json), Err(Error::InvalidStructure(_))));
    }
}
