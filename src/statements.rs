//! Canonical statement skeletons.
//!
//! Table, field values, join, where and order parts are segments: pass
//! [`BlockParam`]s, fragments, or literal SQL text. Plain scalars have no
//! conversion into [`Segment`], so a value can only reach the statement through
//! a bound placeholder.
//!
//! Where and order parts are emitted as given: pass
//! [`Fragment::where_clause`](crate::Fragment::where_clause) output (or a
//! placeholder defaulting to it) and an [`OrderBy`](crate::OrderBy).
//!
//! Paging follows the `offset N rows fetch next M rows only` form and is only
//! meaningful with a deterministic order; supplying one is up to the caller.

use crate::param::{BlockParam, ValueParam};
use crate::template::{Segment, Template};

/// Row offset or count of a paged select.
#[derive(Debug, Clone, PartialEq)]
pub enum RowCount {
    /// Fixed number rendered into the text.
    Rows(u64),
    /// Block-level placeholder substituted with a fragment.
    Block(BlockParam),
    /// Value-level placeholder bound as a positional value.
    Value(ValueParam),
}

impl From<u64> for RowCount {
    fn from(n: u64) -> Self {
        RowCount::Rows(n)
    }
}

impl From<BlockParam> for RowCount {
    fn from(param: BlockParam) -> Self {
        RowCount::Block(param)
    }
}

impl From<ValueParam> for RowCount {
    fn from(param: ValueParam) -> Self {
        RowCount::Value(param)
    }
}

impl From<RowCount> for Segment {
    fn from(count: RowCount) -> Self {
        match count {
            RowCount::Rows(n) => Segment::Text(n.to_string()),
            RowCount::Block(param) => Segment::Block(param),
            RowCount::Value(param) => Segment::Fragment(param.slot()),
        }
    }
}

/// Interleaves `items` with `separator`.
fn interleave<I>(items: I, separator: &str) -> Vec<Segment>
where
    I: IntoIterator<Item = Segment>,
{
    let mut out = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(Segment::from(separator));
        }
        out.push(item);
    }
    out
}

impl Template {
    /// `insert into table(f1, f2) [output ...] values (v1, v2)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::param::slots;
    /// use sqlx_fragments::{Bindings, Template};
    ///
    /// let insert = Template::insert("users", slots(["name", "email"]), Some("inserted.id"));
    /// let stmt = insert.generate_with(&Bindings::new().value("name", "Ann").value("email", "ann@example.com"))?;
    /// assert_eq!(stmt.sql(), "insert into users(name, email)\noutput inserted.id\nvalues (?, ?)");
    /// assert_eq!(stmt.values().len(), 2);
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn insert<T, I, K, V>(table: T, fields: I, output: Option<&str>) -> Template
    where
        T: Into<Segment>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Segment>,
    {
        let (names, values): (Vec<String>, Vec<Segment>) = fields
            .into_iter()
            .map(|(k, v)| -> (String, Segment) { (k.into(), v.into()) })
            .unzip();

        let mut segments = vec![
            Segment::from("insert into "),
            table.into(),
            Segment::from(format!("({})\n", names.join(", "))),
            Segment::from(output.map(|o| format!("output {o}")).unwrap_or_default()),
            Segment::from("\n"),
            Segment::from("values ("),
        ];
        segments.extend(interleave(values, ", "));
        segments.push(Segment::from(")"));
        Template::new(segments)
    }

    /// `update table set f1 = v1, f2 = v2 <where>`.
    pub fn update<T, I, K, V, W>(table: T, fields: I, filter: W) -> Template
    where
        T: Into<Segment>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Segment>,
        W: Into<Segment>,
    {
        let mut segments = vec![Segment::from("update "), table.into(), Segment::from("\n"), Segment::from("set ")];
        for (i, (key, value)) in fields.into_iter().enumerate() {
            let key: String = key.into();
            let assign = if i == 0 {
                format!("{key} = ")
            } else {
                format!(", {key} = ")
            };
            segments.push(Segment::from(assign));
            segments.push(value.into());
        }
        segments.push(Segment::from("\n"));
        segments.push(filter.into());
        Template::new(segments)
    }

    /// `delete [top (1)] from table <where>`.
    ///
    /// With `single`, at most one row is deleted.
    pub fn delete<T, W>(table: T, filter: W, single: bool) -> Template
    where
        T: Into<Segment>,
        W: Into<Segment>,
    {
        let head = if single { "delete top (1) from " } else { "delete from " };
        Template::new([Segment::from(head), table.into(), Segment::from("\n"), filter.into()])
    }
}

/// Builder for `select` skeletons.
///
/// # Examples
///
/// ```
/// use sqlx_fragments::filter::{compile, Node};
/// use sqlx_fragments::{FieldMap, OrderBy, Select};
///
/// let fields = FieldMap::prefixed("u.", ["id", "name"]);
/// let filter = compile(&Node::compare("name", "like", "A%"), &fields)?;
///
/// let stmt = Select::new("users u")
///     .column("u.id")
///     .column_as("u.name", "label")
///     .filter(filter.where_clause())
///     .order_by(OrderBy::parse(["id"], &fields)?)
///     .count(10u64)
///     .build()
///     .generate()?;
///
/// assert_eq!(
///     stmt.sql(),
///     "select u.id, u.name as label\nfrom users u\n\nwhere (u.name) like ?\norder by u.id\noffset 0 rows\nfetch next 10 rows only"
/// );
/// # Ok::<(), sqlx_fragments::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    table: Segment,
    columns: Vec<String>,
    distinct: bool,
    join: Segment,
    filter: Segment,
    order: Segment,
    offset: Option<RowCount>,
    count: Option<RowCount>,
}

impl Select {
    pub fn new(table: impl Into<Segment>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            distinct: false,
            join: Segment::from(""),
            filter: Segment::from(""),
            order: Segment::from(""),
            offset: None,
            count: None,
        }
    }

    pub fn column(mut self, expr: impl Into<String>) -> Self {
        self.columns.push(expr.into());
        self
    }

    /// Selects `expr as alias`.
    pub fn column_as(mut self, expr: impl Into<String>, alias: &str) -> Self {
        let expr: String = expr.into();
        self.columns.push(format!("{expr} as {alias}"));
        self
    }

    pub fn columns<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(exprs.into_iter().map(Into::<String>::into));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(mut self, join: impl Into<Segment>) -> Self {
        self.join = join.into();
        self
    }

    pub fn filter(mut self, filter: impl Into<Segment>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn order_by(mut self, order: impl Into<Segment>) -> Self {
        self.order = order.into();
        self
    }

    pub fn offset(mut self, offset: impl Into<RowCount>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Limits the rows returned; without an explicit offset, the offset is `0`.
    pub fn count(mut self, count: impl Into<RowCount>) -> Self {
        self.count = Some(count.into());
        self
    }

    pub fn build(self) -> Template {
        let offset = match (self.offset, &self.count) {
            (Some(offset), _) => Some(offset),
            (None, Some(_)) => Some(RowCount::Rows(0)),
            (None, None) => None,
        };

        let mut segments = vec![
            Segment::from("select "),
            Segment::from(if self.distinct { "distinct " } else { "" }),
            Segment::from(self.columns.join(", ")),
            Segment::from("\n"),
            Segment::from("from "),
            self.table,
            Segment::from("\n"),
            self.join,
            Segment::from("\n"),
            self.filter,
            Segment::from("\n"),
            self.order,
            Segment::from("\n"),
        ];
        if let Some(offset) = offset {
            segments.extend([Segment::from("offset "), offset.into(), Segment::from(" rows")]);
            if let Some(count) = self.count {
                segments.extend([
                    Segment::from("\n"),
                    Segment::from("fetch next "),
                    count.into(),
                    Segment::from(" rows only"),
                ]);
            }
        }
        Template::new(segments)
    }
}
