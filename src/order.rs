//! ORDER BY lists validated against a field allow-list.

use std::fmt;
use std::str::FromStr;

use crate::fields::FieldMap;
use crate::fragment::Fragment;
use crate::Error;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(Error::InvalidModifier(other.to_owned())),
        }
    }
}

/// Ordered list of rendered `column [direction]` items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<String>,
}

impl OrderBy {
    /// Parses caller items of the form `"field"` or `"field direction"`.
    ///
    /// The text is split at the first space only, so `"a  desc"` carries the
    /// modifier `" desc"` and is rejected.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidModifier`] for a direction other than `asc` / `desc`
    /// - [`Error::InvalidField`] for a field missing from `fields`
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::{FieldMap, OrderBy};
    ///
    /// let fields = FieldMap::new().with("a", "t.a").with("b", "t.b");
    /// let order = OrderBy::parse(["a desc", "b"], &fields)?;
    /// assert_eq!(order.fields(), ["t.a desc", "t.b"]);
    /// assert_eq!(order.to_fragment().sql(), "order by t.a desc, t.b");
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn parse<I, S>(items: I, fields: &FieldMap) -> crate::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = items
            .into_iter()
            .map(|item| -> crate::Result<String> {
                let item = item.as_ref();
                let (field, direction) = match item.split_once(' ') {
                    Some((field, modifier)) => (field, Some(modifier.parse::<Direction>()?)),
                    None => (item, None),
                };
                let column = fields.require(field)?;
                Ok(match direction {
                    Some(direction) => format!("{column} {direction}"),
                    None => column.to_owned(),
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// Concatenates the items of every input, left to right.
    pub fn merge<I>(orders: I) -> Self
    where
        I: IntoIterator<Item = OrderBy>,
    {
        Self {
            fields: orders.into_iter().flat_map(|o| o.fields).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders `order by ...`, or an empty fragment for an empty list.
    pub fn to_fragment(&self) -> Fragment {
        if self.fields.is_empty() {
            return Fragment::empty();
        }
        Fragment::text(format!("order by {}", self.fields.join(", ")))
    }
}

impl From<OrderBy> for Fragment {
    fn from(order: OrderBy) -> Self {
        order.to_fragment()
    }
}
