//! Field allow-lists.

use std::collections::HashMap;

/// Maps public field names to validated SQL column expressions.
///
/// Any name missing from the map is rejected by the where and order compilers;
/// this map is the only thing standing between caller input and identifiers in
/// the generated SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(HashMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one entry.
    pub fn with(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.0.insert(field.into(), column.into());
        self
    }

    /// Allow-list where each field maps to `prefix` + field.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::FieldMap;
    ///
    /// let fields = FieldMap::prefixed("u.", ["id", "name"]);
    /// assert_eq!(fields.column("name"), Some("u.name"));
    /// assert_eq!(fields.column("email"), None);
    /// ```
    pub fn prefixed<I, S>(prefix: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields
            .into_iter()
            .map(|field| {
                let field: String = field.into();
                let column = format!("{prefix}{field}");
                (field, column)
            })
            .collect()
    }

    /// The column expression for `field`, if allowed.
    pub fn column(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Like [`column`](Self::column), failing with `InvalidField`.
    pub fn require(&self, field: &str) -> crate::Result<&str> {
        self.column(field)
            .ok_or_else(|| crate::Error::InvalidField(field.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
