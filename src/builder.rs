use regex::Regex;

use crate::fragment::{Arg, Fragment};
use crate::param::ValueParam;

const NAMED_PLACEHOLDER: &str = r":[a-zA-Z0-9_]+";

/// Converts named placeholders (`:name`) to positional placeholders (`?`).
///
/// # Examples
///
/// ```
/// use sqlx_fragments::builder::build_query;
///
/// let sql = build_query("SELECT * FROM users WHERE id = :id AND name = :name")?;
/// assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
/// # Ok::<(), sqlx_fragments::Error>(())
/// ```
pub fn build_query(template: &str) -> crate::Result<String> {
    let regex = Regex::new(NAMED_PLACEHOLDER)?;
    let replaced = regex.replace_all(template, "?").into_owned();
    Ok(replaced)
}

impl Fragment {
    /// Parses SQL written with named placeholders into a fragment.
    ///
    /// Every `:name` becomes a positional `?` whose argument is a value-level
    /// placeholder keyed by `name` (without the colon). A name used twice yields
    /// two arguments with the same key, so one binding fills both.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_fragments::{Bindings, Fragment, Value};
    ///
    /// let f = Fragment::named("id = :id OR parent_id = :id")?;
    /// assert_eq!(f.sql(), "id = ? OR parent_id = ?");
    ///
    /// let stmt = f.resolve(&Bindings::new().value("id", 7))?;
    /// assert_eq!(stmt.values(), &[Value::Int(7), Value::Int(7)]);
    /// # Ok::<(), sqlx_fragments::Error>(())
    /// ```
    pub fn named(template: &str) -> crate::Result<Fragment> {
        let args = Regex::new(NAMED_PLACEHOLDER)?
            .find_iter(template)
            .map(|m| Arg::Param(ValueParam::new(&m.as_str()[1..])))
            .collect();
        let sql = build_query(template)?;
        Fragment::new(sql, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ParamKey;

    #[test]
    fn test_build_query_single_param() {
        let result = build_query("SELECT * FROM users WHERE id = :id").unwrap();
        assert_eq!(result, "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn test_build_query_repeated_params() {
        let result = build_query("SELECT * FROM users WHERE id = :id OR user_id = :id").unwrap();
        assert_eq!(result, "SELECT * FROM users WHERE id = ? OR user_id = ?");
    }

    #[test]
    fn test_build_query_no_params() {
        let result = build_query("SELECT * FROM users").unwrap();
        assert_eq!(result, "SELECT * FROM users");
    }

    #[test]
    fn test_named_placeholder_order() {
        let f = Fragment::named("user_id = :user_id AND name = :name").unwrap();
        let keys: Vec<&ParamKey> = f.params().map(|p| p.key()).collect();
        assert_eq!(keys, vec![&ParamKey::from("user_id"), &ParamKey::from("name")]);
        assert_eq!(f.sql(), "user_id = ? AND name = ?");
    }

    #[test]
    fn test_named_rejects_literal_question_mark() {
        // A literal `?` would shift every positional argument after it.
        assert!(Fragment::named("note = '?' AND id = :id").is_err());
    }
}
