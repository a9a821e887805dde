use sqlx::mysql::{MySqlArguments, MySqlQueryResult};
use sqlx::query::Query;
use sqlx::{Executor, MySql};

use crate::fragment::Statement;
use crate::value::Value;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// Binds one value as the next positional argument.
// Mirrors `query_as::bind_value`; change both together.
fn bind_value<'q>(q: Q<'q>, value: &'q Value) -> Q<'q> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Int(i) => q.bind(*i),
        Value::Float(f) => q.bind(*f),
        Value::Text(s) => q.bind(s.as_str()),
        Value::Bytes(b) => q.bind(b.as_slice()),
    }
}

impl Statement {
    /// Builds a fresh SQLx query with every value bound in order.
    ///
    /// The query borrows the statement, so a statement can be executed any
    /// number of times, against any executor.
    pub fn query(&self) -> Q<'_> {
        self.values()
            .iter()
            .fold(sqlx::query::<MySql>(self.sql()), bind_value)
    }

    /// Executes the statement using the provided executor.
    ///
    /// Works with any SQLx `Executor`: `MySqlPool`, `&mut MySqlConnection`,
    /// `&mut *tx` for a `Transaction`, and others.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::MySqlPool;
    /// use sqlx_fragments::filter::{compile, Node};
    /// use sqlx_fragments::{FieldMap, Template};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let fields = FieldMap::new().with("id", "id");
    /// let filter = compile(&Node::compare("id", "=", 42), &fields)?.where_clause();
    ///
    /// let stmt = Template::delete("users", filter, false).generate()?;
    /// let result = stmt.execute(&pool).await?;
    /// println!("Deleted {} rows", result.rows_affected());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<'e, E>(&self, executor: E) -> crate::Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        tracing::debug!(sql = %self.sql(), values = self.values().len(), "executing statement");
        Ok(self.query().execute(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::param::Bindings;
    use sqlx::Execute;

    #[test]
    fn test_query_keeps_sql() {
        let stmt = Fragment::named("SELECT * FROM users WHERE id = :id AND name = :name")
            .unwrap()
            .resolve(&Bindings::new().value("id", 1).value("name", Value::Null))
            .unwrap();
        let query = stmt.query();
        assert_eq!(query.sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
    }
}
