use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::QueryAs,
    Executor, MySql,
};

use crate::fragment::Statement;
use crate::value::Value;

/// Type alias for SQLx QueryAs with MySQL arguments
pub type QA<'q, R> = QueryAs<'q, MySql, R, MySqlArguments>;

// Mirrors `query::bind_value`; change both together.
fn bind_value<'q, R>(q: QA<'q, R>, value: &'q Value) -> QA<'q, R> {
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
    /// Builds a fresh typed SQLx query with every value bound in order.
    pub fn query_as<R>(&self) -> QA<'_, R>
    where
        for<'row> R: sqlx::FromRow<'row, MySqlRow>,
    {
        self.values()
            .iter()
            .fold(sqlx::query_as::<MySql, R>(self.sql()), bind_value)
    }

    /// Fetches all rows.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::{FromRow, MySqlPool};
    /// use sqlx_fragments::filter::{compile, Node};
    /// use sqlx_fragments::{FieldMap, OrderBy, Select};
    ///
    /// #[derive(FromRow)]
    /// struct User {
    ///     id: i32,
    ///     name: String,
    /// }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let fields = FieldMap::new().with("age", "age").with("id", "id");
    /// let filter = compile(&Node::compare("age", ">=", 18), &fields)?.where_clause();
    ///
    /// let stmt = Select::new("users")
    ///     .columns(["id", "name"])
    ///     .filter(filter)
    ///     .order_by(OrderBy::parse(["id"], &fields)?)
    ///     .build()
    ///     .generate()?;
    ///
    /// let users: Vec<User> = stmt.fetch_all(&pool).await?;
    /// for user in users {
    ///     println!("{}: {}", user.id, user.name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_all<'e, R, E>(&self, executor: E) -> crate::Result<Vec<R>>
    where
        for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
        E: Executor<'e, Database = MySql>,
    {
        tracing::debug!(sql = %self.sql(), values = self.values().len(), "fetching rows");
        Ok(self.query_as().fetch_all(executor).await?)
    }

    /// Fetches exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `Error::Database(sqlx::Error::RowNotFound)` when there is no row.
    pub async fn fetch_one<'e, R, E>(&self, executor: E) -> crate::Result<R>
    where
        for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
        E: Executor<'e, Database = MySql>,
    {
        tracing::debug!(sql = %self.sql(), values = self.values().len(), "fetching one row");
        Ok(self.query_as().fetch_one(executor).await?)
    }

    /// Fetches at most one row.
    pub async fn fetch_optional<'e, R, E>(&self, executor: E) -> crate::Result<Option<R>>
    where
        for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
        E: Executor<'e, Database = MySql>,
    {
        tracing::debug!(sql = %self.sql(), values = self.values().len(), "fetching optional row");
        Ok(self.query_as().fetch_optional(executor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use sqlx::Execute;

    #[test]
    fn test_query_as_keeps_sql() {
        #[derive(sqlx::FromRow)]
        struct TestRow {
            #[allow(dead_code)]
            id: i32,
        }

        let stmt = Template::new(["SELECT id FROM users"]).generate().unwrap();
        let query = stmt.query_as::<TestRow>();
        assert_eq!(query.sql(), "SELECT id FROM users");
    }
}
