//! # sqlx-fragments
//!
//! Safe composition of parameterized SQL for SQLx: fragments that always carry
//! their bound values, a compiler from caller-supplied boolean expressions to
//! WHERE clauses checked against a field allow-list, and reusable statement
//! templates whose placeholders are bound at generation time.
//!
//! ## Features
//!
//! - **Fragments**: SQL text plus ordered values, where the `?` count always
//!   matches the value count
//! - **Allow-listed filters**: JSON-friendly `and`/`or` trees compile into
//!   parenthesized conditions; unknown fields and operators are rejected
//! - **Templates**: build a skeleton once, generate it many times (from many
//!   threads) with different bindings
//! - **Named placeholders**: `:name` SQL turns into a fragment with value-level
//!   placeholders
//! - **Execution**: a generated `Statement` runs on any MySQL `Executor`
//!
//! ## Examples
//!
//! ### Compiling a filter
//!
//! ```rust
//! use sqlx_fragments::filter::{compile, Node};
//! use sqlx_fragments::{Arg, FieldMap};
//!
//! let fields = FieldMap::new().with("status", "u.status").with("age", "u.age");
//! let node: Node = serde_json::from_str(
//!     r#"{"op": "and", "blocks": [
//!         {"op": "=", "field": "status", "value": "active"},
//!         {"op": ">=", "field": "age", "value": 18}
//!     ]}"#,
//! )?;
//!
//! let filter = compile(&node, &fields)?;
//! assert_eq!(filter.sql(), "((u.status) = ?) and ((u.age) >= ?)");
//! assert_eq!(filter.args(), &[Arg::value("active"), Arg::value(18)]);
//! # Ok::<(), sqlx_fragments::Error>(())
//! ```
//!
//! ### Reusable templates
//!
//! ```rust
//! use sqlx_fragments::param::slots;
//! use sqlx_fragments::{BlockParam, Bindings, Fragment, Select, Template, Value, ValueParam};
//!
//! let insert = Template::insert("users", slots(["name", "email"]), None);
//!
//! for (name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
//!     let stmt = insert.generate_with(&Bindings::new().value("name", name).value("email", email))?;
//!     assert_eq!(stmt.values(), &[Value::from(name), Value::from(email)]);
//! }
//!
//! let page = Select::new("users")
//!     .column("id")
//!     .filter(BlockParam::new("where").with_default(Fragment::empty()))
//!     .order_by("order by id")
//!     .offset(ValueParam::new("skip").with_default(0))
//!     .count(ValueParam::new("take").with_default(50))
//!     .build();
//!
//! let stmt = page.generate_with(&Bindings::new().value("skip", 100))?;
//! assert_eq!(stmt.values(), &[Value::Int(100), Value::Int(50)]);
//! # Ok::<(), sqlx_fragments::Error>(())
//! ```
//!
//! ### Executing
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_fragments::{Bindings, Fragment};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! let stmt = Fragment::named("UPDATE users SET name = :name WHERE id = :id")?
//!     .resolve(&Bindings::new().value("name", "Jane").value("id", 42))?;
//! let result = stmt.execute(&pool).await?;
//! println!("Updated {} rows", result.rows_affected());
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Compose**: fragments, placeholders and literal text are assembled into a
//!    template; nothing is resolved yet
//! 2. **Generate**: block-level placeholders are substituted, segments are
//!    concatenated, then value-level placeholders are resolved left to right into
//!    a `Statement`
//! 3. **Execute**: a fresh SQLx query is built from the statement on each call
//!
//! ## Limitations
//!
//! - Execution targets MySQL; rendered paging uses the
//!   `offset .. rows fetch next .. rows only` form
//! - Literal `?` characters in SQL text count as placeholders
//! - Placeholder names in `:name` SQL must match `[a-zA-Z0-9_]+`
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod builder;
pub mod error;
pub mod fields;
pub mod filter;
pub mod fragment;
pub mod order;
pub mod param;
pub mod query;
pub mod query_as;
pub mod statements;
pub mod template;
pub mod value;

pub use error::{Error, Result};
pub use fields::FieldMap;
pub use fragment::{Arg, Fragment, Statement};
pub use order::{Direction, OrderBy};
pub use param::{BlockParam, Bindings, Param, ParamLevel, Resolution, ValueParam};
pub use statements::{RowCount, Select};
pub use template::{Segment, Template};
pub use value::{ParamKey, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::filter::{compile, Node};
    pub use crate::param::slots;
    pub use crate::{
        Bindings, BlockParam, FieldMap, Fragment, OrderBy, Select, Statement, Template, Value,
        ValueParam,
    };
}
