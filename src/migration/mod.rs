//! Migration of persisted queries.
//!
//! Expressions are recognized by shape and upgraded once per load; whole
//! queries additionally get missing fields filled and their version stamped.
//! Both levels are idempotent and hand back the input itself when there is
//! nothing to do.

pub mod expression;
pub mod query;

pub use expression::{detect_shape, load_expression, migrate, needs_migration, ExpressionShape};
pub use query::{load_query, migrate_query, needs_query_migration};
