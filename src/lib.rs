//! # kql-builder
//!
//! Core of a visual query builder for Azure Data Explorer: a structured query
//! expression compiled to KQL, upgraded across persisted versions, resolved
//! against the cluster schema, with results shaped for display.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Stored query (JSON, any version)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [migration]
//! ┌─────────────────────────────────────────────────────────┐
//! │        QueryExpression (from / where / reduce / by)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [kql compiler] ◄── [schema + mapper]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Pipeline → KQL text                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ (executed by the host)
//! ┌─────────────────────────────────────────────────────────┐
//! │        Raw result tables → [result] → typed frames       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod compile;
pub mod config;
pub mod error;
pub mod expression;
pub mod kql;
pub mod migration;
pub mod query;
pub mod result;
pub mod schema;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Property, PropertyDefinition, PropertyType};
    pub use crate::compile::{QueryBuilder, QueryOutput};
    pub use crate::expression::builders::{
        // Properties
        boolean,
        datetime,
        number,
        string,
        timespan,
        // Nodes
        and,
        bin,
        check,
        filter,
        filter_list,
        group,
        or,
        param,
        reduce,
        reduce_with,
        source,
    };
    pub use crate::expression::QueryExpression;
    pub use crate::kql::{compile, compile_with, CompileContext, CompileOptions, CompileWarning};
    pub use crate::migration::{load_query, migrate, migrate_query};
    pub use crate::query::{ResultFormat, StoredQuery};
    pub use crate::result::{shape, FormatError, ShapedResult};
    pub use crate::schema::{ClusterSchema, ResolvedTableSchema, SchemaMapper};
}

pub use error::{Error, Result};
pub use kql::{compile, compile_with, CompileOptions};
pub use migration::migrate;
pub use result::shape;
