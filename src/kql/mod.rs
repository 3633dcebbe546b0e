//! KQL generation.
//!
//! ```text
//! QueryExpression ──▶ compiler ──▶ Pipeline ──▶ Expr / Source ──▶ TokenStream ──▶ String
//! ```
//!
//! All text passes through [`token::Token`], which owns quoting and escaping
//! (see [`quote`]). Builders never concatenate strings themselves.

pub mod compiler;
pub mod expr;
pub mod pipeline;
pub mod quote;
pub mod token;

pub use compiler::{compile, compile_with, CompileContext, CompileOptions, CompileOutput, CompileWarning};
pub use expr::{Expr, Literal, LogicalOp};
pub use pipeline::{Pipeline, Source, TabularOperator};
pub use token::{Token, TokenStream};
