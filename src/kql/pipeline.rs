//! Tabular pipeline builder - `source | operator | operator ...`.

use super::expr::Expr;
use super::token::{Token, TokenStream};

// =============================================================================
// Source
// =============================================================================

/// Where the pipeline reads from.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub enum Source {
    /// Table or materialized view, optionally in another database.
    Table {
        database: Option<String>,
        name: String,
    },
    /// Stored function invocation.
    Function {
        database: Option<String>,
        name: String,
    },
    /// Trusted invocation text such as `Errors(1h)`, from schema or configuration.
    Raw(String),
    /// No source chosen yet.
    Placeholder,
}

/// Text emitted for a pipeline without a source.
pub const SOURCE_PLACEHOLDER: &str = "<table>";

impl Source {
    pub fn table(name: &str) -> Self {
        Source::Table {
            database: None,
            name: name.into(),
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            Source::Table { database, name } => {
                emit_database(&mut ts, database.as_deref());
                ts.push(Token::Ident(name.clone()));
            }
            Source::Function { database, name } => {
                emit_database(&mut ts, database.as_deref());
                ts.push(Token::FunctionName(name.clone())).lparen().rparen();
            }
            Source::Raw(text) => {
                ts.push(Token::Raw(text.clone()));
            }
            Source::Placeholder => {
                ts.push(Token::Raw(SOURCE_PLACEHOLDER.into()));
            }
        }
        ts
    }
}

fn emit_database(ts: &mut TokenStream, database: Option<&str>) {
    if let Some(db) = database {
        ts.push(Token::FunctionName("database".into()))
            .lparen()
            .push(Token::LitString(db.into()))
            .rparen()
            .push(Token::Dot);
    }
}

// =============================================================================
// Tabular operators
// =============================================================================

/// One stage after the source.
#[derive(Debug, Clone, PartialEq)]
pub enum TabularOperator {
    /// `where predicate`
    Where(Expr),
    /// `summarize aggregates by keys`
    Summarize { aggregates: Vec<Expr>, by: Vec<Expr> },
    /// `take n`
    Take(u64),
}

impl TabularOperator {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            TabularOperator::Where(predicate) => {
                ts.push(Token::Where).space().append(&predicate.to_tokens());
            }
            TabularOperator::Summarize { aggregates, by } => {
                ts.push(Token::Summarize);
                emit_list(&mut ts, aggregates);
                if !by.is_empty() {
                    ts.space().push(Token::By);
                    emit_list(&mut ts, by);
                }
            }
            TabularOperator::Take(n) => {
                ts.push(Token::Take)
                    .space()
                    .push(Token::LitInt(i64::try_from(*n).unwrap_or(i64::MAX)));
            }
        }
        ts
    }
}

fn emit_list(ts: &mut TokenStream, exprs: &[Expr]) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            ts.comma();
        }
        ts.space().append(&expr.to_tokens());
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// A complete tabular query.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Pipeline {
    pub source: Source,
    pub operators: Vec<TabularOperator>,
}

impl Pipeline {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            operators: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.operators.push(TabularOperator::Where(predicate));
        self
    }

    /// Add a summarize stage; skipped when both lists are empty.
    pub fn summarize(mut self, aggregates: Vec<Expr>, by: Vec<Expr>) -> Self {
        if !aggregates.is_empty() || !by.is_empty() {
            self.operators
                .push(TabularOperator::Summarize { aggregates, by });
        }
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.operators.push(TabularOperator::Take(n));
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.source.to_tokens();
        for op in &self.operators {
            ts.pipe().append(&op.to_tokens());
        }
        ts
    }

    /// Render to KQL text.
    pub fn to_kql(&self) -> String {
        self.to_tokens().serialize()
    }
}
