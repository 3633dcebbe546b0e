//! Scalar expression AST.
//!
//! A small, strongly-typed model of the KQL scalar expressions the compiler
//! emits, with exhaustive pattern matching enforced by the compiler.

use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A KQL scalar expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(String),

    /// Path into a `dynamic` column: `Column["a"]["b"]`
    DynamicPath { column: String, path: Vec<String> },

    /// Literal values
    Literal(Literal),

    /// Infix operation: left op right
    Binary {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },

    /// Function call: name(args...)
    Function { name: String, args: Vec<Expr> },

    /// List membership: expr op (values...)
    List {
        expr: Box<Expr>,
        op: String,
        values: Vec<Expr>,
    },

    /// Range test: expr op (low .. high)
    Range {
        expr: Box<Expr>,
        op: String,
        low: Box<Expr>,
        high: Box<Expr>,
    },

    /// Conjunction / disjunction over operands
    Logical { op: LogicalOp, operands: Vec<Expr> },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Template variable passed through unquoted
    Variable(String),

    /// Diagnostic in place of an expression that could not be rendered
    Warning(String),

    /// Trusted text passed directly to output without escaping.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    DateTime(String),
    TimeSpan(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl Expr {
    /// Convert to tokens.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column(name) => {
                ts.push(Token::Ident(name.clone()));
            }

            Expr::DynamicPath { column, path } => {
                ts.push(Token::Ident(column.clone()));
                for segment in path {
                    ts.push(Token::LBracket)
                        .push(Token::LitString(segment.clone()))
                        .push(Token::RBracket);
                }
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                    Literal::DateTime(s) => Token::LitDateTime(s.clone()),
                    Literal::TimeSpan(s) => Token::LitTimeSpan(s.clone()),
                });
            }

            Expr::Binary { left, op, right } => {
                ts.append(&left.to_tokens())
                    .space()
                    .push(Token::Operator(op.clone()))
                    .space()
                    .append(&right.to_tokens());
            }

            Expr::Function { name, args } => {
                ts.push(Token::FunctionName(name.clone())).lparen();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens());
                }
                ts.rparen();
            }

            Expr::List { expr, op, values } => {
                ts.append(&expr.to_tokens())
                    .space()
                    .push(Token::Operator(op.clone()))
                    .space()
                    .lparen();
                for (i, val) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&val.to_tokens());
                }
                ts.rparen();
            }

            Expr::Range { expr, op, low, high } => {
                ts.append(&expr.to_tokens())
                    .space()
                    .push(Token::Operator(op.clone()))
                    .space()
                    .lparen()
                    .append(&low.to_tokens())
                    .space()
                    .push(Token::DotDot)
                    .space()
                    .append(&high.to_tokens())
                    .rparen();
            }

            Expr::Logical { op, operands } => {
                let joiner = match op {
                    LogicalOp::And => Token::And,
                    LogicalOp::Or => Token::Or,
                };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        ts.space().push(joiner.clone()).space();
                    }
                    ts.append(&operand.to_tokens());
                }
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens());
                ts.rparen();
            }

            Expr::Variable(name) => {
                ts.push(Token::Variable(name.clone()));
            }

            Expr::Warning(message) => {
                ts.push(Token::Warning(message.clone()));
            }

            Expr::Raw(s) => {
                ts.push(Token::Raw(s.clone()));
            }
        }

        ts
    }

    /// Render to KQL text.
    pub fn to_kql(&self) -> String {
        self.to_tokens().serialize()
    }
}

// =============================================================================
// Builder DSL
// =============================================================================

pub fn col(name: &str) -> Expr {
    Expr::Column(name.into())
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
    }
}

pub fn binary(left: Expr, op: &str, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op: op.into(),
        right: Box::new(right),
    }
}

pub fn paren(expr: Expr) -> Expr {
    Expr::Paren(Box::new(expr))
}

/// `a or b or ...`; a single operand is returned unchanged.
pub fn any_of(mut operands: Vec<Expr>) -> Expr {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    Expr::Logical {
        op: LogicalOp::Or,
        operands,
    }
}

/// `a and b and ...`; a single operand is returned unchanged.
pub fn all_of(mut operands: Vec<Expr>) -> Expr {
    if operands.len() == 1 {
        return operands.remove(0);
    }
    Expr::Logical {
        op: LogicalOp::And,
        operands,
    }
}
