//! KQL tokens - the atomic units of query output.
//!
//! Every piece of generated text goes through a [`Token`], so quoting and
//! escaping rules live in exactly one place.

use super::quote;

/// KQL token - every possible element of a generated query.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Tabular operators ===
    Where,
    Summarize,
    By,
    Take,

    // === Logical / range keywords ===
    And,
    Or,
    DotDot,

    // === Punctuation ===
    Pipe,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,

    // === Whitespace ===
    Space,

    // === Dynamic Content ===
    /// Scalar operator word or symbol (`==`, `contains`, `!in`)
    Operator(String),
    /// Column, table or function identifier
    Ident(String),
    /// Integer literal
    LitInt(i64),
    /// Real literal
    LitFloat(f64),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),
    /// `datetime(...)` literal; the payload is already validated
    LitDateTime(String),
    /// Timespan literal (`5m`); the payload is already validated
    LitTimeSpan(String),
    /// Function name, rendered as-is
    FunctionName(String),
    /// Grafana template variable or macro (`$var`, `$__timeFilter`)
    Variable(String),

    /// A diagnostic embedded in place of a clause that could not be rendered.
    Warning(String),

    // === Escape Hatch ===
    /// Text passed directly to output without escaping.
    ///
    /// Only for trusted, static fragments or administrator configuration;
    /// never for user input.
    Raw(String),
}

impl Token {
    /// Serialize this token to text.
    pub fn serialize(&self) -> String {
        match self {
            Token::Where => "where".into(),
            Token::Summarize => "summarize".into(),
            Token::By => "by".into(),
            Token::Take => "take".into(),

            Token::And => "and".into(),
            Token::Or => "or".into(),
            Token::DotDot => "..".into(),

            Token::Pipe => "|".into(),
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),

            Token::Space => " ".into(),

            Token::Operator(op) => op.clone(),
            Token::Ident(name) => quote::quote_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => quote::format_real(*f),
            Token::LitString(s) => quote::quote_string(s),
            Token::LitBool(b) => quote::format_bool(*b).into(),
            Token::LitDateTime(s) => format!("datetime({})", s),
            Token::LitTimeSpan(s) => s.clone(),
            Token::FunctionName(name) => name.clone(),
            Token::Variable(name) => name.clone(),
            Token::Warning(message) => format!("/* {} */", message.replace("*/", "* /")),
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to KQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to a KQL string.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(Token::serialize).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn pipe(&mut self) -> &mut Self {
        self.space().push(Token::Pipe).space()
    }
}
