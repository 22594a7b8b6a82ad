#![forbid(unsafe_code)]

use imp_ast::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn start(&self) -> usize {
        self.span.offset()
    }

    pub fn end(&self) -> usize {
        self.span.offset() + self.span.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwTrue,
    KwFalse,
    KwSkip,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semi,
    ColonEq,

    // Comparison
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,

    // Logic
    AndAnd,
    OrOr,
    FatArrow,
    Bang,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Int(String),
    Ident(String),

    Eof,
}

impl TokenKind {
    /// Source-like rendering used in parse error messages.
    pub fn describe(&self) -> String {
        let s = match self {
            TokenKind::KwTrue => "true",
            TokenKind::KwFalse => "false",
            TokenKind::KwSkip => "skip",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::ColonEq => ":=",
            TokenKind::Eq => "=",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::FatArrow => "=>",
            TokenKind::Bang => "!",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Int(text) | TokenKind::Ident(text) => return format!("`{text}`"),
            TokenKind::Eof => return "end of input".to_string(),
        };
        format!("`{s}`")
    }
}
