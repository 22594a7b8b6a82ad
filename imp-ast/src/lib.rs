#![forbid(unsafe_code)]

mod arith;
mod command;
mod formula;
mod interpreted;

use std::fmt;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub use arith::{ArithExpr, ArithOp, trunc_div, trunc_rem};
pub use command::{COMMAND_DELIMITER, Command, CommandDecl, Sequence, SequenceError};
pub use formula::{Assertion, CmpOp, Formula, LogicOp};
pub use interpreted::{INTERPRETED_FUNCTIONS, InterpretedFunction, interpreted_function};

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

#[derive(Debug, Error, Diagnostic)]
#[error("invalid name `{0}`")]
#[diagnostic(code(imp::name), help("names are ASCII letters, digits and `_`, not starting with a digit"))]
pub struct NameError(pub String);

/// A validated identifier used for program variables and predicate symbols.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    pub fn new(raw: impl Into<String>) -> Result<Self, NameError> {
        let raw = raw.into();
        let mut chars = raw.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self(raw))
        } else {
            Err(NameError(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A Hoare triple `{pre} command {post}`.
///
/// Built fresh for every checking pass; it carries no identity of its own.
#[derive(Clone, Debug, PartialEq)]
pub struct HoareTriple {
    pub pre: Assertion,
    pub command: CommandDecl,
    pub post: Assertion,
}

impl HoareTriple {
    pub fn new(pre: Assertion, command: CommandDecl, post: Assertion) -> Self {
        Self { pre, command, post }
    }
}

impl fmt::Display for HoareTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pre, self.command, self.post)
    }
}

/// A top-level declaration: what a single source snippet parses to.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Assertion(Assertion),
    Command(CommandDecl),
}

impl Decl {
    pub fn source(&self) -> &str {
        match self {
            Decl::Assertion(a) => a.source(),
            Decl::Command(c) => c.source(),
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Assertion(a) => a.fmt(f),
            Decl::Command(c) => c.fmt(f),
        }
    }
}
