#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use imp_ast::Span;
use imp_lex::LexError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("parse error: {message}")]
#[diagnostic(code(imp::parse))]
#[allow(unused_assignments)]
pub struct ParseError {
    pub message: String,
    #[label]
    pub span: Span,
}

/// The parse tree is well-formed but does not denote an Imp declaration
/// (wrong node kind in some position, ill-sorted operand, bad literal).
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(imp::translate))]
#[allow(unused_assignments)]
pub struct TranslationError {
    /// `{from}-{to}: {expectation} `{offending text}`.`
    pub message: String,
    #[label]
    pub span: Span,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ImpParseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Translation(#[from] TranslationError),

    #[error("`{0}` is not an assertion")]
    #[diagnostic(code(imp::not_an_assertion))]
    NotAnAssertion(String),

    #[error("`{0}` is not a command")]
    #[diagnostic(code(imp::not_a_command))]
    NotACommand(String),
}
