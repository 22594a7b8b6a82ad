#![forbid(unsafe_code)]

pub mod cst;
mod desugar;
mod error;
mod parser;
mod translate;

use imp_ast::{Assertion, COMMAND_DELIMITER, CommandDecl, Decl};
use imp_lex::Lexer;

pub use cst::{NodeKind, SyntaxTree, TreeCursor};
pub use desugar::{desugar, desugar_formula};
pub use error::{ImpParseError, ParseError, TranslationError};
pub use parser::{MAX_NESTING, Parser};
pub use translate::{translate_arith, translate_decl, translate_formula};

/// Lexes and parses `src` into a concrete syntax tree without interpreting it.
pub fn parse_tree(src: &str) -> Result<SyntaxTree, ImpParseError> {
    let tokens = Lexer::new(src).lex()?;
    Ok(Parser::new(&tokens).parse_top_decl()?)
}

/// Parses one declaration (an assertion or a command) and desugars it.
///
/// Surrounding whitespace is trimmed; the trimmed text is kept as the
/// declaration's source text.
pub fn parse(src: &str) -> Result<Decl, ImpParseError> {
    let trimmed = src.trim();
    let tree = parse_tree(trimmed)?;
    let Some(mut cursor) = tree.cursor() else {
        return Err(ImpParseError::Parse(ParseError {
            message: "empty parse tree".to_string(),
            span: imp_ast::span(0, trimmed.len()),
        }));
    };
    let decl = translate_decl(&mut cursor, trimmed)?;
    Ok(desugar(decl))
}

pub fn parse_to_assertion(src: &str) -> Result<Assertion, ImpParseError> {
    match parse(src)? {
        Decl::Assertion(a) => Ok(a),
        Decl::Command(_) => Err(ImpParseError::NotAnAssertion(src.trim().to_string())),
    }
}

/// Like [`parse`] for a command, appending the trailing `;` when it is missing.
pub fn parse_to_command(src: &str) -> Result<CommandDecl, ImpParseError> {
    let trimmed = src.trim();
    let delimited = if trimmed.ends_with(COMMAND_DELIMITER) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{COMMAND_DELIMITER}")
    };
    match parse(&delimited)? {
        Decl::Command(c) => Ok(c),
        Decl::Assertion(_) => Err(ImpParseError::NotACommand(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imp_ast::{ArithExpr, CmpOp, Command, Formula, LogicOp, Name};

    #[test]
    fn parse_assignment_records_trimmed_source() {
        let decl = parse("  x := 1 - 3;  ").unwrap();
        assert_eq!(decl.source(), "x := 1 - 3;");
        let Decl::Command(cmd) = decl else {
            panic!("expected a command");
        };
        let Command::Assign { var, rhs } = cmd.command() else {
            panic!("expected an assignment");
        };
        assert_eq!(var.as_str(), "x");
        let rendered = rhs.to_string();
        assert_eq!(rendered.trim_start_matches('(').trim_end_matches(')'), "1 - 3");

        let replaced = ArithExpr::Var(var.clone()).subst(var, &ArithExpr::NumLit(1337));
        assert_eq!(replaced, ArithExpr::NumLit(1337));
    }

    #[test]
    fn parse_to_command_appends_delimiter() {
        let cmd = parse_to_command("x := 1").unwrap();
        assert_eq!(cmd.source(), "x := 1;");
        assert_eq!(parse_to_command("zz := 7").unwrap().to_string(), "zz := 7;");
        assert_eq!(parse_to_command("skip ;").unwrap().to_string(), "skip;");
    }

    #[test]
    fn parse_to_command_rejects_assertions() {
        let err = parse_to_command("{ true }").unwrap_err();
        assert!(matches!(err, ImpParseError::Parse(_) | ImpParseError::NotACommand(_)));
        let err = parse_to_assertion("skip;").unwrap_err();
        assert!(matches!(err, ImpParseError::NotAnAssertion(_)));
    }

    #[test]
    fn kind_mismatch_reports_trimmed_source() {
        let err = parse_to_assertion("  x := 1;\n ").unwrap_err();
        assert_eq!(err.to_string(), "`x := 1;` is not an assertion");
    }

    #[test]
    fn parse_multiple_statements_as_sequence() {
        let cmd = parse_to_command("a := 1; b := a + 1; skip;").unwrap();
        assert_eq!(cmd.command().sub_commands().len(), 3);
        assert_eq!(cmd.to_string(), "a := 1; b := (a + 1); skip;");
    }

    #[test]
    fn comma_separated_formulas_are_right_folded() {
        let a = parse_to_assertion("{ x > 0, y > 0, z > 0 }").unwrap();
        assert_eq!(a.to_string(), "{ ((x > 0) && ((y > 0) && (z > 0))) }");
    }

    #[test]
    fn connectives_are_left_associative() {
        let a = parse_to_assertion("{ true && !false && !!true }").unwrap();
        assert_eq!(a.formula().to_string(), "((true && !false) && !!true)");
        let o = parse_to_assertion("{ true || false || true }").unwrap();
        assert_eq!(o.formula().to_string(), "((true || false) || true)");
    }

    #[test]
    fn implication_is_right_associative_and_loosest() {
        let a = parse_to_assertion("{ a > 0 => b > 0 => c > 0 || d > 0 }").unwrap();
        let Formula::Connective { op, right, .. } = a.formula() else {
            panic!("expected a connective");
        };
        assert_eq!(*op, LogicOp::Implies);
        assert!(matches!(
            right.as_ref(),
            Formula::Connective {
                op: LogicOp::Implies,
                ..
            }
        ));
    }

    #[test]
    fn conjunction_of_comparisons() {
        let a = parse_to_assertion("{ y = 1 && x > 1 }").unwrap();
        let Formula::Connective { op, left, right } = a.formula() else {
            panic!("expected a conjunction");
        };
        assert_eq!(*op, LogicOp::And);
        assert!(matches!(left.as_ref(), Formula::Compare { op: CmpOp::Eq, .. }));
        assert!(matches!(right.as_ref(), Formula::Compare { op: CmpOp::Gt, .. }));
    }

    #[test]
    fn unary_minus_is_multiplication_by_minus_one() {
        let a = parse_to_assertion("{ -x = +3 }").unwrap();
        let Formula::Compare { left, right, .. } = a.formula() else {
            panic!("expected a comparison");
        };
        assert_eq!(*left, ArithExpr::negate(ArithExpr::Var(Name::new("x").unwrap())));
        assert_eq!(*right, ArithExpr::NumLit(3));
    }

    #[test]
    fn interpreted_predicates_are_desugared() {
        let a = parse_to_assertion("{ even(x + 1) }").unwrap();
        assert_eq!(a.to_string(), "{ (((x + 1) % 2) = 0) }");
        assert_eq!(a.source(), "{ even(x + 1) }");
    }

    #[test]
    fn translation_errors_carry_span_and_text() {
        let t = match parse("{ true + 1 }").unwrap_err() {
            ImpParseError::Translation(t) => t,
            other => panic!("expected a translation error, got {other:?}"),
        };
        assert_eq!(t.message, "2-10: Expected formula but got `true + 1`.");
        assert_eq!(t.span.offset(), 2);
        assert_eq!(t.span.len(), 8);

        let t = match parse("x := y > 1;").unwrap_err() {
            ImpParseError::Translation(t) => t,
            other => panic!("expected a translation error, got {other:?}"),
        };
        assert_eq!(t.message, "5-10: Expected arithmetic expression but got `y > 1`.");
    }

    #[test]
    fn translate_decl_requires_top_decl() {
        let src = "{ x > 1 }";
        let tree = parse_tree(src).unwrap();
        let mut cursor = tree.cursor().unwrap();
        assert!(cursor.first_child());
        let err = translate_decl(&mut cursor, src).unwrap_err();
        assert!(
            err.message
                .starts_with("0-9: Expected a top-level declaration"),
            "unexpected message: {}",
            err.message
        );
    }

    #[test]
    fn integer_literal_overflow_is_reported() {
        let err = parse("{ x = 99999999999999999999 }").unwrap_err();
        assert!(matches!(err, ImpParseError::Translation(_)), "got {err:?}");
    }
}
