#![forbid(unsafe_code)]

// Concrete syntax tree -> Imp abstract syntax.
//
// Every function expects the cursor on the node it translates. On success the
// cursor is back on that node; on error its position is unspecified.

use imp_ast::{
    ArithExpr, ArithOp, Assertion, CmpOp, Command, CommandDecl, Decl, Formula, LogicOp, Name,
    span_between,
};

use crate::cst::{NodeKind, TreeCursor};
use crate::error::TranslationError;

const PREDICATE_ARGUMENT_MESSAGE: &str =
    "Could not parse argument to predicate. Predicate arguments must be integer expressions.";

/// Translates a `TopDecl` node. `src` is the text the tree was parsed from and
/// becomes the declaration's recorded source text.
pub fn translate_decl(cursor: &mut TreeCursor<'_>, src: &str) -> Result<Decl, TranslationError> {
    if cursor.kind() != NodeKind::TopDecl {
        return Err(refine(
            "Expected a top-level declaration (i.e., a Assertion or Command) but got",
            cursor,
            src,
        ));
    }

    cursor.first_child();
    let decl = match cursor.kind() {
        NodeKind::Assertion => {
            let formulas = gather_formulas_in_assertion(cursor, src)?;
            let conjoined = Formula::conjoin(formulas)
                .ok_or_else(|| refine("Expected formula but got", cursor, src))?;
            Decl::Assertion(Assertion::new(src, conjoined))
        }
        NodeKind::Command => Decl::Command(CommandDecl::new(src, translate_command(cursor, src)?)),
        _ => return Err(refine("Expected Assertion or Command but got", cursor, src)),
    };
    cursor.parent();
    Ok(decl)
}

fn gather_formulas_in_assertion(
    cursor: &mut TreeCursor<'_>,
    src: &str,
) -> Result<Vec<Formula>, TranslationError> {
    let mut formulas = Vec::new();
    if cursor.first_child() {
        loop {
            formulas.push(translate_formula(cursor, src)?);
            if !cursor.next_sibling() {
                break;
            }
        }
        cursor.parent();
    }
    Ok(formulas)
}

fn translate_command(cursor: &mut TreeCursor<'_>, src: &str) -> Result<Command, TranslationError> {
    let at = *cursor;
    let mut commands = Vec::new();
    if cursor.first_child() {
        loop {
            commands.push(translate_statement(cursor, src)?);
            if !cursor.next_sibling() {
                break;
            }
        }
        cursor.parent();
    }

    if commands.len() == 1 {
        return Ok(commands.remove(0));
    }
    Command::sequence(commands).map_err(|_| refine("Expected a Command but got", &at, src))
}

fn translate_statement(cursor: &mut TreeCursor<'_>, src: &str) -> Result<Command, TranslationError> {
    match cursor.kind() {
        NodeKind::Assign => {
            cursor.first_child();
            let var = translate_name(cursor, src)?;
            cursor.next_sibling(); // AssignOp
            cursor.next_sibling(); // right-hand side
            let rhs = translate_arith(cursor, src)?;
            cursor.parent();
            Ok(Command::assign(var, rhs))
        }
        NodeKind::CmdSkip => Ok(Command::Skip),
        _ => Err(refine("Expected a Command but got", cursor, src)),
    }
}

pub fn translate_formula(cursor: &mut TreeCursor<'_>, src: &str) -> Result<Formula, TranslationError> {
    match cursor.kind() {
        NodeKind::LitBool => Ok(Formula::BoolLit(cursor.text(src) == "true")),
        NodeKind::PredicateApp => {
            cursor.first_child();
            let name = translate_name(cursor, src)?;
            cursor.next_sibling();
            let args = translate_arg_list(cursor, src)?;
            cursor.parent();
            Ok(Formula::PredicateApp { name, args })
        }
        NodeKind::AndE | NodeKind::OrE | NodeKind::ImpliesE => {
            let bin = walk_binary(cursor, src, translate_formula)?;
            match LogicOp::from_symbol(bin.op) {
                Some(op) => Ok(Formula::connective(op, bin.left, bin.right)),
                None => Err(refine("Expected logical connective but got", cursor, src)),
            }
        }
        NodeKind::CompE => {
            let bin = walk_binary(cursor, src, translate_arith)?;
            match CmpOp::from_symbol(bin.op) {
                Some(op) => Ok(Formula::compare(op, bin.left, bin.right)),
                None => Err(refine("Expected comparison op but got", cursor, src)),
            }
        }
        NodeKind::NegE => {
            cursor.last_child();
            let negand = translate_formula(cursor, src)?;
            cursor.parent();
            Ok(Formula::not(negand))
        }
        NodeKind::ParenthesizedFormula => walk_parenthesized(cursor, src, translate_formula),
        _ => Err(refine("Expected formula but got", cursor, src)),
    }
}

pub fn translate_arith(cursor: &mut TreeCursor<'_>, src: &str) -> Result<ArithExpr, TranslationError> {
    match cursor.kind() {
        NodeKind::Name => Ok(ArithExpr::Var(translate_name(cursor, src)?)),
        NodeKind::LitNumber => cursor
            .text(src)
            .parse::<i64>()
            .map(ArithExpr::NumLit)
            .map_err(|_| refine("Integer literal out of range:", cursor, src)),
        NodeKind::BinArithE => {
            let bin = walk_binary(cursor, src, translate_arith)?;
            match ArithOp::from_symbol(bin.op) {
                Some(op) => Ok(ArithExpr::binary(op, bin.left, bin.right)),
                None => Err(refine("Unexpected arithmetic op", cursor, src)),
            }
        }
        NodeKind::UnaryExpr => {
            cursor.first_child();
            let op = cursor.text(src);
            cursor.next_sibling();
            let operand = translate_arith(cursor, src)?;
            cursor.parent();
            match op {
                "+" => Ok(operand),
                "-" => Ok(ArithExpr::negate(operand)),
                _ => Err(refine("Unexpected unary op", cursor, src)),
            }
        }
        NodeKind::ParenthesizedArithExp => walk_parenthesized(cursor, src, translate_arith),
        _ => Err(refine("Expected arithmetic expression but got", cursor, src)),
    }
}

fn translate_name(cursor: &TreeCursor<'_>, src: &str) -> Result<Name, TranslationError> {
    if cursor.kind() != NodeKind::Name {
        return Err(refine("Expected a name but got", cursor, src));
    }
    Name::new(cursor.text(src)).map_err(|_| refine("Expected a name but got", cursor, src))
}

/// Arguments of an `ArgList` node: `(`, then arguments separated by `,`, then `)`.
fn translate_arg_list(cursor: &mut TreeCursor<'_>, src: &str) -> Result<Vec<ArithExpr>, TranslationError> {
    let mut args = Vec::new();
    cursor.first_child();
    while cursor.next_sibling() {
        if matches!(cursor.kind(), NodeKind::Comma | NodeKind::RParen) {
            continue;
        }
        let at = *cursor;
        let arg = translate_arith(cursor, src)
            .map_err(|_| refine(PREDICATE_ARGUMENT_MESSAGE, &at, src))?;
        args.push(arg);
    }
    cursor.parent();
    Ok(args)
}

struct Binary<'s, T> {
    left: T,
    op: &'s str,
    right: T,
}

/// Decodes a `left op right` node, translating both operands with `branch`.
fn walk_binary<'s, T>(
    cursor: &mut TreeCursor<'_>,
    src: &'s str,
    branch: fn(&mut TreeCursor<'_>, &str) -> Result<T, TranslationError>,
) -> Result<Binary<'s, T>, TranslationError> {
    cursor.first_child();
    let left = branch(cursor, src)?;
    cursor.next_sibling();
    let op = cursor.text(src);
    cursor.next_sibling();
    let right = branch(cursor, src)?;
    cursor.parent();
    Ok(Binary { left, op, right })
}

fn walk_parenthesized<T>(
    cursor: &mut TreeCursor<'_>,
    src: &str,
    handler: fn(&mut TreeCursor<'_>, &str) -> Result<T, TranslationError>,
) -> Result<T, TranslationError> {
    cursor.first_child();
    cursor.next_sibling();
    let inner = handler(cursor, src)?;
    cursor.parent();
    Ok(inner)
}

fn refine(message: &str, cursor: &TreeCursor<'_>, src: &str) -> TranslationError {
    let (from, to) = (cursor.from(), cursor.to());
    TranslationError {
        message: format!("{from}-{to}: {message} `{}`.", cursor.text(src)),
        span: span_between(from, to),
    }
}
