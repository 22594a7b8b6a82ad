#![forbid(unsafe_code)]

use std::mem;

use imp_ast::{Span, span_between};
use imp_lex::{Token, TokenKind};

use crate::cst::{NodeKind, SyntaxTree};
use crate::error::ParseError;

/// Bound on expression nesting, counting both bracketing and operator chains.
pub const MAX_NESTING: usize = 256;

/// Recursive-descent parser from tokens to a [`SyntaxTree`].
///
/// The expression grammar is untyped: `x && 1` parses fine and is rejected
/// later, during translation. Precedence, loosest first: `=>` (right
/// associative), `||`, `&&`, prefix `!`, comparisons (non-associative),
/// `+ -`, `* / %`, prefix `+ -`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    depth: usize,
    tree: SyntaxTree,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            idx: 0,
            depth: 0,
            tree: SyntaxTree::new(),
        }
    }

    /// Parses exactly one assertion or command, consuming all input.
    pub fn parse_top_decl(mut self) -> Result<SyntaxTree, ParseError> {
        let decl = if self.at(TokenKind::LBrace) {
            self.parse_assertion()?
        } else {
            self.parse_command()?
        };

        if !self.at(TokenKind::Eof) {
            let tok = self.expect_any()?;
            return Err(ParseError {
                message: format!("unexpected {} after the end of the declaration", tok.kind.describe()),
                span: tok.span,
            });
        }

        let (from, to) = self.tree.range(decl);
        let top = self.tree.push(NodeKind::TopDecl, from, to, vec![decl]);
        self.tree.set_root(top);
        Ok(self.tree)
    }

    fn parse_assertion(&mut self) -> Result<usize, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        if self.at(TokenKind::RBrace) {
            let close = self.expect_any()?;
            return Err(ParseError {
                message: "an assertion needs at least one formula between `{` and `}`".to_string(),
                span: span_between(open.start(), close.end()),
            });
        }

        let mut formulas = vec![self.parse_expr()?];
        // The formulas fold into a right-nested conjunction.
        while self.at(TokenKind::Comma) {
            self.next();
            self.enter()?;
            formulas.push(self.parse_expr()?);
        }
        self.depth -= formulas.len() - 1;
        let close = self.expect(TokenKind::RBrace)?;

        Ok(self
            .tree
            .push(NodeKind::Assertion, open.start(), close.end(), formulas))
    }

    fn parse_command(&mut self) -> Result<usize, ParseError> {
        let mut stmts = Vec::new();
        while !self.at(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }

        let (Some(&first), Some(&last)) = (stmts.first(), stmts.last()) else {
            return Err(ParseError {
                message: "expected an assertion or a command".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(0, 0)),
            });
        };
        let from = self.tree.range(first).0;
        let to = self.tree.range(last).1;
        Ok(self.tree.push(NodeKind::Command, from, to, stmts))
    }

    fn parse_statement(&mut self) -> Result<usize, ParseError> {
        let tok = self.expect_any()?;
        match &tok.kind {
            TokenKind::KwSkip => {
                let semi = self.expect(TokenKind::Semi)?;
                Ok(self
                    .tree
                    .push(NodeKind::CmdSkip, tok.start(), semi.end(), Vec::new()))
            }
            TokenKind::Ident(_) => {
                let name = self.leaf(NodeKind::Name, &tok);
                let assign_tok = self.expect(TokenKind::ColonEq)?;
                let assign_op = self.leaf(NodeKind::AssignOp, &assign_tok);
                let rhs = self.parse_expr()?;
                let semi = self.expect(TokenKind::Semi)?;
                Ok(self.tree.push(
                    NodeKind::Assign,
                    tok.start(),
                    semi.end(),
                    vec![name, assign_op, rhs],
                ))
            }
            other => Err(ParseError {
                message: format!("expected a command but found {}", other.describe()),
                span: tok.span,
            }),
        }
    }

    fn parse_expr(&mut self) -> Result<usize, ParseError> {
        self.nested(Self::parse_implies_expr)
    }

    fn parse_implies_expr(&mut self) -> Result<usize, ParseError> {
        let left = self.parse_or_expr()?;
        if self.at(TokenKind::FatArrow) {
            let op = self.expect_any()?;
            let right = self.nested(Self::parse_implies_expr)?;
            return Ok(self.binary(NodeKind::ImpliesE, left, &op, NodeKind::LogicOp, right));
        }
        Ok(left)
    }

    fn parse_or_expr(&mut self) -> Result<usize, ParseError> {
        let mut left = self.parse_and_expr()?;
        let mut chain = 0;
        while self.at(TokenKind::OrOr) {
            self.enter()?;
            chain += 1;
            let op = self.expect_any()?;
            let right = self.parse_and_expr()?;
            left = self.binary(NodeKind::OrE, left, &op, NodeKind::LogicOp, right);
        }
        self.depth -= chain;
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<usize, ParseError> {
        let mut left = self.parse_not_expr()?;
        let mut chain = 0;
        while self.at(TokenKind::AndAnd) {
            self.enter()?;
            chain += 1;
            let op = self.expect_any()?;
            let right = self.parse_not_expr()?;
            left = self.binary(NodeKind::AndE, left, &op, NodeKind::LogicOp, right);
        }
        self.depth -= chain;
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<usize, ParseError> {
        if !self.at(TokenKind::Bang) {
            return self.parse_cmp_expr();
        }
        let bang_tok = self.expect_any()?;
        let bang = self.leaf(NodeKind::Bang, &bang_tok);
        let operand = self.nested(Self::parse_not_expr)?;
        let to = self.tree.range(operand).1;
        Ok(self
            .tree
            .push(NodeKind::NegE, bang_tok.start(), to, vec![bang, operand]))
    }

    fn parse_cmp_expr(&mut self) -> Result<usize, ParseError> {
        let left = self.parse_add_expr()?;
        if !self.at_comparison() {
            return Ok(left);
        }
        let op = self.expect_any()?;
        let right = self.parse_add_expr()?;
        let expr = self.binary(NodeKind::CompE, left, &op, NodeKind::CompareOp, right);

        // `a < b < c` is rejected rather than read as `(a < b) < c`.
        if self.at_comparison() {
            let (from, to) = self.tree.range(expr);
            return Err(ParseError {
                message: "chained comparisons are not supported; use `&&` between comparisons".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(from, to)),
            });
        }

        Ok(expr)
    }

    fn parse_add_expr(&mut self) -> Result<usize, ParseError> {
        let mut left = self.parse_mul_expr()?;
        let mut chain = 0;
        while self.at(TokenKind::Plus) || self.at(TokenKind::Minus) {
            self.enter()?;
            chain += 1;
            let op = self.expect_any()?;
            let right = self.parse_mul_expr()?;
            left = self.binary(NodeKind::BinArithE, left, &op, NodeKind::ArithOp, right);
        }
        self.depth -= chain;
        Ok(left)
    }

    fn parse_mul_expr(&mut self) -> Result<usize, ParseError> {
        let mut left = self.parse_unary_expr()?;
        let mut chain = 0;
        while self.at(TokenKind::Star) || self.at(TokenKind::Slash) || self.at(TokenKind::Percent) {
            self.enter()?;
            chain += 1;
            let op = self.expect_any()?;
            let right = self.parse_unary_expr()?;
            left = self.binary(NodeKind::BinArithE, left, &op, NodeKind::ArithOp, right);
        }
        self.depth -= chain;
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<usize, ParseError> {
        if !(self.at(TokenKind::Plus) || self.at(TokenKind::Minus)) {
            return self.parse_primary_expr();
        }
        let op_tok = self.expect_any()?;
        let op = self.leaf(NodeKind::ArithOp, &op_tok);
        let operand = self.nested(Self::parse_unary_expr)?;
        let to = self.tree.range(operand).1;
        Ok(self
            .tree
            .push(NodeKind::UnaryExpr, op_tok.start(), to, vec![op, operand]))
    }

    fn parse_primary_expr(&mut self) -> Result<usize, ParseError> {
        let tok = self.expect_any()?;
        match &tok.kind {
            TokenKind::Int(_) => Ok(self.leaf(NodeKind::LitNumber, &tok)),
            TokenKind::KwTrue | TokenKind::KwFalse => Ok(self.leaf(NodeKind::LitBool, &tok)),
            TokenKind::Ident(_) => {
                let name = self.leaf(NodeKind::Name, &tok);
                if !self.at(TokenKind::LParen) {
                    return Ok(name);
                }
                let args = self.parse_arg_list()?;
                let to = self.tree.range(args).1;
                Ok(self
                    .tree
                    .push(NodeKind::PredicateApp, tok.start(), to, vec![name, args]))
            }
            TokenKind::LParen => {
                if self.at(TokenKind::RParen) {
                    let close = self.expect_any()?;
                    return Err(ParseError {
                        message: "expected an expression inside parentheses".to_string(),
                        span: span_between(tok.start(), close.end()),
                    });
                }
                let open = self.leaf(NodeKind::LParen, &tok);
                let inner = self.parse_expr()?;
                let close_tok = self.expect(TokenKind::RParen)?;
                let close = self.leaf(NodeKind::RParen, &close_tok);
                let kind = if self.tree.kind(inner).is_formula() {
                    NodeKind::ParenthesizedFormula
                } else {
                    NodeKind::ParenthesizedArithExp
                };
                Ok(self
                    .tree
                    .push(kind, tok.start(), close_tok.end(), vec![open, inner, close]))
            }
            other => Err(ParseError {
                message: format!("expected an expression but found {}", other.describe()),
                span: tok.span,
            }),
        }
    }

    fn parse_arg_list(&mut self) -> Result<usize, ParseError> {
        let open_tok = self.expect(TokenKind::LParen)?;
        let mut children = vec![self.leaf(NodeKind::LParen, &open_tok)];

        if self.at(TokenKind::RParen) {
            let close_tok = self.expect_any()?;
            children.push(self.leaf(NodeKind::RParen, &close_tok));
            return Ok(self
                .tree
                .push(NodeKind::ArgList, open_tok.start(), close_tok.end(), children));
        }

        loop {
            children.push(self.parse_expr()?);
            let tok = self.expect_any()?;
            match &tok.kind {
                TokenKind::Comma => children.push(self.leaf(NodeKind::Comma, &tok)),
                TokenKind::RParen => {
                    children.push(self.leaf(NodeKind::RParen, &tok));
                    return Ok(self
                        .tree
                        .push(NodeKind::ArgList, open_tok.start(), tok.end(), children));
                }
                other => {
                    return Err(ParseError {
                        message: format!(
                            "expected `,` or `)` in argument list but found {}",
                            other.describe()
                        ),
                        span: tok.span,
                    });
                }
            }
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<usize, ParseError>) -> Result<usize, ParseError> {
        self.enter()?;
        let node = parse(self)?;
        self.depth -= 1;
        Ok(node)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError {
                message: "expression nested too deeply".to_string(),
                span: self.peek_span().unwrap_or_else(|| span_between(0, 0)),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn binary(&mut self, kind: NodeKind, left: usize, op: &Token, op_kind: NodeKind, right: usize) -> usize {
        let op = self.leaf(op_kind, op);
        let from = self.tree.range(left).0;
        let to = self.tree.range(right).1;
        self.tree.push(kind, from, to, vec![left, op, right])
    }

    fn leaf(&mut self, kind: NodeKind, tok: &Token) -> usize {
        self.tree.push(kind, tok.start(), tok.end(), Vec::new())
    }

    fn at_comparison(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Eq
                    | TokenKind::Neq
                    | TokenKind::Lt
                    | TokenKind::Le
                    | TokenKind::Gt
                    | TokenKind::Ge
            )
        )
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let tok = self.expect_any()?;
        if mem::discriminant(&tok.kind) == mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError {
                message: format!("expected {} but found {}", expected.describe(), tok.kind.describe()),
                span: tok.span,
            })
        }
    }

    fn expect_any(&mut self) -> Result<Token, ParseError> {
        self.next().ok_or_else(|| ParseError {
            message: "unexpected end of input".to_string(),
            span: span_between(0, 0),
        })
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| mem::discriminant(k) == mem::discriminant(&kind))
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.idx)?.clone();
        self.idx += 1;
        Some(tok)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.idx).map(|t| &t.kind)
    }

    fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.idx).map(|t| t.span)
    }
}
