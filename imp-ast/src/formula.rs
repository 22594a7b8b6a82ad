#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use crate::{ArithExpr, Name};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
    Implies,
}

impl LogicOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
            LogicOp::Implies => "=>",
        }
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        match text {
            "&&" => Some(LogicOp::And),
            "||" => Some(LogicOp::Or),
            "=>" => Some(LogicOp::Implies),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Neq => "!=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
        }
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        match text {
            "=" => Some(CmpOp::Eq),
            "!=" => Some(CmpOp::Neq),
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Lte),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Gte),
            _ => None,
        }
    }

    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Neq => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Lte => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Gte => lhs >= rhs,
        }
    }
}

/// Boolean-valued formulas over integer program variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    BoolLit(bool),
    PredicateApp {
        name: Name,
        args: Vec<ArithExpr>,
    },
    Not(Box<Formula>),
    Connective {
        op: LogicOp,
        left: Box<Formula>,
        right: Box<Formula>,
    },
    Compare {
        op: CmpOp,
        left: ArithExpr,
        right: ArithExpr,
    },
}

impl Formula {
    pub fn not(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    pub fn connective(op: LogicOp, left: Formula, right: Formula) -> Self {
        Formula::Connective {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::connective(LogicOp::And, left, right)
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Formula::connective(LogicOp::Implies, left, right)
    }

    pub fn compare(op: CmpOp, left: ArithExpr, right: ArithExpr) -> Self {
        Formula::Compare { op, left, right }
    }

    /// Right-folds `f1, f2, f3` into `f1 && (f2 && f3)`. Empty input yields `None`.
    pub fn conjoin(formulas: impl IntoIterator<Item = Formula>) -> Option<Self> {
        let mut items: Vec<Formula> = formulas.into_iter().collect();
        let mut acc = items.pop()?;
        while let Some(prev) = items.pop() {
            acc = Formula::and(prev, acc);
        }
        Some(acc)
    }

    /// Replaces every free occurrence of `var` with `replacement`.
    pub fn subst(&self, var: &Name, replacement: &ArithExpr) -> Formula {
        match self {
            Formula::BoolLit(_) => self.clone(),
            Formula::PredicateApp { name, args } => Formula::PredicateApp {
                name: name.clone(),
                args: args.iter().map(|a| a.subst(var, replacement)).collect(),
            },
            Formula::Not(inner) => Formula::not(inner.subst(var, replacement)),
            Formula::Connective { op, left, right } => Formula::connective(
                *op,
                left.subst(var, replacement),
                right.subst(var, replacement),
            ),
            Formula::Compare { op, left, right } => Formula::compare(
                *op,
                left.subst(var, replacement),
                right.subst(var, replacement),
            ),
        }
    }

    /// Program variables in the formula; predicate symbols are not included.
    pub fn free_vars(&self) -> BTreeSet<Name> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut BTreeSet<Name>) {
        match self {
            Formula::BoolLit(_) => {}
            Formula::PredicateApp { args, .. } => {
                for a in args {
                    a.collect_vars(out);
                }
            }
            Formula::Not(inner) => inner.collect_vars(out),
            Formula::Connective { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
            Formula::Compare { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
        }
    }

    /// Rebuilds this node with `f` applied to each direct sub-formula.
    /// Leaves (literals, predicate applications, comparisons) are returned as-is.
    pub fn map_children(&self, f: &mut dyn FnMut(&Formula) -> Formula) -> Formula {
        match self {
            Formula::BoolLit(_) | Formula::PredicateApp { .. } | Formula::Compare { .. } => {
                self.clone()
            }
            Formula::Not(inner) => Formula::not(f(inner)),
            Formula::Connective { op, left, right } => Formula::connective(*op, f(left), f(right)),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::BoolLit(b) => write!(f, "{b}"),
            Formula::PredicateApp { name, args } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
            Formula::Not(inner) => write!(f, "!{inner}"),
            Formula::Connective { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Formula::Compare { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}

/// A formula together with the (trimmed) source text it was parsed from.
///
/// Feedback quotes `source()`; `Display` only ever shows the normalized formula.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Assertion {
    source: String,
    formula: Formula,
}

impl Assertion {
    pub fn new(source: impl Into<String>, formula: Formula) -> Self {
        Self {
            source: source.into(),
            formula,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn into_formula(self) -> Formula {
        self.formula
    }

    pub fn map_formula(self, f: impl FnOnce(Formula) -> Formula) -> Assertion {
        Assertion {
            source: self.source,
            formula: f(self.formula),
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} }}", self.formula)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArithOp;
    use proptest::prelude::*;

    fn name(n: &str) -> Name {
        Name::new(n).unwrap()
    }

    fn var(n: &str) -> ArithExpr {
        ArithExpr::Var(name(n))
    }

    #[test]
    fn display_nests_connectives() {
        let f = Formula::and(
            Formula::and(
                Formula::BoolLit(true),
                Formula::not(Formula::BoolLit(false)),
            ),
            Formula::not(Formula::not(Formula::BoolLit(true))),
        );
        assert_eq!(f.to_string(), "((true && !false) && !!true)");
    }

    #[test]
    fn display_predicate_application() {
        let f = Formula::PredicateApp {
            name: name("pred"),
            args: vec![
                var("x"),
                ArithExpr::NumLit(2),
                ArithExpr::binary(ArithOp::Plus, var("y"), ArithExpr::NumLit(1)),
            ],
        };
        assert_eq!(f.to_string(), "pred(x, 2, (y + 1))");
    }

    #[test]
    fn subst_rewrites_every_occurrence() {
        // { x > 5 && y = x - 1 / (x * 3) }
        let f = Formula::and(
            Formula::compare(CmpOp::Gt, var("x"), ArithExpr::NumLit(5)),
            Formula::compare(
                CmpOp::Eq,
                var("y"),
                ArithExpr::binary(
                    ArithOp::Minus,
                    var("x"),
                    ArithExpr::binary(
                        ArithOp::Divide,
                        ArithExpr::NumLit(1),
                        ArithExpr::binary(ArithOp::Mult, var("x"), ArithExpr::NumLit(3)),
                    ),
                ),
            ),
        );
        let out = f.subst(&name("x"), &ArithExpr::NumLit(1337));
        assert_eq!(
            out.to_string(),
            "((1337 > 5) && (y = (1337 - (1 / (1337 * 3)))))"
        );
        assert_eq!(out.free_vars().len(), 1);
    }

    #[test]
    fn conjoin_right_folds() {
        let f = Formula::conjoin(vec![
            Formula::BoolLit(true),
            Formula::BoolLit(false),
            Formula::BoolLit(true),
        ])
        .unwrap();
        assert_eq!(f.to_string(), "(true && (false && true))");
        assert!(Formula::conjoin(Vec::new()).is_none());
    }

    #[test]
    fn free_vars_skip_predicate_symbols() {
        let f = Formula::implies(
            Formula::PredicateApp {
                name: name("p"),
                args: vec![var("b")],
            },
            Formula::compare(CmpOp::Lt, var("a"), var("b")),
        );
        let vars: Vec<String> = f.free_vars().iter().map(|n| n.to_string()).collect();
        assert_eq!(vars, vec!["a", "b"]);
    }

    #[test]
    fn assertion_display_ignores_source_text() {
        let a = Assertion::new("{   true }", Formula::BoolLit(true));
        assert_eq!(a.to_string(), "{ true }");
        assert_eq!(a.source(), "{   true }");
    }

    fn arb_arith() -> impl Strategy<Value = ArithExpr> {
        let leaf = prop_oneof![
            (-50i64..50).prop_map(ArithExpr::NumLit),
            prop_oneof![Just("x"), Just("y"), Just("z")].prop_map(var),
        ];
        leaf.prop_recursive(4, 16, 2, |inner| {
            (
                prop_oneof![
                    Just(ArithOp::Plus),
                    Just(ArithOp::Minus),
                    Just(ArithOp::Mult),
                    Just(ArithOp::Divide),
                    Just(ArithOp::Modulo),
                ],
                inner.clone(),
                inner,
            )
                .prop_map(|(op, l, r)| ArithExpr::binary(op, l, r))
        })
    }

    fn arb_formula() -> impl Strategy<Value = Formula> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(Formula::BoolLit),
            (arb_arith(), arb_arith()).prop_map(|(l, r)| Formula::compare(CmpOp::Lte, l, r)),
        ];
        leaf.prop_recursive(3, 12, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(Formula::not),
                (inner.clone(), inner).prop_map(|(l, r)| Formula::and(l, r)),
            ]
        })
    }

    proptest! {
        #[test]
        fn subst_removes_target_variable(f in arb_formula(), e in arb_arith()) {
            prop_assume!(!e.free_vars().contains(&name("x")));
            let out = f.subst(&name("x"), &e);
            prop_assert!(!out.free_vars().contains(&name("x")));
        }

        #[test]
        fn subst_of_absent_variable_is_identity(f in arb_formula()) {
            let out = f.subst(&name("absent"), &ArithExpr::NumLit(0));
            prop_assert_eq!(out, f);
        }
    }
}
