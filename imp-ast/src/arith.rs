#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use crate::Name;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Plus,
    Minus,
    Mult,
    Divide,
    Modulo,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Plus => "+",
            ArithOp::Minus => "-",
            ArithOp::Mult => "*",
            ArithOp::Divide => "/",
            ArithOp::Modulo => "%",
        }
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        match text {
            "+" => Some(ArithOp::Plus),
            "-" => Some(ArithOp::Minus),
            "*" => Some(ArithOp::Mult),
            "/" => Some(ArithOp::Divide),
            "%" => Some(ArithOp::Modulo),
            _ => None,
        }
    }

    /// Applies the operator; `None` means the result does not fit in an `i64`.
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            ArithOp::Plus => lhs.checked_add(rhs),
            ArithOp::Minus => lhs.checked_sub(rhs),
            ArithOp::Mult => lhs.checked_mul(rhs),
            ArithOp::Divide => trunc_div(lhs, rhs),
            ArithOp::Modulo => trunc_rem(lhs, rhs),
        }
    }
}

/// Division rounding toward zero, with `x / 0 = 0`.
pub fn trunc_div(dividend: i64, divisor: i64) -> Option<i64> {
    if divisor == 0 {
        return Some(0);
    }
    dividend.checked_div(divisor)
}

/// Remainder matching [`trunc_div`]: `x % 0 = x` and `x - (x / d) * d == x % d`.
pub fn trunc_rem(dividend: i64, divisor: i64) -> Option<i64> {
    if divisor == 0 {
        return Some(dividend);
    }
    // i64::MIN % -1 is 0 mathematically; only the hardware op overflows.
    Some(dividend.wrapping_rem(divisor))
}

/// Integer-valued expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArithExpr {
    NumLit(i64),
    Var(Name),
    Binary {
        op: ArithOp,
        left: Box<ArithExpr>,
        right: Box<ArithExpr>,
    },
}

impl ArithExpr {
    pub fn binary(op: ArithOp, left: ArithExpr, right: ArithExpr) -> Self {
        ArithExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary minus in normal form: `-e` is `-1 * e`.
    pub fn negate(expr: ArithExpr) -> Self {
        ArithExpr::binary(ArithOp::Mult, ArithExpr::NumLit(-1), expr)
    }

    fn as_negation(&self) -> Option<&ArithExpr> {
        match self {
            ArithExpr::Binary {
                op: ArithOp::Mult,
                left,
                right,
            } if **left == ArithExpr::NumLit(-1) => Some(right),
            _ => None,
        }
    }

    /// Replaces every occurrence of the variable `var` with `replacement`.
    pub fn subst(&self, var: &Name, replacement: &ArithExpr) -> ArithExpr {
        match self {
            ArithExpr::NumLit(_) => self.clone(),
            ArithExpr::Var(name) if name == var => replacement.clone(),
            ArithExpr::Var(_) => self.clone(),
            ArithExpr::Binary { op, left, right } => ArithExpr::binary(
                *op,
                left.subst(var, replacement),
                right.subst(var, replacement),
            ),
        }
    }

    pub fn free_vars(&self) -> BTreeSet<Name> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    pub(crate) fn collect_vars(&self, out: &mut BTreeSet<Name>) {
        match self {
            ArithExpr::NumLit(_) => {}
            ArithExpr::Var(name) => {
                out.insert(name.clone());
            }
            ArithExpr::Binary { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
        }
    }

    /// Evaluates under `env`. Returns `None` when an intermediate result overflows.
    pub fn eval(&self, env: &dyn Fn(&Name) -> i64) -> Option<i64> {
        match self {
            ArithExpr::NumLit(n) => Some(*n),
            ArithExpr::Var(name) => Some(env(name)),
            ArithExpr::Binary { op, left, right } => {
                let l = left.eval(env)?;
                let r = right.eval(env)?;
                op.apply(l, r)
            }
        }
    }
}

impl fmt::Display for ArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(inner) = self.as_negation() {
            return write!(f, "-{inner}");
        }
        match self {
            ArithExpr::NumLit(n) => write!(f, "{n}"),
            ArithExpr::Var(name) => write!(f, "{name}"),
            ArithExpr::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}
