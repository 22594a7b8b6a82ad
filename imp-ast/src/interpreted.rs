#![forbid(unsafe_code)]

use crate::{ArithExpr, ArithOp, CmpOp, Formula};

/// A predicate symbol with a fixed meaning, expanded away before checking.
pub struct InterpretedFunction {
    pub name: &'static str,
    pub arity: usize,
    expand: fn(&[ArithExpr]) -> Formula,
}

impl InterpretedFunction {
    /// Expansion for `args`, or `None` when the argument count does not match the arity.
    pub fn expand(&self, args: &[ArithExpr]) -> Option<Formula> {
        (args.len() == self.arity).then(|| (self.expand)(args))
    }
}

impl std::fmt::Debug for InterpretedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpretedFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

fn remainder_mod_two_is(args: &[ArithExpr], rem: i64) -> Formula {
    Formula::compare(
        CmpOp::Eq,
        ArithExpr::binary(ArithOp::Modulo, args[0].clone(), ArithExpr::NumLit(2)),
        ArithExpr::NumLit(rem),
    )
}

pub static INTERPRETED_FUNCTIONS: &[InterpretedFunction] = &[
    InterpretedFunction {
        name: "even",
        arity: 1,
        expand: |args| remainder_mod_two_is(args, 0),
    },
    InterpretedFunction {
        name: "odd",
        arity: 1,
        expand: |args| remainder_mod_two_is(args, 1),
    },
];

pub fn interpreted_function(name: &str) -> Option<&'static InterpretedFunction> {
    INTERPRETED_FUNCTIONS.iter().find(|f| f.name == name)
}
