#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use imp_ast::{ArithExpr, ArithOp, CmpOp, Formula, LogicOp, Name};

/// Print an arithmetic expression as an SMT-LIB2 term, spelling out
/// truncating division the same way the Z3 backend encodes it.
pub fn arith_to_smtlib(expr: &ArithExpr) -> String {
    match expr {
        ArithExpr::NumLit(n) => {
            if *n < 0 {
                format!("(- {})", n.unsigned_abs())
            } else {
                n.to_string()
            }
        }
        ArithExpr::Var(name) => name.to_string(),
        ArithExpr::Binary { op, left, right } => {
            let l = arith_to_smtlib(left);
            let r = arith_to_smtlib(right);
            match op {
                ArithOp::Plus => format!("(+ {l} {r})"),
                ArithOp::Minus => format!("(- {l} {r})"),
                ArithOp::Mult => format!("(* {l} {r})"),
                ArithOp::Divide => trunc_div(&l, &r),
                ArithOp::Modulo => {
                    format!("(ite (= {r} 0) {l} (- {l} (* {} {r})))", trunc_div(&l, &r))
                }
            }
        }
    }
}

fn trunc_div(l: &str, r: &str) -> String {
    format!(
        "(ite (= {r} 0) 0 (ite (or (= (mod {l} {r}) 0) (>= {l} 0)) (div {l} {r}) \
         (ite (>= {r} 0) (+ (div {l} {r}) 1) (- (div {l} {r}) 1))))"
    )
}

/// Print a formula as an SMT-LIB2 term.
pub fn to_smtlib(formula: &Formula) -> String {
    match formula {
        Formula::BoolLit(b) => b.to_string(),
        Formula::PredicateApp { name, args } => {
            if args.is_empty() {
                name.to_string()
            } else {
                let inner: Vec<String> = args.iter().map(arith_to_smtlib).collect();
                format!("({name} {})", inner.join(" "))
            }
        }
        Formula::Not(inner) => format!("(not {})", to_smtlib(inner)),
        Formula::Connective { op, left, right } => {
            let head = match op {
                LogicOp::And => "and",
                LogicOp::Or => "or",
                LogicOp::Implies => "=>",
            };
            format!("({head} {} {})", to_smtlib(left), to_smtlib(right))
        }
        Formula::Compare { op, left, right } => {
            let (l, r) = (arith_to_smtlib(left), arith_to_smtlib(right));
            match op {
                CmpOp::Eq => format!("(= {l} {r})"),
                CmpOp::Neq => format!("(not (= {l} {r}))"),
                CmpOp::Lt => format!("(< {l} {r})"),
                CmpOp::Lte => format!("(<= {l} {r})"),
                CmpOp::Gt => format!("(> {l} {r})"),
                CmpOp::Gte => format!("(>= {l} {r})"),
            }
        }
    }
}

/// A complete script asserting `formula`: declarations, the assertion and `(check-sat)`.
pub fn script_to_smtlib(formula: &Formula) -> String {
    let mut out = String::new();
    for var in formula.free_vars() {
        out.push_str(&format!("(declare-const {var} Int)\n"));
    }
    for (name, arity) in predicate_symbols(formula) {
        let domain = vec!["Int"; arity].join(" ");
        out.push_str(&format!("(declare-fun {name} ({domain}) Bool)\n"));
    }
    out.push_str(&format!("(assert {})\n(check-sat)\n", to_smtlib(formula)));
    out
}

fn predicate_symbols(formula: &Formula) -> BTreeSet<(Name, usize)> {
    fn walk(f: &Formula, out: &mut BTreeSet<(Name, usize)>) {
        match f {
            Formula::PredicateApp { name, args } => {
                out.insert((name.clone(), args.len()));
            }
            Formula::Not(inner) => walk(inner, out),
            Formula::Connective { left, right, .. } => {
                walk(left, out);
                walk(right, out);
            }
            Formula::BoolLit(_) | Formula::Compare { .. } => {}
        }
    }
    let mut out = BTreeSet::new();
    walk(formula, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(n: &str) -> ArithExpr {
        ArithExpr::Var(Name::new(n).unwrap())
    }

    #[test]
    fn prints_comparisons_and_connectives() {
        let f = Formula::implies(
            Formula::compare(CmpOp::Gt, var("b"), ArithExpr::NumLit(0)),
            Formula::not(Formula::compare(CmpOp::Neq, var("a"), ArithExpr::NumLit(-3))),
        );
        assert_eq!(to_smtlib(&f), "(=> (> b 0) (not (not (= a (- 3)))))");
    }

    #[test]
    fn prints_truncating_division() {
        let e = ArithExpr::binary(ArithOp::Divide, var("m"), var("d"));
        let printed = arith_to_smtlib(&e);
        assert!(printed.starts_with("(ite (= d 0) 0 "), "unexpected: {printed}");
        assert!(printed.contains("(+ (div m d) 1)"));
    }

    #[test]
    fn script_declares_symbols() {
        let f = Formula::and(
            Formula::PredicateApp {
                name: Name::new("p").unwrap(),
                args: vec![var("x"), ArithExpr::NumLit(1)],
            },
            Formula::compare(CmpOp::Eq, var("y"), var("x")),
        );
        let script = script_to_smtlib(&f);
        assert_eq!(
            script,
            "(declare-const x Int)\n(declare-const y Int)\n(declare-fun p (Int Int) Bool)\n\
             (assert (and (p x 1) (= y x)))\n(check-sat)\n"
        );
    }
}
