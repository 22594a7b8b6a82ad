#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::collections::BTreeMap;

use async_trait::async_trait;
use imp_ast::{ArithExpr, Formula, Name};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("verification error: {message}")]
#[diagnostic(code(imp::verify))]
#[allow(unused_assignments)]
pub struct VerifyError {
    pub message: String,
}

impl VerifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Integer assignment returned with a satisfiable answer.
///
/// Variables the solver did not mention evaluate to 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    values: BTreeMap<Name, i64>,
}

impl Model {
    pub fn new(values: BTreeMap<Name, i64>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &Name) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn value_of(&self, name: &Name) -> i64 {
        self.get(name).unwrap_or(0)
    }

    /// Evaluates `expr` with truncating division; `None` on `i64` overflow.
    pub fn eval(&self, expr: &ArithExpr) -> Option<i64> {
        expr.eval(&|name| self.value_of(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, i64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Name, i64)> for Model {
    fn from_iter<I: IntoIterator<Item = (Name, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of a satisfiability check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverOutcome {
    Unsat,
    Sat(Model),
    /// The solver gave up (timeout, incompleteness); carries its reason.
    Unknown(String),
}

/// Satisfiability service for quantifier-free integer formulas.
///
/// Checks are awaited one at a time; implementations need not be `Send`.
#[async_trait(?Send)]
pub trait Solver {
    /// Decides `formula`. A `Sat` model assigns every program variable of `formula`.
    async fn check_sat(&mut self, formula: &Formula) -> Result<SolverOutcome, VerifyError>;
}

#[async_trait(?Send)]
impl<S: Solver + ?Sized> Solver for Box<S> {
    async fn check_sat(&mut self, formula: &Formula) -> Result<SolverOutcome, VerifyError> {
        (**self).check_sat(formula).await
    }
}

/// Fallback solver when compiled without `--features imp-verify/z3`.
///
/// This keeps the workspace buildable on machines without Z3.
pub struct NoZ3Solver;

#[async_trait(?Send)]
impl Solver for NoZ3Solver {
    async fn check_sat(&mut self, _formula: &Formula) -> Result<SolverOutcome, VerifyError> {
        Err(VerifyError::new(
            "Z3 solver is not enabled. Rebuild with `--features imp-verify/z3`.",
        ))
    }
}

#[cfg(feature = "z3")]
pub mod z3_solver {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use imp_ast::{ArithExpr, ArithOp, CmpOp, Formula, LogicOp, Name};
    use z3::{
        ast::{Ast, Bool, Int},
        Config, Context, FuncDecl, Params, SatResult, Sort,
    };

    use super::{Model, Solver, SolverOutcome, VerifyError};

    pub struct Z3Solver {
        ctx: &'static Context,
        timeout_ms: Option<u32>,
    }

    impl Z3Solver {
        pub fn new() -> Self {
            let mut cfg = Config::new();
            cfg.set_model_generation(true);
            // Leaked so encoded terms can borrow it for `'static` without a
            // self-referential struct. One context per process.
            let ctx: &'static Context = Box::leak(Box::new(Context::new(&cfg)));
            Self {
                ctx,
                timeout_ms: None,
            }
        }

        pub fn with_timeout_ms(mut self, timeout_ms: Option<u32>) -> Self {
            self.timeout_ms = timeout_ms;
            self
        }
    }

    impl Default for Z3Solver {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Translates formulas to Z3 terms, remembering the constants it declares.
    struct Encoder<'ctx> {
        ctx: &'ctx Context,
        vars: BTreeMap<Name, Int<'ctx>>,
        predicates: BTreeMap<(Name, usize), FuncDecl<'ctx>>,
    }

    impl<'ctx> Encoder<'ctx> {
        fn new(ctx: &'ctx Context) -> Self {
            Self {
                ctx,
                vars: BTreeMap::new(),
                predicates: BTreeMap::new(),
            }
        }

        fn int(&mut self, expr: &ArithExpr) -> Int<'ctx> {
            match expr {
                ArithExpr::NumLit(n) => Int::from_i64(self.ctx, *n),
                ArithExpr::Var(name) => {
                    let ctx = self.ctx;
                    self.vars
                        .entry(name.clone())
                        .or_insert_with(|| Int::new_const(ctx, name.as_str()))
                        .clone()
                }
                ArithExpr::Binary { op, left, right } => {
                    let l = self.int(left);
                    let r = self.int(right);
                    match op {
                        ArithOp::Plus => Int::add(self.ctx, &[&l, &r]),
                        ArithOp::Minus => Int::sub(self.ctx, &[&l, &r]),
                        ArithOp::Mult => Int::mul(self.ctx, &[&l, &r]),
                        ArithOp::Divide => self.trunc_div(&l, &r),
                        ArithOp::Modulo => self.trunc_rem(&l, &r),
                    }
                }
            }
        }

        // SMT-LIB `div` is Euclidean; adjust toward zero and make x / 0 = 0.
        fn trunc_div(&self, dividend: &Int<'ctx>, divisor: &Int<'ctx>) -> Int<'ctx> {
            let zero = Int::from_i64(self.ctx, 0);
            let one = Int::from_i64(self.ctx, 1);
            let euclid = dividend.div(divisor);
            let exact_or_nonneg = Bool::or(
                self.ctx,
                &[&dividend.modulo(divisor)._eq(&zero), &dividend.ge(&zero)],
            );
            let adjusted = divisor.ge(&zero).ite(
                &Int::add(self.ctx, &[&euclid, &one]),
                &Int::sub(self.ctx, &[&euclid, &one]),
            );
            divisor
                ._eq(&zero)
                .ite(&zero, &exact_or_nonneg.ite(&euclid, &adjusted))
        }

        fn trunc_rem(&self, dividend: &Int<'ctx>, divisor: &Int<'ctx>) -> Int<'ctx> {
            let zero = Int::from_i64(self.ctx, 0);
            let quotient = self.trunc_div(dividend, divisor);
            let rem = Int::sub(self.ctx, &[dividend, &Int::mul(self.ctx, &[&quotient, divisor])]);
            divisor._eq(&zero).ite(dividend, &rem)
        }

        fn boolean(&mut self, formula: &Formula) -> Result<Bool<'ctx>, VerifyError> {
            Ok(match formula {
                Formula::BoolLit(b) => Bool::from_bool(self.ctx, *b),
                Formula::PredicateApp { name, args } => {
                    let encoded: Vec<Int<'ctx>> = args.iter().map(|a| self.int(a)).collect();
                    let ctx = self.ctx;
                    let decl = self
                        .predicates
                        .entry((name.clone(), args.len()))
                        .or_insert_with(|| {
                            let int_sort = Sort::int(ctx);
                            let domain: Vec<&Sort> = args.iter().map(|_| &int_sort).collect();
                            FuncDecl::new(ctx, name.as_str(), &domain, &Sort::bool(ctx))
                        });
                    let refs: Vec<&dyn Ast<'ctx>> =
                        encoded.iter().map(|i| i as &dyn Ast<'ctx>).collect();
                    decl.apply(&refs).as_bool().ok_or_else(|| {
                        VerifyError::new(format!("predicate `{name}` did not produce a Bool term"))
                    })?
                }
                Formula::Not(inner) => self.boolean(inner)?.not(),
                Formula::Connective { op, left, right } => {
                    let l = self.boolean(left)?;
                    let r = self.boolean(right)?;
                    match op {
                        LogicOp::And => Bool::and(self.ctx, &[&l, &r]),
                        LogicOp::Or => Bool::or(self.ctx, &[&l, &r]),
                        LogicOp::Implies => l.implies(&r),
                    }
                }
                Formula::Compare { op, left, right } => {
                    let l = self.int(left);
                    let r = self.int(right);
                    match op {
                        CmpOp::Eq => l._eq(&r),
                        CmpOp::Neq => l._eq(&r).not(),
                        CmpOp::Lt => l.lt(&r),
                        CmpOp::Lte => l.le(&r),
                        CmpOp::Gt => l.gt(&r),
                        CmpOp::Gte => l.ge(&r),
                    }
                }
            })
        }
    }

    #[async_trait(?Send)]
    impl Solver for Z3Solver {
        async fn check_sat(&mut self, formula: &Formula) -> Result<SolverOutcome, VerifyError> {
            let mut encoder = Encoder::new(self.ctx);
            let encoded = encoder.boolean(formula)?;

            let solver = z3::Solver::new(self.ctx);
            if let Some(timeout_ms) = self.timeout_ms {
                let mut params = Params::new(self.ctx);
                params.set_u32("timeout", timeout_ms);
                solver.set_params(&params);
            }
            solver.assert(&encoded);

            match solver.check() {
                SatResult::Unsat => Ok(SolverOutcome::Unsat),
                SatResult::Sat => {
                    let model = solver
                        .get_model()
                        .ok_or_else(|| VerifyError::new("Z3 answered sat without a model"))?;
                    let mut values = BTreeMap::new();
                    for (name, var) in &encoder.vars {
                        // Counterexamples are replayed with i64 arithmetic.
                        let Some(value) = model.eval(var, true).and_then(|v| v.as_i64()) else {
                            tracing::debug!(%name, "model value out of range");
                            return Ok(SolverOutcome::Unknown(format!(
                                "the counterexample value of `{name}` does not fit in 64 bits"
                            )));
                        };
                        values.insert(name.clone(), value);
                    }
                    Ok(SolverOutcome::Sat(Model::new(values)))
                }
                SatResult::Unknown => Ok(SolverOutcome::Unknown(
                    solver
                        .get_reason_unknown()
                        .unwrap_or_else(|| "unknown".to_string()),
                )),
            }
        }
    }
}
