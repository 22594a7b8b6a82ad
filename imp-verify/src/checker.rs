#![forbid(unsafe_code)]

use async_trait::async_trait;
use imp_ast::HoareTriple;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::feedback::{Feedback, SAY_INCORRECT, synthesize};
use crate::solver::{Solver, VerifyError};
use crate::verify::check_hoare_triple;

/// Decides a single triple and phrases the result as feedback.
#[async_trait(?Send)]
pub trait TripleChecker {
    async fn check(&mut self, triple: &HoareTriple) -> Result<Feedback, VerifyError>;
}

#[async_trait(?Send)]
impl<C: TripleChecker + ?Sized> TripleChecker for Box<C> {
    async fn check(&mut self, triple: &HoareTriple) -> Result<Feedback, VerifyError> {
        (**self).check(triple).await
    }
}

pub struct HoareTripleChecker<S> {
    solver: S,
}

impl<S: Solver> HoareTripleChecker<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

#[async_trait(?Send)]
impl<S: Solver> TripleChecker for HoareTripleChecker<S> {
    async fn check(&mut self, triple: &HoareTriple) -> Result<Feedback, VerifyError> {
        let verdict = check_hoare_triple(&mut self.solver, triple).await?;
        Ok(synthesize(triple, &verdict))
    }
}

pub fn false_precondition_message() -> String {
    format!(
        "{SAY_INCORRECT}\n\nIt's true that you can prove any postcondition from {{ false }}.\n \
         But we aren't allowing it as a precondition here, because we want you to practice \
         applying the rules mechanically"
    )
}

/// Rejects triples whose precondition is literally `{ false }` before asking `inner`.
pub struct NoFalsePreconditionChecker<C> {
    inner: C,
}

impl<C: TripleChecker> NoFalsePreconditionChecker<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait(?Send)]
impl<C: TripleChecker> TripleChecker for NoFalsePreconditionChecker<C> {
    async fn check(&mut self, triple: &HoareTriple) -> Result<Feedback, VerifyError> {
        if triple.pre.to_string() == "{ false }" {
            info!(triple = %triple, "rejected false precondition");
            return Ok(Feedback::incorrect(false_precondition_message()));
        }
        self.inner.check(triple).await
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub reject_false_precondition: bool,
    pub solver_timeout_ms: Option<u64>,
}

impl CheckerConfig {
    /// Timeout in the width Z3 accepts; saturates.
    pub fn solver_timeout_u32(&self) -> Option<u32> {
        self.solver_timeout_ms
            .map(|ms| u32::try_from(ms).unwrap_or(u32::MAX))
    }
}

/// Assembles the checker stack described by `config` around `solver`.
pub fn build_checker<S: Solver + 'static>(
    config: &CheckerConfig,
    solver: S,
) -> Box<dyn TripleChecker> {
    let checker = HoareTripleChecker::new(solver);
    if config.reject_false_precondition {
        Box::new(NoFalsePreconditionChecker::new(checker))
    } else {
        Box::new(checker)
    }
}
