#![forbid(unsafe_code)]

use imp_ast::{Command, Formula, HoareTriple};
use tracing::{debug, warn};

use crate::smtlib::script_to_smtlib;
use crate::solver::{Model, Solver, SolverOutcome, VerifyError};

/// Backward substitution through `command`.
pub fn weakest_precondition(command: &Command, post: &Formula) -> Formula {
    match command {
        Command::Assign { var, rhs } => post.subst(var, rhs),
        Command::Skip => post.clone(),
        Command::Sequence(seq) => seq
            .commands()
            .iter()
            .rev()
            .fold(post.clone(), |acc, cmd| weakest_precondition(cmd, &acc)),
    }
}

/// The implication `pre => wp(command, post)` whose validity decides the triple.
pub fn validity_query(triple: &HoareTriple) -> Formula {
    Formula::implies(
        triple.pre.formula().clone(),
        weakest_precondition(triple.command.command(), triple.post.formula()),
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TripleVerdict {
    Valid,
    /// `counterexample` is absent when the solver could not decide; `reason` then says why.
    Invalid {
        counterexample: Option<Model>,
        reason: Option<String>,
    },
}

impl TripleVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, TripleVerdict::Valid)
    }
}

/// Asks `solver` whether the negated validity query is satisfiable.
pub async fn check_hoare_triple<S: Solver + ?Sized>(
    solver: &mut S,
    triple: &HoareTriple,
) -> Result<TripleVerdict, VerifyError> {
    let negated = Formula::not(validity_query(triple));
    debug!(triple = %triple, query = %script_to_smtlib(&negated), "checking triple");

    let verdict = match solver.check_sat(&negated).await? {
        SolverOutcome::Unsat => TripleVerdict::Valid,
        SolverOutcome::Sat(model) => TripleVerdict::Invalid {
            counterexample: Some(model),
            reason: None,
        },
        SolverOutcome::Unknown(reason) => {
            warn!(triple = %triple, %reason, "solver returned unknown");
            TripleVerdict::Invalid {
                counterexample: None,
                reason: Some(reason),
            }
        }
    };
    debug!(valid = verdict.is_valid(), "triple verdict");
    Ok(verdict)
}
