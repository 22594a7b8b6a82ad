#![forbid(unsafe_code)]

pub mod checker;
pub mod feedback;
pub mod smtlib;
pub mod solver;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod verify;

pub use checker::{
    CheckerConfig, HoareTripleChecker, NoFalsePreconditionChecker, TripleChecker, build_checker,
};
pub use feedback::{AttemptStyle, Feedback, FeedbackOutcome, ProgramState, SAY_CORRECT, SAY_INCORRECT, synthesize};
pub use solver::{Model, NoZ3Solver, Solver, SolverOutcome, VerifyError};
#[cfg(feature = "z3")]
pub use solver::z3_solver::Z3Solver;
pub use verify::{TripleVerdict, check_hoare_triple, validity_query, weakest_precondition};
