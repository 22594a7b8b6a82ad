#![forbid(unsafe_code)]

//! Solver and checker doubles for exercising the verification pipeline
//! without a Z3 installation.

use std::collections::VecDeque;

use async_trait::async_trait;
use imp_ast::{Formula, HoareTriple};

use crate::checker::TripleChecker;
use crate::feedback::Feedback;
use crate::solver::{Solver, SolverOutcome, VerifyError};

/// Answers queries from a fixed script and records what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedSolver {
    script: VecDeque<SolverOutcome>,
    queries: Vec<Formula>,
}

impl ScriptedSolver {
    pub fn new(script: impl IntoIterator<Item = SolverOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            queries: Vec::new(),
        }
    }

    pub fn queries(&self) -> &[Formula] {
        &self.queries
    }
}

#[async_trait(?Send)]
impl Solver for ScriptedSolver {
    async fn check_sat(&mut self, formula: &Formula) -> Result<SolverOutcome, VerifyError> {
        self.queries.push(formula.clone());
        self.script
            .pop_front()
            .ok_or_else(|| VerifyError::new("scripted solver has no answer left"))
    }
}

/// Returns scripted feedback per triple and records which triples it saw.
#[derive(Debug, Default)]
pub struct ScriptedChecker {
    script: VecDeque<Feedback>,
    seen: Vec<HoareTriple>,
}

impl ScriptedChecker {
    pub fn new(script: impl IntoIterator<Item = Feedback>) -> Self {
        Self {
            script: script.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    pub fn seen(&self) -> &[HoareTriple] {
        &self.seen
    }
}

#[async_trait(?Send)]
impl TripleChecker for ScriptedChecker {
    async fn check(&mut self, triple: &HoareTriple) -> Result<Feedback, VerifyError> {
        self.seen.push(triple.clone());
        self.script
            .pop_front()
            .ok_or_else(|| VerifyError::new("scripted checker has no answer left"))
    }
}
