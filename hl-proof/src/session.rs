#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use imp_ast::{Assertion, HoareTriple};
use imp_parse::parse_to_assertion;
use imp_verify::{CheckerConfig, Feedback, TripleChecker, VerifyError};
use serde::Serialize;
use tracing::{debug, info};

use crate::arena::{NodeId, ProofArena, ProofNode, SubscriptionId};
use crate::prevalidate::{HoleState, Prevalidator};
use crate::segment::{TripleRef, segment};
use crate::step::ProofStep;

/// An exercise as authored: ordered proof steps plus checker settings.
#[derive(Clone, Debug, Default)]
pub struct HlProofExercise {
    steps: Vec<ProofStep>,
    config: CheckerConfig,
}

impl HlProofExercise {
    pub fn new(steps: Vec<ProofStep>, config: CheckerConfig) -> Self {
        Self { steps, config }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&ProofStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Instantiates the steps into a fresh arena, returning their ids in order.
    pub fn instantiate(&self) -> (ProofArena, Vec<NodeId>) {
        let mut arena = ProofArena::new();
        let ids = self.steps.iter().cloned().map(|s| arena.push(s)).collect();
        (arena, ids)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "triple", rename_all = "snake_case")]
pub enum StopReason {
    /// Every triple was checked and found correct.
    Completed,
    /// An endpoint assertion is not available yet, e.g. a hole that has not been prevalidated.
    IncompleteTriple(TripleRef),
    Incorrect(TripleRef),
}

/// What one submission pass did; `checked` is in checking (last-to-first) order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    pub checked: Vec<TripleRef>,
    pub stopped: StopReason,
}

impl SubmissionReport {
    pub fn is_correct(&self) -> bool {
        self.stopped == StopReason::Completed
    }
}

/// A student's working copy of an exercise, wired to a triple checker.
pub struct ProofSession<C> {
    arena: ProofArena,
    steps: Vec<NodeId>,
    checker: C,
    // Clearing listeners currently registered for each triple.
    listeners: HashMap<TripleRef, Vec<SubscriptionId>>,
}

impl<C: TripleChecker> ProofSession<C> {
    pub fn new(steps: Vec<ProofStep>, checker: C) -> Self {
        Self::from_exercise(&HlProofExercise::new(steps, CheckerConfig::default()), checker)
    }

    pub fn from_exercise(exercise: &HlProofExercise, checker: C) -> Self {
        let (arena, steps) = exercise.instantiate();
        Self {
            arena,
            steps,
            checker,
            listeners: HashMap::new(),
        }
    }

    pub fn arena(&self) -> &ProofArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ProofArena {
        &mut self.arena
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    /// Node ids in step order.
    pub fn steps(&self) -> &[NodeId] {
        &self.steps
    }

    pub fn holes(&self) -> Vec<NodeId> {
        self.steps
            .iter()
            .copied()
            .filter(|id| self.arena.get(*id).is_some_and(ProofNode::is_hole))
            .collect()
    }

    pub fn triples(&self) -> Vec<TripleRef> {
        segment(&self.arena, &self.steps)
    }

    pub fn set_attempt(&mut self, hole: NodeId, attempt: impl Into<String>) -> bool {
        self.arena.set_attempt(hole, attempt)
    }

    /// Parses the hole's attempt and records the outcome on the hole.
    /// Returns `None` when `hole` is not a hole.
    pub async fn prevalidate_hole(&mut self, hole: NodeId) -> Option<Feedback> {
        let (attempt, prevalidator) = match self.arena.get(hole)? {
            ProofNode::Hole(h) => (h.attempt().to_string(), h.hole.prevalidator()),
            _ => return None,
        };
        self.arena.set_hole_state(hole, HoleState::Prevalidating);
        let feedback = prevalidator.prevalidate(&attempt).await;

        if feedback.is_empty() {
            self.arena.set_hole_state(hole, HoleState::Prevalidated);
            // Clear an earlier parse error, but keep checker feedback the
            // student has not acted on yet.
            if self.arena.has_parse_feedback(hole) {
                self.arena.set_feedback(hole, Feedback::empty());
            }
        } else {
            self.arena.set_hole_state(hole, HoleState::PrevalidationFailed);
            self.arena.set_parse_feedback(hole, feedback.clone());
        }
        debug!(%hole, state = ?self.arena.hole_state(hole), "prevalidated hole");
        Some(feedback)
    }

    pub fn can_submit(&self, hole: NodeId) -> bool {
        self.arena.hole_state(hole) == Some(HoleState::Prevalidated)
            && !self.arena.must_address(hole)
    }

    /// The parsed attempt, available only once the hole is prevalidated.
    pub fn hole_assertion(&self, hole: NodeId) -> Option<Assertion> {
        if self.arena.hole_state(hole)? != HoleState::Prevalidated {
            return None;
        }
        parse_to_assertion(self.arena.attempt(hole)?).ok()
    }

    fn assertion_of(&self, id: NodeId) -> Option<Assertion> {
        match self.arena.get(id)? {
            ProofNode::Given { assertion, .. } => Some(assertion.clone()),
            ProofNode::Hole(_) => self.hole_assertion(id),
            ProofNode::Command { .. } | ProofNode::Remark { .. } => None,
        }
    }

    /// The triple's current value; `None` while an endpoint is unavailable.
    pub fn hoare_triple(&self, triple: TripleRef) -> Option<HoareTriple> {
        let pre = self.assertion_of(triple.pre)?;
        let post = self.assertion_of(triple.post)?;
        let command = match self.arena.get(triple.command)? {
            ProofNode::Command { command, .. } => command.clone(),
            _ => return None,
        };
        Some(HoareTriple::new(pre, command, post))
    }

    /// Checks the triples from last to first, stopping at the first one that
    /// is incomplete or incorrect, and routes feedback onto their nodes.
    pub async fn submit(&mut self) -> Result<SubmissionReport, VerifyError> {
        let mut checked = Vec::new();
        for triple in self.triples().into_iter().rev() {
            let Some(ht) = self.hoare_triple(triple) else {
                info!(%triple, "stopping at incomplete triple");
                return Ok(SubmissionReport {
                    checked,
                    stopped: StopReason::IncompleteTriple(triple),
                });
            };

            let feedback = self.checker.check(&ht).await?;
            checked.push(triple);
            let correct = feedback.is_correct();
            info!(%triple, correct, "checked triple");
            self.route_feedback(triple, feedback);

            if !correct {
                return Ok(SubmissionReport {
                    checked,
                    stopped: StopReason::Incorrect(triple),
                });
            }
        }
        Ok(SubmissionReport {
            checked,
            stopped: StopReason::Completed,
        })
    }

    fn route_feedback(&mut self, triple: TripleRef, feedback: Feedback) {
        // A resubmission replaces whatever listeners the last verdict left behind.
        for sid in self.listeners.remove(&triple).unwrap_or_default() {
            self.arena.unsubscribe(sid);
        }

        if feedback.is_correct() {
            for id in triple.nodes() {
                self.arena.set_feedback(id, feedback.clone());
            }
            return;
        }

        clear_triple(&mut self.arena, triple);

        let holes: Vec<NodeId> = triple
            .nodes()
            .into_iter()
            .filter(|id| self.arena.get(*id).is_some_and(ProofNode::is_hole))
            .collect();
        // Without a hole to carry it, the message goes on the command.
        let target = holes.first().copied().unwrap_or(triple.command);
        for id in triple.nodes() {
            if id == target {
                self.arena.set_feedback(id, feedback.clone());
            } else {
                self.arena.set_feedback(id, Feedback::incorrect_style_only());
            }
        }

        self.clear_on_first_edit(triple, &holes);
    }

    // One listener per hole; whichever sees an edit first clears the triple
    // and cancels all of them.
    fn clear_on_first_edit(&mut self, triple: TripleRef, holes: &[NodeId]) {
        let fired = Rc::new(Cell::new(false));
        let subscriptions = Rc::new(RefCell::new(Vec::with_capacity(holes.len())));

        for &hole in holes {
            let before = self.arena.attempt(hole).unwrap_or_default().to_string();
            let fired = Rc::clone(&fired);
            let siblings = Rc::clone(&subscriptions);
            let id = self.arena.subscribe(move |arena: &mut ProofArena, changed: NodeId| {
                if changed != hole || fired.get() || arena.attempt(hole) == Some(before.as_str()) {
                    return;
                }
                fired.set(true);
                for sid in siblings.borrow().iter() {
                    arena.unsubscribe(*sid);
                }
                debug!(%triple, %hole, "attempt edited, clearing triple feedback");
                clear_triple(arena, triple);
            });
            subscriptions.borrow_mut().push(id);
        }
        if !holes.is_empty() {
            self.listeners.insert(triple, subscriptions.borrow().clone());
        }
    }
}

fn clear_triple(arena: &mut ProofArena, triple: TripleRef) {
    for id in triple.nodes() {
        arena.set_feedback(id, Feedback::empty());
    }
}
