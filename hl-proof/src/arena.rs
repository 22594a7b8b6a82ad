#![forbid(unsafe_code)]

use std::fmt;
use std::rc::Rc;

use imp_ast::{Assertion, CommandDecl};
use imp_verify::Feedback;
use serde::Serialize;
use serde_json::json;

use crate::prevalidate::HoleState;
use crate::step::{Hole, ProofStep};

/// Stable handle to a node; nodes are never removed from their arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

#[derive(Clone, Debug)]
pub struct HoleNode {
    pub hole: Hole,
    attempt: String,
    state: HoleState,
    feedback: Feedback,
    must_address: bool,
    // The current feedback is a parse error from prevalidation.
    parse_feedback: bool,
}

impl HoleNode {
    fn new(hole: Hole) -> Self {
        Self {
            hole,
            attempt: String::new(),
            state: HoleState::Unvalidated,
            feedback: Feedback::empty(),
            must_address: false,
            parse_feedback: false,
        }
    }

    pub fn attempt(&self) -> &str {
        &self.attempt
    }

    pub fn state(&self) -> HoleState {
        self.state
    }

    pub fn must_address(&self) -> bool {
        self.must_address
    }
}

#[derive(Clone, Debug)]
pub enum ProofNode {
    Given {
        assertion: Assertion,
        feedback: Feedback,
    },
    Hole(HoleNode),
    Command {
        command: CommandDecl,
        feedback: Feedback,
    },
    Remark {
        body: String,
    },
}

impl ProofNode {
    fn from_step(step: ProofStep) -> Self {
        match step {
            ProofStep::Assertion(assertion) => ProofNode::Given {
                assertion,
                feedback: Feedback::empty(),
            },
            ProofStep::Hole(hole) => ProofNode::Hole(HoleNode::new(hole)),
            ProofStep::Command(command) => ProofNode::Command {
                command,
                feedback: Feedback::empty(),
            },
            ProofStep::Remark(remark) => ProofNode::Remark {
                body: remark.body().to_string(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProofNode::Given { .. } => "assertion",
            ProofNode::Hole(_) => "hole",
            ProofNode::Command { .. } => "command",
            ProofNode::Remark { .. } => "remark",
        }
    }

    /// Steps that take part in triples; remarks are display-only.
    pub fn is_core(&self) -> bool {
        !matches!(self, ProofNode::Remark { .. })
    }

    pub fn is_assertion_bearing(&self) -> bool {
        matches!(self, ProofNode::Given { .. } | ProofNode::Hole(_))
    }

    pub fn is_command(&self) -> bool {
        matches!(self, ProofNode::Command { .. })
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, ProofNode::Hole(_))
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            ProofNode::Given { feedback, .. } | ProofNode::Command { feedback, .. } => Some(feedback),
            ProofNode::Hole(h) => Some(&h.feedback),
            ProofNode::Remark { .. } => None,
        }
    }

    /// What the node shows: original source text, or the attempt (prompt when blank) for holes.
    pub fn display_text(&self) -> &str {
        match self {
            ProofNode::Given { assertion, .. } => assertion.source(),
            ProofNode::Command { command, .. } => command.source(),
            ProofNode::Hole(h) if h.attempt.is_empty() => h.hole.placeholder_prompt(),
            ProofNode::Hole(h) => &h.attempt,
            ProofNode::Remark { body } => body,
        }
    }
}

type Callback = Rc<dyn Fn(&mut ProofArena, NodeId)>;

/// Owns proof nodes and notifies subscribers after every mutation.
#[derive(Default)]
pub struct ProofArena {
    nodes: Vec<ProofNode>,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: usize,
}

impl fmt::Debug for ProofArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofArena")
            .field("nodes", &self.nodes)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ProofArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: ProofStep) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ProofNode::from_step(step));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&ProofNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ProofNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn feedback(&self, id: NodeId) -> Option<&Feedback> {
        self.get(id).and_then(ProofNode::feedback)
    }

    fn hole(&self, id: NodeId) -> Option<&HoleNode> {
        match self.get(id)? {
            ProofNode::Hole(h) => Some(h),
            _ => None,
        }
    }

    fn hole_mut(&mut self, id: NodeId) -> Option<&mut HoleNode> {
        match self.nodes.get_mut(id.0)? {
            ProofNode::Hole(h) => Some(h),
            _ => None,
        }
    }

    pub fn attempt(&self, id: NodeId) -> Option<&str> {
        self.hole(id).map(HoleNode::attempt)
    }

    pub fn hole_state(&self, id: NodeId) -> Option<HoleState> {
        self.hole(id).map(HoleNode::state)
    }

    pub fn must_address(&self, id: NodeId) -> bool {
        self.hole(id).is_some_and(HoleNode::must_address)
    }

    /// Replaces a node's feedback. Remarks carry none and are left alone.
    pub fn set_feedback(&mut self, id: NodeId, feedback: Feedback) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        match node {
            ProofNode::Given { feedback: slot, .. } | ProofNode::Command { feedback: slot, .. } => {
                *slot = feedback;
            }
            ProofNode::Hole(h) => {
                h.must_address = feedback.should_be_addressed();
                h.feedback = feedback;
                h.parse_feedback = false;
            }
            ProofNode::Remark { .. } => return,
        }
        self.publish(id);
    }

    pub(crate) fn set_parse_feedback(&mut self, id: NodeId, feedback: Feedback) {
        self.set_feedback(id, feedback);
        if let Some(h) = self.hole_mut(id) {
            h.parse_feedback = true;
        }
    }

    pub(crate) fn has_parse_feedback(&self, id: NodeId) -> bool {
        self.hole(id).is_some_and(|h| h.parse_feedback)
    }

    /// Records a new student attempt; the hole must be prevalidated again.
    /// Returns `false` when `id` is not a hole.
    pub fn set_attempt(&mut self, id: NodeId, attempt: impl Into<String>) -> bool {
        let Some(h) = self.hole_mut(id) else {
            return false;
        };
        h.attempt = attempt.into();
        h.state = HoleState::Unvalidated;
        self.publish(id);
        true
    }

    pub(crate) fn set_hole_state(&mut self, id: NodeId, state: HoleState) {
        if let Some(h) = self.hole_mut(id) {
            h.state = state;
            self.publish(id);
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&mut ProofArena, NodeId) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Notifies subscribers that `id` changed.
    ///
    /// Dispatch runs over a snapshot; a subscriber removed by an earlier
    /// callback in the same dispatch is skipped.
    pub fn publish(&mut self, id: NodeId) {
        let snapshot = self.subscribers.clone();
        for (sid, callback) in snapshot {
            if self.subscribers.iter().any(|(live, _)| *live == sid) {
                callback(self, id);
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .iter()
            .map(|(id, node)| {
                let mut entry = json!({
                    "id": id,
                    "kind": node.kind(),
                    "text": node.display_text(),
                });
                if let Some(feedback) = node.feedback() {
                    entry["feedback"] = json!(feedback);
                }
                if let ProofNode::Hole(h) = node {
                    entry["state"] = json!(h.state);
                }
                entry
            })
            .collect();
        serde_json::Value::Array(nodes)
    }
}
