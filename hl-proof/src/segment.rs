#![forbid(unsafe_code)]

use std::fmt;

use serde::Serialize;

use crate::arena::{NodeId, ProofArena};

const TRIPLE_WIDTH: usize = 3;

/// Three arena nodes forming `{pre} command {post}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TripleRef {
    pub pre: NodeId,
    pub command: NodeId,
    pub post: NodeId,
}

impl TripleRef {
    /// Nodes in pre, command, post order.
    pub fn nodes(self) -> [NodeId; 3] {
        [self.pre, self.command, self.post]
    }
}

impl fmt::Display for TripleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.pre, self.command, self.post)
    }
}

/// Slides a three-wide window over the core steps in `steps` and keeps every
/// window shaped assertion, command, assertion. Windows overlap, so a middle
/// assertion is the post of one triple and the pre of the next.
pub fn segment(arena: &ProofArena, steps: &[NodeId]) -> Vec<TripleRef> {
    let core: Vec<NodeId> = steps
        .iter()
        .copied()
        .filter(|id| arena.get(*id).is_some_and(|n| n.is_core()))
        .collect();

    core.windows(TRIPLE_WIDTH)
        .filter_map(|window| {
            let [pre, command, post] = [window[0], window[1], window[2]];
            let bears = |id: NodeId| arena.get(id).is_some_and(|n| n.is_assertion_bearing());
            let is_command = arena.get(command).is_some_and(|n| n.is_command());
            (bears(pre) && is_command && bears(post)).then_some(TripleRef { pre, command, post })
        })
        .collect()
}
