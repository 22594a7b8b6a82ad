#![forbid(unsafe_code)]

pub mod arena;
pub mod prevalidate;
pub mod segment;
pub mod session;
pub mod step;

pub use arena::{HoleNode, NodeId, ProofArena, ProofNode, SubscriptionId};
pub use prevalidate::{AssertionPrevalidator, HoleState, Prevalidator};
pub use segment::{TripleRef, segment};
pub use session::{HlProofExercise, ProofSession, StopReason, SubmissionReport};
pub use step::{DEFAULT_PLACEHOLDER_PROMPT, Hole, ProofStep, Remark};
