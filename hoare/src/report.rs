#![forbid(unsafe_code)]

use std::fmt::Write as _;

use hl_proof::{HoleState, ProofArena, ProofNode, StopReason, SubmissionReport, TripleRef};
use imp_verify::FeedbackOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub schema: &'static str,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub ok: bool,
    pub submission: SubmissionReport,
    pub nodes: serde_json::Value,
}

impl CheckReport {
    pub fn new(
        input: String,
        title: Option<String>,
        arena: &ProofArena,
        submission: SubmissionReport,
    ) -> Self {
        Self {
            schema: "hoare.check.v1",
            input,
            title,
            ok: submission.is_correct(),
            submission,
            nodes: arena.to_json(),
        }
    }
}

fn step_range(triple: TripleRef) -> String {
    format!("{}-{}", triple.pre.index() + 1, triple.post.index() + 1)
}

pub fn summary(report: &SubmissionReport) -> String {
    match report.stopped {
        StopReason::Completed => format!("All {} triple(s) are correct.", report.checked.len()),
        StopReason::IncompleteTriple(t) => format!(
            "Stopped at steps {}: an assertion there is missing or does not parse.",
            step_range(t)
        ),
        StopReason::Incorrect(t) => format!("Steps {} do not form a valid triple.", step_range(t)),
    }
}

/// Human-readable listing of every step with its feedback indented beneath it.
pub fn render_text(title: Option<&str>, arena: &ProofArena, report: &SubmissionReport) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        let _ = writeln!(out, "{title}\n");
    }
    for (id, node) in arena.iter() {
        let marker = match node.feedback().map(|f| f.outcome) {
            Some(FeedbackOutcome::Correct) => "✓",
            Some(FeedbackOutcome::Incorrect) => "✗",
            Some(FeedbackOutcome::Empty) | None => " ",
        };
        let suffix = match node {
            ProofNode::Hole(h) if h.state() != HoleState::Prevalidated => {
                format!("  ({})", state_label(h.state()))
            }
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{marker} {:>3}  {:<9} {}{suffix}",
            id.index() + 1,
            node.kind(),
            node.display_text()
        );
        if let Some(message) = node.feedback().and_then(|f| f.message.as_deref()) {
            for line in message.lines() {
                let _ = writeln!(out, "          | {line}");
            }
        }
    }
    let _ = writeln!(out, "\n{}", summary(report));
    out
}

fn state_label(state: HoleState) -> &'static str {
    match state {
        HoleState::Unvalidated => "not checked",
        HoleState::Prevalidating => "checking",
        HoleState::Prevalidated => "parsed",
        HoleState::PrevalidationFailed => "parse error",
    }
}
