#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use imp_ast::{Command, HoareTriple, Name};
use serde::Serialize;

use crate::solver::Model;
use crate::verify::TripleVerdict;

pub const SAY_CORRECT: &str = "✓ Correct!";
pub const SAY_INCORRECT: &str = "✗ Incorrect!";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Empty,
    Correct,
    Incorrect,
}

/// Styling marker applied to a student's attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptStyle {
    None,
    Incorrect,
}

/// Message attached to a proof node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub outcome: FeedbackOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self::empty()
    }
}

impl Feedback {
    pub fn empty() -> Self {
        Self {
            outcome: FeedbackOutcome::Empty,
            message: None,
        }
    }

    pub fn correct(message: impl Into<String>) -> Self {
        Self {
            outcome: FeedbackOutcome::Correct,
            message: Some(message.into()),
        }
    }

    pub fn incorrect(message: impl Into<String>) -> Self {
        Self {
            outcome: FeedbackOutcome::Incorrect,
            message: Some(message.into()),
        }
    }

    /// Marks a node as wrong without a message body.
    pub fn incorrect_style_only() -> Self {
        Self {
            outcome: FeedbackOutcome::Incorrect,
            message: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.outcome == FeedbackOutcome::Empty
    }

    pub fn is_correct(&self) -> bool {
        self.outcome == FeedbackOutcome::Correct
    }

    pub fn is_incorrect(&self) -> bool {
        self.outcome == FeedbackOutcome::Incorrect
    }

    pub fn should_be_addressed(&self) -> bool {
        self.message.is_some() && !self.is_correct()
    }

    pub fn attempt_style(&self) -> AttemptStyle {
        if self.is_incorrect() {
            AttemptStyle::Incorrect
        } else {
            AttemptStyle::None
        }
    }
}

/// Program variables and their values; `None` marks an overflowed evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramState {
    values: BTreeMap<Name, Option<i64>>,
}

impl ProgramState {
    /// The model's values for `vars`.
    pub fn from_model<'a>(model: &Model, vars: impl IntoIterator<Item = &'a Name>) -> Self {
        Self {
            values: vars
                .into_iter()
                .map(|v| (v.clone(), Some(model.value_of(v))))
                .collect(),
        }
    }

    pub fn get(&self, name: &Name) -> Option<Option<i64>> {
        self.values.get(name).copied()
    }

    /// Runs `command` from this state. Variables the state does not know are
    /// read from `model`.
    pub fn run(&self, command: &Command, model: &Model) -> ProgramState {
        match command {
            Command::Skip => self.clone(),
            Command::Assign { var, rhs } => {
                let overflowed = rhs
                    .free_vars()
                    .iter()
                    .any(|v| matches!(self.values.get(v), Some(None)));
                let value = if overflowed {
                    None
                } else {
                    rhs.eval(&|name| match self.values.get(name) {
                        Some(Some(v)) => *v,
                        _ => model.value_of(name),
                    })
                };
                let mut next = self.clone();
                next.values.insert(var.clone(), value);
                next
            }
            Command::Sequence(seq) => seq
                .commands()
                .iter()
                .fold(self.clone(), |state, cmd| state.run(cmd, model)),
        }
    }
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "    (no variables)");
        }
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match value {
                Some(v) => write!(f, "    {name}: {v}")?,
                None => write!(f, "    {name}: <overflow>")?,
            }
        }
        Ok(())
    }
}

/// Turns a verdict into the feedback shown to the student.
pub fn synthesize(triple: &HoareTriple, verdict: &TripleVerdict) -> Feedback {
    match verdict {
        TripleVerdict::Valid => Feedback::correct(SAY_CORRECT),
        TripleVerdict::Invalid {
            counterexample: Some(model),
            ..
        } => Feedback::incorrect(counterexample_message(triple, model)),
        TripleVerdict::Invalid {
            counterexample: None,
            reason,
        } => Feedback::incorrect(undecided_message(reason.as_deref())),
    }
}

fn counterexample_message(triple: &HoareTriple, model: &Model) -> String {
    let pre_state = ProgramState::from_model(model, &triple.pre.formula().free_vars());
    let setup = format!(
        "{SAY_INCORRECT}\n\
         The precondition does not guarantee that the postcondition will hold after the command(s).\n\n\
         Suppose we start with the variables being set thus.\n\
         {pre_state}\n\
         Then the precondition\n    {}\nis satisfied.",
        triple.pre.source()
    );
    let outcome = match triple.command.command() {
        Command::Skip => format!(
            "But the postcondition\n    {}\nis not satisfied.",
            triple.post.source()
        ),
        command => format!(
            "But after running\n    {}\nthe state of the program will be\n{}\n\
             and the postcondition\n    {}\nwill not be satisfied.",
            triple.command.source(),
            pre_state.run(command, model),
            triple.post.source()
        ),
    };
    format!("{setup}\n\n{outcome}")
}

fn undecided_message(reason: Option<&str>) -> String {
    format!(
        "{SAY_INCORRECT}\n\
         The solver could not decide whether the postcondition follows from the precondition, \
         so no counterexample was produced.\n\n\
         Reason: {}",
        reason.unwrap_or("unknown")
    )
}
