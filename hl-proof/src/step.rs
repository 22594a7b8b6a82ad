#![forbid(unsafe_code)]

use imp_ast::{Assertion, CommandDecl};
use imp_parse::{ImpParseError, parse_to_assertion, parse_to_command};

use crate::prevalidate::AssertionPrevalidator;

pub const DEFAULT_PLACEHOLDER_PROMPT: &str = "{ }";

/// A blank the student fills with an assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hole {
    placeholder_prompt: String,
}

impl Default for Hole {
    fn default() -> Self {
        Self::new()
    }
}

impl Hole {
    pub fn new() -> Self {
        Self {
            placeholder_prompt: DEFAULT_PLACEHOLDER_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            placeholder_prompt: prompt.into(),
        }
    }

    /// Text shown in the blank before the student types anything.
    pub fn placeholder_prompt(&self) -> &str {
        &self.placeholder_prompt
    }

    pub fn prevalidator(&self) -> AssertionPrevalidator {
        AssertionPrevalidator
    }
}

/// Display-only annotation between proof steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remark {
    body: String,
}

impl Remark {
    pub fn new(body: impl AsRef<str>) -> Self {
        Self {
            body: body.as_ref().trim().to_string(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProofStep {
    Assertion(Assertion),
    Hole(Hole),
    Command(CommandDecl),
    Remark(Remark),
}

impl ProofStep {
    pub fn assertion(src: &str) -> Result<Self, ImpParseError> {
        Ok(ProofStep::Assertion(parse_to_assertion(src)?))
    }

    pub fn command(src: &str) -> Result<Self, ImpParseError> {
        Ok(ProofStep::Command(parse_to_command(src)?))
    }

    pub fn hole() -> Self {
        ProofStep::Hole(Hole::new())
    }

    pub fn remark(body: impl AsRef<str>) -> Self {
        ProofStep::Remark(Remark::new(body))
    }
}
