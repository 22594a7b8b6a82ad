#![forbid(unsafe_code)]

use async_trait::async_trait;
use imp_parse::parse_to_assertion;
use imp_verify::Feedback;
use serde::Serialize;
use tracing::debug;

/// Where a hole stands with respect to syntactic checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleState {
    #[default]
    Unvalidated,
    Prevalidating,
    Prevalidated,
    PrevalidationFailed,
}

/// Syntax-only acceptance check run before any solver work.
///
/// Failures come back as feedback for the hole, never as errors.
#[async_trait(?Send)]
pub trait Prevalidator {
    async fn prevalidate(&self, attempt: &str) -> Feedback;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AssertionPrevalidator;

#[async_trait(?Send)]
impl Prevalidator for AssertionPrevalidator {
    async fn prevalidate(&self, attempt: &str) -> Feedback {
        match parse_to_assertion(attempt) {
            Ok(_) => Feedback::empty(),
            Err(err) => {
                debug!(%attempt, error = %err, "prevalidation failed");
                Feedback::incorrect(format!("Parse error:\n{err}"))
            }
        }
    }
}
