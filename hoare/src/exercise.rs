#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use hl_proof::{Hole, HlProofExercise, ProofStep};
use imp_verify::CheckerConfig;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("exercise error: {message}")]
#[diagnostic(code(hoare::exercise))]
pub struct ExerciseError {
    pub message: String,
}

impl ExerciseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An exercise file plus any attempts it pre-fills.
#[derive(Clone, Debug)]
pub struct LoadedExercise {
    pub title: Option<String>,
    pub exercise: HlProofExercise,
    /// `(step index, attempt)` for holes filled in the file.
    pub attempts: Vec<(usize, String)>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ExerciseFile {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    checker: CheckerConfig,

    #[serde(default, rename = "step")]
    steps: Vec<StepEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum StepKind {
    Assertion,
    Command,
    Hole,
    Remark,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct StepEntry {
    kind: StepKind,

    #[serde(default)]
    text: String,

    // Holes only.
    #[serde(default)]
    prompt: Option<String>,

    #[serde(default)]
    attempt: Option<String>,
}

pub fn load_exercise(path: &Path) -> Result<LoadedExercise, ExerciseError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ExerciseError::new(format!("failed to read {}: {e}", path.display())))?;
    parse_exercise(&raw)
        .map_err(|e| ExerciseError::new(format!("{}: {}", path.display(), e.message)))
}

pub fn parse_exercise(raw: &str) -> Result<LoadedExercise, ExerciseError> {
    let parsed: ExerciseFile =
        toml::from_str(raw).map_err(|e| ExerciseError::new(format!("failed to parse: {e}")))?;

    let mut steps = Vec::with_capacity(parsed.steps.len());
    let mut attempts = Vec::new();
    for (index, entry) in parsed.steps.into_iter().enumerate() {
        let number = index + 1;
        if entry.kind != StepKind::Hole && (entry.prompt.is_some() || entry.attempt.is_some()) {
            return Err(ExerciseError::new(format!(
                "step {number}: only holes take `prompt` or `attempt`"
            )));
        }
        let step = match entry.kind {
            StepKind::Assertion => ProofStep::assertion(&entry.text),
            StepKind::Command => ProofStep::command(&entry.text),
            StepKind::Hole => {
                if let Some(attempt) = entry.attempt {
                    attempts.push((index, attempt));
                }
                Ok(ProofStep::Hole(match entry.prompt {
                    Some(prompt) => Hole::with_prompt(prompt),
                    None => Hole::new(),
                }))
            }
            StepKind::Remark => Ok(ProofStep::remark(&entry.text)),
        }
        .map_err(|e| ExerciseError::new(format!("step {number}: {e}")))?;
        steps.push(step);
    }

    Ok(LoadedExercise {
        title: parsed.title,
        exercise: HlProofExercise::new(steps, parsed.checker),
        attempts,
    })
}

/// Parses a `--attempt N=TEXT` value; `N` is the 1-based step number.
pub fn parse_attempt_arg(raw: &str) -> Result<(usize, String), String> {
    let (number, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected N=TEXT, got `{raw}`"))?;
    let number: usize = number
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a step number", number.trim()))?;
    if number == 0 {
        return Err("step numbers start at 1".to_string());
    }
    Ok((number - 1, text.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
title = "Assignment chain"

[checker]
reject_false_precondition = true

[[step]]
kind = "hole"
prompt = "{ c = ? }"
attempt = "{ c + 1 = 5 }"

[[step]]
kind = "remark"
text = "  apply the assignment rule  "

[[step]]
kind = "command"
text = "d := c + 1"

[[step]]
kind = "assertion"
text = "{ d = 5 }"
"#;

    #[test]
    fn sample_exercise_loads() {
        let loaded = parse_exercise(SAMPLE).unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Assignment chain"));
        assert!(loaded.exercise.config().reject_false_precondition);
        assert_eq!(loaded.exercise.len(), 4);
        assert_eq!(loaded.attempts, vec![(0, "{ c + 1 = 5 }".to_string())]);
        match loaded.exercise.step(0) {
            Some(ProofStep::Hole(h)) => assert_eq!(h.placeholder_prompt(), "{ c = ? }"),
            other => panic!("expected a hole, got {other:?}"),
        }
        match loaded.exercise.step(1) {
            Some(ProofStep::Remark(r)) => assert_eq!(r.body(), "apply the assignment rule"),
            other => panic!("expected a remark, got {other:?}"),
        }
    }

    #[test]
    fn bad_step_text_names_the_step() {
        let err = parse_exercise("[[step]]\nkind = \"assertion\"\ntext = \"{ x = }\"\n").unwrap_err();
        assert!(err.message.starts_with("step 1: "), "{}", err.message);
    }

    #[test]
    fn attempts_only_on_holes() {
        let raw = "[[step]]\nkind = \"command\"\ntext = \"skip\"\nattempt = \"x\"\n";
        let err = parse_exercise(raw).unwrap_err();
        assert!(err.message.contains("only holes"), "{}", err.message);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_exercise("[checker]\nsolver = \"cvc5\"\n").is_err());
        assert!(parse_exercise("[[step]]\nkind = \"loop\"\n").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let loaded = load_exercise(file.path()).unwrap();
        assert_eq!(loaded.exercise.len(), 4);

        let missing = load_exercise(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(missing.message.starts_with("failed to read"));
    }

    #[test]
    fn demo_exercises_load() {
        let chain = parse_exercise(include_str!("../../demos/assignment-chain.toml")).unwrap();
        assert_eq!(chain.exercise.len(), 9);
        assert_eq!(chain.attempts.len(), 3);
        assert_eq!(chain.exercise.config().solver_timeout_ms, Some(5000));

        let skip = parse_exercise(include_str!("../../demos/skip-consequence.toml")).unwrap();
        assert_eq!(skip.exercise.len(), 5);
        assert_eq!(skip.exercise.config(), &CheckerConfig::default());
    }

    #[test]
    fn attempt_args() {
        assert_eq!(parse_attempt_arg("3={ x > 0 }"), Ok((2, "{ x > 0 }".to_string())));
        assert!(parse_attempt_arg("0={ x }").is_err());
        assert!(parse_attempt_arg("x").is_err());
        assert!(parse_attempt_arg("two={ x }").is_err());
    }
}
