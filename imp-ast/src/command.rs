#![forbid(unsafe_code)]

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::{ArithExpr, Name};

pub const COMMAND_DELIMITER: &str = ";";

#[derive(Debug, Error, Diagnostic)]
#[error("a sequence needs at least two sub-commands, got {0}")]
#[diagnostic(code(imp::sequence))]
pub struct SequenceError(pub usize);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Assign { var: Name, rhs: ArithExpr },
    Skip,
    Sequence(Sequence),
}

impl Command {
    pub fn assign(var: Name, rhs: ArithExpr) -> Self {
        Command::Assign { var, rhs }
    }

    /// Builds a sequence, flattening nested sequences.
    pub fn sequence(commands: Vec<Command>) -> Result<Self, SequenceError> {
        Sequence::new(commands).map(Command::Sequence)
    }

    /// The primitive commands this command runs, in order.
    pub fn sub_commands(&self) -> &[Command] {
        match self {
            Command::Sequence(seq) => seq.commands(),
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Assign { var, rhs } => write!(f, "{var} := {rhs}{COMMAND_DELIMITER}"),
            Command::Skip => write!(f, "skip{COMMAND_DELIMITER}"),
            Command::Sequence(seq) => seq.fmt(f),
        }
    }
}

/// Two or more primitive commands run one after another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sequence {
    commands: Vec<Command>,
}

impl Sequence {
    pub fn new(commands: Vec<Command>) -> Result<Self, SequenceError> {
        let mut flat = Vec::with_capacity(commands.len());
        for c in commands {
            match c {
                Command::Sequence(inner) => flat.extend(inner.commands),
                other => flat.push(other),
            }
        }
        if flat.len() < 2 {
            return Err(SequenceError(flat.len()));
        }
        Ok(Self { commands: flat })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            c.fmt(f)?;
        }
        Ok(())
    }
}

/// A command together with the (trimmed) source text it was parsed from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommandDecl {
    source: String,
    command: Command,
}

impl CommandDecl {
    pub fn new(source: impl Into<String>, command: Command) -> Self {
        Self {
            source: source.into(),
            command,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl fmt::Display for CommandDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.command.fmt(f)
    }
}
