#![forbid(unsafe_code)]

mod exercise;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use hl_proof::{ProofNode, ProofSession};
use imp_ast::Decl;
use imp_verify::{CheckerConfig, Solver, TripleChecker, build_checker};
use miette::{IntoDiagnostic, NamedSource};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::exercise::{LoadedExercise, load_exercise, parse_attempt_arg};
use crate::report::{CheckReport, render_text};

#[derive(Parser, Debug)]
#[command(name = "hoare", version, about = "Hoare-logic proof checker for the Imp language")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check the proof in an exercise file.
    Check {
        path: PathBuf,

        /// Print a JSON report instead of text.
        #[arg(long)]
        json: bool,

        /// Fill hole N (1-based step number) with TEXT; repeatable.
        #[arg(long = "attempt", value_name = "N=TEXT", value_parser = parse_attempt_arg)]
        attempts: Vec<(usize, String)>,
    },

    /// Parse one assertion or command and print its desugared form.
    Parse {
        source: String,

        /// Treat SOURCE as a command (a missing `;` is appended).
        #[arg(long)]
        command: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Check {
            path,
            json,
            attempts,
        } => check(&path, json, attempts),
        Cmd::Parse { source, command } => parse(&source, command),
    }
}

#[cfg(feature = "z3")]
fn solver(config: &CheckerConfig) -> impl Solver + 'static {
    imp_verify::Z3Solver::new().with_timeout_ms(config.solver_timeout_u32())
}

#[cfg(not(feature = "z3"))]
fn solver(_config: &CheckerConfig) -> impl Solver + 'static {
    imp_verify::NoZ3Solver
}

fn check(path: &Path, json: bool, cli_attempts: Vec<(usize, String)>) -> miette::Result<()> {
    let LoadedExercise {
        title,
        exercise,
        attempts,
    } = load_exercise(path)?;
    info!(path = %path.display(), steps = exercise.len(), "loaded exercise");

    let checker = build_checker(exercise.config(), solver(exercise.config()));
    let mut session = ProofSession::from_exercise(&exercise, checker);

    // Attempts given on the command line override the file.
    for (index, attempt) in attempts.into_iter().chain(cli_attempts) {
        let Some(&id) = session.steps().get(index) else {
            miette::bail!("step {} does not exist", index + 1);
        };
        if !session.set_attempt(id, attempt) {
            miette::bail!("step {} is not a hole", index + 1);
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let submission = runtime.block_on(run_pass(&mut session))?;

    if json {
        let report = CheckReport::new(
            path.display().to_string(),
            title,
            session.arena(),
            submission,
        );
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        print!("{}", render_text(title.as_deref(), session.arena(), &submission));
    }
    Ok(())
}

async fn run_pass<C: TripleChecker>(
    session: &mut ProofSession<C>,
) -> miette::Result<hl_proof::SubmissionReport> {
    for hole in session.holes() {
        let filled = matches!(session.arena().get(hole), Some(ProofNode::Hole(h)) if !h.attempt().trim().is_empty());
        if filled {
            session.prevalidate_hole(hole).await;
        } else {
            debug!(%hole, "hole left blank");
        }
    }
    Ok(session.submit().await?)
}

fn parse(source: &str, command: bool) -> miette::Result<()> {
    let parsed = if command {
        imp_parse::parse_to_command(source).map(Decl::Command)
    } else {
        imp_parse::parse(source)
    };
    let decl = parsed.map_err(|e| {
        miette::Report::new(e).with_source_code(NamedSource::new("<source>", source.trim().to_string()))
    })?;
    match decl {
        Decl::Assertion(a) => {
            println!("assertion: {a}");
            let vars: Vec<String> = a.formula().free_vars().iter().map(|v| v.to_string()).collect();
            println!("free variables: {}", vars.join(", "));
        }
        Decl::Command(c) => println!("command: {c}"),
    }
    Ok(())
}
