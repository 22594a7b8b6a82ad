use std::cell::Cell;
use std::rc::Rc;

use hl_proof::{HoleState, NodeId, ProofArena, ProofSession, ProofStep, StopReason, TripleRef};
use imp_verify::testing::{ScriptedChecker, ScriptedSolver};
use imp_verify::{
    Feedback, HoareTripleChecker, Model, SAY_CORRECT, SolverOutcome, TripleChecker,
};

fn a(src: &str) -> ProofStep {
    ProofStep::assertion(src).unwrap()
}

fn c(src: &str) -> ProofStep {
    ProofStep::command(src).unwrap()
}

fn correct() -> Feedback {
    Feedback::correct(SAY_CORRECT)
}

fn feedback<C: TripleChecker>(session: &ProofSession<C>, id: NodeId) -> Feedback {
    session.arena().feedback(id).cloned().unwrap()
}

/// { b > 0 } skip; { b > 0 } d := b; { d > 0 }
fn two_given_triples(script: Vec<Feedback>) -> ProofSession<ScriptedChecker> {
    ProofSession::new(
        vec![
            a("{ b > 0 }"),
            c("skip"),
            a("{ b > 0 }"),
            c("d := b"),
            a("{ d > 0 }"),
        ],
        ScriptedChecker::new(script),
    )
}

#[tokio::test]
async fn walk_runs_last_to_first() {
    let mut session = two_given_triples(vec![correct(), correct()]);
    let report = session.submit().await.unwrap();
    let ids = session.steps().to_vec();

    assert_eq!(report.stopped, StopReason::Completed);
    assert!(report.is_correct());
    assert_eq!(
        report.checked,
        vec![
            TripleRef { pre: ids[2], command: ids[3], post: ids[4] },
            TripleRef { pre: ids[0], command: ids[1], post: ids[2] },
        ]
    );
    let seen = session.checker().seen();
    assert_eq!(seen[0].command.source(), "d := b;");
    assert_eq!(seen[1].command.source(), "skip;");
    for id in ids {
        assert_eq!(feedback(&session, id), correct());
    }
}

#[tokio::test]
async fn earlier_failure_is_reached_after_later_success() {
    let mut session = two_given_triples(vec![correct(), Feedback::incorrect("nope")]);
    let report = session.submit().await.unwrap();
    let ids = session.steps().to_vec();

    assert_eq!(report.checked.len(), 2);
    assert_eq!(
        report.stopped,
        StopReason::Incorrect(TripleRef { pre: ids[0], command: ids[1], post: ids[2] })
    );
    // No hole in the failing triple, so the command carries the message.
    assert_eq!(feedback(&session, ids[1]), Feedback::incorrect("nope"));
    assert_eq!(feedback(&session, ids[0]), Feedback::incorrect_style_only());
    assert_eq!(feedback(&session, ids[2]), Feedback::incorrect_style_only());
    assert_eq!(feedback(&session, ids[3]), correct());
    assert_eq!(feedback(&session, ids[4]), correct());
}

#[tokio::test]
async fn later_failure_stops_the_walk() {
    let mut session = two_given_triples(vec![Feedback::incorrect("nope"), correct()]);
    let report = session.submit().await.unwrap();
    let ids = session.steps().to_vec();

    assert_eq!(report.checked.len(), 1);
    assert_eq!(session.checker().seen().len(), 1);
    assert!(feedback(&session, ids[0]).is_empty());
    assert!(feedback(&session, ids[1]).is_empty());
    assert!(feedback(&session, ids[3]).is_incorrect());
}

#[tokio::test]
async fn unprevalidated_hole_halts_without_checking() {
    let mut session = ProofSession::new(
        vec![a("{ b > 0 }"), c("skip"), a("{ b > 0 }"), c("d := b"), ProofStep::hole()],
        ScriptedChecker::new(vec![correct(), correct()]),
    );
    let ids = session.steps().to_vec();
    session.set_attempt(ids[4], "{ b > 0 }");

    let report = session.submit().await.unwrap();
    assert!(report.checked.is_empty());
    assert_eq!(
        report.stopped,
        StopReason::IncompleteTriple(TripleRef { pre: ids[2], command: ids[3], post: ids[4] })
    );
    assert!(session.checker().seen().is_empty());
}

#[tokio::test]
async fn prevalidation_gates_submission() {
    let mut session = ProofSession::new(
        vec![ProofStep::hole(), c("d := c + 1"), a("{ d = 5 }")],
        ScriptedChecker::default(),
    );
    let hole = session.holes()[0];
    assert_eq!(session.arena().hole_state(hole), Some(HoleState::Unvalidated));
    assert!(!session.can_submit(hole));

    session.set_attempt(hole, "{ c + 1 = }");
    let fb = session.prevalidate_hole(hole).await.unwrap();
    assert!(fb.message.unwrap().starts_with("Parse error:\n"));
    assert_eq!(session.arena().hole_state(hole), Some(HoleState::PrevalidationFailed));
    assert!(session.hole_assertion(hole).is_none());
    assert!(!session.can_submit(hole));

    session.set_attempt(hole, "{ c + 1 = 5 }");
    assert_eq!(session.arena().hole_state(hole), Some(HoleState::Unvalidated));
    assert!(session.prevalidate_hole(hole).await.unwrap().is_empty());
    assert_eq!(session.arena().hole_state(hole), Some(HoleState::Prevalidated));
    assert!(feedback(&session, hole).is_empty());
    assert!(session.can_submit(hole));
    assert_eq!(session.hole_assertion(hole).unwrap().source(), "{ c + 1 = 5 }");

    let not_a_hole = session.steps()[1];
    assert!(session.prevalidate_hole(not_a_hole).await.is_none());
}

async fn failing_two_hole_session() -> (ProofSession<ScriptedChecker>, [NodeId; 3]) {
    let mut session = ProofSession::new(
        vec![ProofStep::hole(), c("c := b + 2"), ProofStep::hole()],
        ScriptedChecker::new(vec![Feedback::incorrect("full message")]),
    );
    let ids = session.steps().to_vec();
    session.set_attempt(ids[0], "{ b = 1 }");
    session.set_attempt(ids[2], "{ c = 4 }");
    session.prevalidate_hole(ids[0]).await;
    session.prevalidate_hole(ids[2]).await;

    let report = session.submit().await.unwrap();
    assert!(matches!(report.stopped, StopReason::Incorrect(_)));
    (session, [ids[0], ids[1], ids[2]])
}

#[tokio::test]
async fn only_the_first_hole_gets_the_message() {
    let (session, [pre, cmd, post]) = failing_two_hole_session().await;

    assert_eq!(feedback(&session, pre), Feedback::incorrect("full message"));
    assert_eq!(feedback(&session, cmd), Feedback::incorrect_style_only());
    assert_eq!(feedback(&session, post), Feedback::incorrect_style_only());
    assert!(!session.can_submit(pre));
    assert!(session.can_submit(post));
    assert_eq!(session.arena().subscriber_count(), 2);
}

#[tokio::test]
async fn first_edit_clears_the_triple_once() {
    let (mut session, [pre, cmd, post]) = failing_two_hole_session().await;

    session.set_attempt(post, "{ c = 3 }");
    for id in [pre, cmd, post] {
        assert!(feedback(&session, id).is_empty(), "node {id} not cleared");
    }
    assert_eq!(session.arena().subscriber_count(), 0);
    assert!(!session.arena().must_address(pre));

    session.arena_mut().set_feedback(cmd, Feedback::incorrect_style_only());
    session.set_attempt(pre, "{ b = 2 }");
    assert!(feedback(&session, cmd).is_incorrect());
}

#[tokio::test]
async fn publishing_without_an_edit_keeps_feedback() {
    let (mut session, [pre, cmd, _]) = failing_two_hole_session().await;

    session.set_attempt(pre, "{ b = 1 }");
    assert!(feedback(&session, cmd).is_incorrect());
    assert_eq!(session.arena().subscriber_count(), 2);
}

#[tokio::test]
async fn resubmitting_replaces_clearing_listeners() {
    let mut session = ProofSession::new(
        vec![ProofStep::hole(), c("c := b + 2"), ProofStep::hole()],
        ScriptedChecker::new(vec![
            Feedback::incorrect("first"),
            Feedback::incorrect("second"),
            Feedback::incorrect("third"),
        ]),
    );
    let ids = session.steps().to_vec();
    let (pre, cmd, post) = (ids[0], ids[1], ids[2]);
    session.set_attempt(pre, "{ b = 1 }");
    session.set_attempt(post, "{ c = 4 }");
    session.prevalidate_hole(pre).await;
    session.prevalidate_hole(post).await;

    for _ in 0..3 {
        let report = session.submit().await.unwrap();
        assert!(matches!(report.stopped, StopReason::Incorrect(_)));
        assert_eq!(session.arena().subscriber_count(), 2);
    }
    assert_eq!(feedback(&session, pre), Feedback::incorrect("third"));

    let clears = Rc::new(Cell::new(0));
    let seen = Rc::clone(&clears);
    session.arena_mut().subscribe(move |arena: &mut ProofArena, id: NodeId| {
        if id == cmd && arena.feedback(cmd).is_some_and(Feedback::is_empty) {
            seen.set(seen.get() + 1);
        }
    });

    session.set_attempt(post, "{ c = 3 }");
    assert_eq!(clears.get(), 1);
    assert_eq!(session.arena().subscriber_count(), 1);
    for id in [pre, cmd, post] {
        assert!(feedback(&session, id).is_empty());
    }
}

#[tokio::test]
async fn counterexample_message_reaches_the_hole() {
    let model: Model = [(imp_ast::Name::new("b").unwrap(), 0)].into_iter().collect();
    let checker = HoareTripleChecker::new(ScriptedSolver::new([SolverOutcome::Sat(model)]));
    let mut session = ProofSession::new(
        vec![ProofStep::hole(), c("c := b + 2"), a("{ c = 4 }")],
        checker,
    );
    let hole = session.holes()[0];
    session.set_attempt(hole, "{ b >= 0 }");
    session.prevalidate_hole(hole).await;

    session.submit().await.unwrap();
    let msg = feedback(&session, hole).message.unwrap();
    assert!(msg.contains("    b: 0\nThen the precondition\n    { b >= 0 }\nis satisfied."), "{msg}");
    assert!(msg.contains("But after running\n    c := b + 2;\n"), "{msg}");
    assert!(msg.contains("    b: 0\n    c: 2\n"), "{msg}");
    assert!(!session.can_submit(hole));
}

#[tokio::test]
async fn checker_errors_abort_the_pass() {
    let mut session = two_given_triples(vec![correct()]);
    let err = session.submit().await.unwrap_err();
    assert!(err.message.contains("no answer left"));
    let ids = session.steps().to_vec();
    assert_eq!(feedback(&session, ids[4]), correct());
    assert!(feedback(&session, ids[0]).is_empty());
}
