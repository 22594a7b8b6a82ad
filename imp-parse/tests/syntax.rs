use imp_parse::{ImpParseError, MAX_NESTING, parse, parse_to_assertion, parse_to_command};
use proptest::prelude::*;

#[test]
fn malformed_assertions_are_rejected() {
    let bad = [
        "{   }",
        "{ () }",
        "{ x }",
        "{ x yyyyy z }",
        "{a || b || c}",
        "{ true + 1 }",
        "{ false * false  } ",
        "{ 2 => true }",
        "{ true && -1 }",
        "{ x < y < z }",
        "{ x = 1 ",
        "",
    ];
    for src in bad {
        assert!(parse(src).is_err(), "expected `{src}` to be rejected");
    }
}

fn assert_too_deep(src: &str) {
    match parse(src) {
        Err(ImpParseError::Parse(e)) => assert_eq!(e.message, "expression nested too deeply"),
        other => panic!("expected a nesting error, got {other:?}"),
    }
}

#[test]
fn runaway_nesting_is_a_parse_error() {
    let n = 100_000;
    assert_too_deep(&format!("{{ {}x{} = 1 }}", "(".repeat(n), ")".repeat(n)));
    assert_too_deep(&format!("{{ {}true }}", "!".repeat(n)));
    assert_too_deep(&format!("x := {}1;", "-".repeat(n)));
    assert_too_deep(&format!("{{ {}1 = 1 }}", "x + ".repeat(n)));
    assert_too_deep(&format!("{{ {}true }}", "true => ".repeat(n)));
}

#[test]
fn moderate_nesting_still_parses() {
    let depth = MAX_NESTING / 16;
    let src = format!("{{ {}x{} = 1 }}", "(".repeat(depth), ")".repeat(depth));
    assert!(parse_to_assertion(&src).is_ok());
    let sum = vec!["y"; MAX_NESTING / 4].join(" + ");
    assert!(parse_to_command(&format!("x := {sum}")).is_ok());
}

#[test]
fn chained_comparisons_are_rejected() {
    let err = parse("{ 0 < x < 10 }").expect_err("expected parse error");
    let msg = err.to_string();
    assert!(
        msg.contains("chained comparisons"),
        "unexpected error message: {msg}"
    );
}

#[test]
fn predicate_arguments_must_be_integer_expressions() {
    let err = parse_to_assertion("{ pred(x, 2, true) }").expect_err("boolean argument");
    let msg = err.to_string();
    assert!(
        msg.contains("Predicate arguments must be integer expressions"),
        "unexpected error message: {msg}"
    );
    assert!(msg.starts_with("13-17:"), "unexpected error message: {msg}");

    let ok = parse_to_assertion("{ pred(x, 2, y + 1) }").expect("integer arguments");
    match ok.formula() {
        imp_ast::Formula::PredicateApp { name, args } => {
            assert_eq!(name.as_str(), "pred");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected a predicate application, got {other}"),
    }
}

#[test]
fn nullary_predicates_parse() {
    let a = parse_to_assertion("{ ready() }").expect("empty argument list");
    assert_eq!(a.to_string(), "{ ready() }");
}

#[test]
fn pretty_printing_round_trips() {
    let first = parse_to_assertion("{ x = 12 * y + 1 }").expect("parses");
    assert_eq!(first.to_string(), "{ (x = ((12 * y) + 1)) }");
    let second = parse_to_assertion(&first.to_string()).expect("re-parses");
    assert_eq!(second.formula(), first.formula());
    assert_eq!(second.to_string(), first.to_string());
}

#[test]
fn negation_round_trips() {
    let src = "{ !(-(a + 1) >= -b) || a % -2 != 0 }";
    let first = parse_to_assertion(src).expect("parses");
    let second = parse_to_assertion(&first.to_string()).expect("re-parses");
    assert_eq!(second.formula(), first.formula());
}

#[test]
fn comments_and_newlines_are_ignored() {
    let a = parse_to_assertion("{ x > 0, # positive\n  y > 0 }").expect("parses");
    assert_eq!(a.to_string(), "{ ((x > 0) && (y > 0)) }");
}

#[test]
fn lex_errors_surface_through_parse() {
    let err = parse("{ x ? 1 }").expect_err("unknown character");
    assert!(matches!(err, ImpParseError::Lex(_)), "got {err:?}");
}

fn arith_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        prop_oneof![Just("a"), Just("b"), Just("zz")].prop_map(str::to_string),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")],
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.prop_map(|e| format!("-{e}")),
        ]
    })
}

fn formula_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("true".to_string()),
        Just("false".to_string()),
        (
            arith_source(),
            prop_oneof![Just("="), Just("!="), Just("<"), Just("<="), Just(">"), Just(">=")],
            arith_source()
        )
            .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("&&"), Just("||"), Just("=>")],
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("({l}) {op} ({r})")),
            inner.prop_map(|f| format!("!({f})")),
        ]
    })
}

proptest! {
    #[test]
    fn printed_assertions_are_a_fixed_point(body in formula_source()) {
        let src = format!("{{ {body} }}");
        let first = parse_to_assertion(&src).expect("generated source parses");
        let printed = first.to_string();
        let second = parse_to_assertion(&printed).expect("printed source parses");
        prop_assert_eq!(second.to_string(), printed);
    }
}
