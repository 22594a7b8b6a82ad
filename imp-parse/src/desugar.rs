#![forbid(unsafe_code)]

use imp_ast::{Decl, Formula, interpreted_function};

/// Expands applications of interpreted predicates (`even`, `odd`, ...) inside
/// assertions. Applications with an unknown name or the wrong number of
/// arguments stay uninterpreted. Commands contain no formulas and pass through.
pub fn desugar(decl: Decl) -> Decl {
    match decl {
        Decl::Assertion(a) => Decl::Assertion(a.map_formula(|f| desugar_formula(&f))),
        Decl::Command(c) => Decl::Command(c),
    }
}

pub fn desugar_formula(formula: &Formula) -> Formula {
    match formula {
        Formula::PredicateApp { name, args } => interpreted_function(name.as_str())
            .and_then(|func| func.expand(args))
            .unwrap_or_else(|| formula.clone()),
        other => other.map_children(&mut desugar_formula),
    }
}
