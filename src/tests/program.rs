use super::*;
use crate::parser::parse_program;
use crate::test_utils::{load, setup};

fn load_err(source: &str) -> LoadError {
    let mut trail = setup();
    let code = parse_program(source, &mut trail).expect("program should parse");
    Program::load(code, &trail).expect_err("program should be rejected")
}

#[test]
fn clauses_grouped_in_declaration_order() {
    let (trail, program) = load("p(1).\nq.\np(2).");
    let p = trail.symbols.get("p", 1).unwrap();
    let texts: Vec<String> = program
        .clauses(p)
        .unwrap()
        .iter()
        .map(|&c| trail.stringify(c))
        .collect();
    assert_eq!(texts, vec!["<-(p(1), true)", "<-(p(2), true)"]);
    assert!(program.defines(trail.symbols.get("q", 0).unwrap()));
}

#[test]
fn occurrences_list_later_rules_first() {
    let src = "first @ c(X) <=> true.\nsecond @ d, c(Y) ==> true.";
    let (trail, program) = load(src);
    let c = trail.symbols.get("c", 1).unwrap();
    let d = trail.symbols.get("d", 0).unwrap();
    assert!(program.is_constraint(c));
    assert_eq!(
        program.occurrences(c),
        &[
            Occurrence {
                rule: RuleId(1),
                slot: 1
            },
            Occurrence {
                rule: RuleId(0),
                slot: 0
            },
        ]
    );
    assert_eq!(program.occurrences(d).len(), 1);
    assert_eq!(program.rule(RuleId(1)).name, "second");
    assert_eq!(program.rules().len(), 2);
}

#[test]
fn repeated_functor_in_one_rule_gives_one_occurrence_per_slot() {
    let (trail, program) = load("gcd(N) \\ gcd(M) <=> N =< M | gcd(M - N).");
    let gcd = trail.symbols.get("gcd", 1).unwrap();
    let slots: Vec<usize> = program.occurrences(gcd).iter().map(|o| o.slot).collect();
    assert_eq!(slots, vec![0, 1]);
    let rule = program.rule(RuleId(0));
    assert_eq!(rule.keep, 1);
    assert_eq!(rule.pattern.len(), 2);
}

#[test]
fn unknown_functor_has_no_occurrences() {
    let (mut trail, program) = load("a.");
    let f = trail.symbols.intern("zzz", 3);
    assert!(program.occurrences(f).is_empty());
    assert!(!program.is_constraint(f));
    assert!(program.clauses(f).is_none());
}

#[test]
fn rejects_non_list() {
    let mut trail = setup();
    let a = trail.atom("a");
    assert_eq!(Program::load(a, &trail).unwrap_err(), LoadError::NotAList);
}

#[test]
fn rejects_unknown_clause_shape() {
    let mut trail = setup();
    let item = trail.compound("fact", &[]);
    let one = trail.int(1);
    let code = trail.list(&[item, one]);
    assert!(matches!(
        Program::load(code, &trail),
        Err(LoadError::BadClause(_))
    ));
}

#[test]
fn rejects_non_callable_head() {
    let mut trail = setup();
    let one = trail.int(1);
    let truth = trail.atom("true");
    let clause = trail.compound("<-", &[one, truth]);
    let code = trail.list(&[clause]);
    assert_eq!(
        Program::load(code, &trail).unwrap_err(),
        LoadError::BadHead("1".to_string())
    );
}

#[test]
fn rejects_builtin_redefinition() {
    assert!(matches!(load_err("write(X) <- true."), LoadError::BadHead(_)));
}

#[test]
fn rejects_constraint_that_is_also_a_predicate() {
    assert_eq!(
        load_err("c(1).\nc(X) <=> true."),
        LoadError::ConstraintClash("c/1".to_string())
    );
}

#[test]
fn rejects_builtin_as_constraint() {
    assert!(matches!(load_err("write(X) <=> true."), LoadError::BadRule(_)));
}

#[test]
fn rejects_rule_without_heads() {
    let mut trail = setup();
    let name = trail.atom("empty");
    let nil = trail.atom("nil");
    let truth = trail.atom("true");
    let rule = trail.compound("constraint_rule", &[name, nil, nil, truth, truth]);
    let code = trail.list(&[rule]);
    assert!(matches!(
        Program::load(code, &trail),
        Err(LoadError::BadRule(_))
    ));
}

#[test]
fn load_error_messages() {
    assert_eq!(
        LoadError::ConstraintClash("c/1".to_string()).to_string(),
        "c/1 is both a constraint and a predicate"
    );
    assert_eq!(
        LoadError::NotAList.to_string(),
        "program is not a proper list of clauses"
    );
}
