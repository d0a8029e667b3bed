//! End-to-end tests through the CNF reader and the saturation engine.

use refute::{
    parse_cnf, proof, saturate, Env, KboConfig, Options, SaturationAlgorithm, TerminationReason,
};

fn run(problem: &str, options: Options) -> (TerminationReason, refute::Saturation) {
    let mut env = Env::new();
    let inputs = parse_cnf(problem, &mut env).expect("problem parses");
    let (result, engine) =
        saturate(env, KboConfig::default(), inputs, options).expect("options are valid");
    if result.termination == TerminationReason::Refutation {
        let empty = result.refutation.expect("refutation carries the empty clause");
        assert!(
            proof::check_derivation(&engine.arena, empty),
            "derivation must be well-formed"
        );
    }
    (result.termination, engine)
}

#[test]
fn test_unit_contradiction() {
    let (termination, _) = run(
        r#"
        cnf(p, axiom, p).
        cnf(not_p, negated_conjecture, ~p).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_modus_ponens_chain() {
    let (termination, _) = run(
        r#"
        cnf(p_a, axiom, p(a)).
        cnf(p_implies_q, axiom, ~p(X) | q(X)).
        cnf(q_implies_r, axiom, ~q(X) | r(X)).
        cnf(goal, negated_conjecture, ~r(a)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_equality_reflexivity() {
    let (termination, _) = run(
        "cnf(goal, negated_conjecture, a != a).",
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_equality_transitivity() {
    let (termination, engine) = run(
        r#"
        cnf(ab, axiom, a = b).
        cnf(bc, axiom, b = c).
        cnf(goal, negated_conjecture, a != c).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
    let stats = engine.statistics();
    assert!(
        stats.superpositions + stats.forward_demodulations + stats.backward_demodulations > 0,
        "equality reasoning must have rewritten something"
    );
    assert!(stats.equality_resolutions > 0);
}

#[test]
fn test_congruence() {
    let (termination, _) = run(
        r#"
        cnf(ab, axiom, a = b).
        cnf(goal, negated_conjecture, f(a) != f(b)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_satisfiable_problem() {
    let (termination, engine) = run(
        r#"
        cnf(p_a, axiom, p(a)).
        cnf(not_p_b, axiom, ~p(b)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Satisfiable);
    assert_eq!(engine.active_size(), 2);
    assert_eq!(engine.statistics().generated_clauses, 0);
}

#[test]
fn test_forward_subsumption_drops_instance() {
    // p(X) subsumes the wider clause before it ever reaches passive.
    let (termination, engine) = run(
        r#"
        cnf(general, axiom, p(X)).
        cnf(instance, axiom, p(a) | q(a)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Satisfiable);
    assert_eq!(engine.statistics().forward_subsumed, 1);
    assert_eq!(engine.active_size(), 1);
}

#[test]
fn test_group_left_identity_problem() {
    // In a group, left identity and left inverse entail that the inverse
    // also cancels on the right for a named element.
    let (termination, _) = run(
        r#"
        cnf(assoc, axiom, mult(mult(X, Y), Z) = mult(X, mult(Y, Z))).
        cnf(left_id, axiom, mult(e, X) = X).
        cnf(left_inv, axiom, mult(inv(X), X) = e).
        cnf(goal, negated_conjecture, mult(inv(a), a) != e).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_discount_variant_also_refutes() {
    let mut options = Options::default();
    options.saturation_algorithm = SaturationAlgorithm::Discount;
    let (termination, _) = run(
        r#"
        cnf(p_a, axiom, p(a)).
        cnf(p_implies_q, axiom, ~p(X) | q(X)).
        cnf(goal, negated_conjecture, ~q(a)).
        "#,
        options,
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_split_queue_strategy_refutes() {
    let mut options = Options::default();
    options.split_queue_ratios = Some(vec![1, 1]);
    options.split_queue_cutoffs = Some(vec![0.5, 1.0]);
    let (termination, _) = run(
        r#"
        cnf(p_a, axiom, p(a)).
        cnf(p_implies_q, axiom, ~p(X) | q(X)).
        cnf(goal, negated_conjecture, ~q(a)).
        "#,
        options,
    );
    assert_eq!(termination, TerminationReason::Refutation);
}

#[test]
fn test_selection_policies_agree_on_refutation() {
    for policy in [0u32, 20, 21, 22] {
        let mut options = Options::default();
        options.selection = policy;
        let (termination, _) = run(
            r#"
            cnf(p_a, axiom, p(a)).
            cnf(p_implies_q, axiom, ~p(X) | q(X)).
            cnf(goal, negated_conjecture, ~q(a)).
            "#,
            options,
        );
        assert_eq!(
            termination,
            TerminationReason::Refutation,
            "selection policy {}",
            policy
        );
    }
}

#[test]
fn test_demodulation_shrinks_clauses() {
    let (termination, engine) = run(
        r#"
        cnf(simp, axiom, f(X) = a).
        cnf(fact, axiom, p(f(b))).
        cnf(goal, negated_conjecture, ~p(a)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Refutation);
    let stats = engine.statistics();
    assert!(stats.forward_demodulations + stats.backward_demodulations > 0);
}

#[test]
fn test_tautologies_are_deleted() {
    let (termination, engine) = run(
        r#"
        cnf(taut, axiom, p(a) | ~p(a)).
        cnf(other, axiom, q(b)).
        "#,
        Options::default(),
    );
    assert_eq!(termination, TerminationReason::Satisfiable);
    assert_eq!(engine.statistics().tautologies_deleted, 1);
    assert_eq!(engine.active_size(), 1);
}

#[test]
fn test_condensation_strategy() {
    let mut options = Options::default();
    options.condensation = refute::CondensationMode::On;
    let (termination, engine) = run(
        r#"
        cnf(wide, axiom, p(X) | p(a)).
        cnf(goal, negated_conjecture, ~p(a)).
        "#,
        options,
    );
    // p(X) | p(a) condenses to p(a), which resolves with the goal.
    assert_eq!(termination, TerminationReason::Refutation);
    assert!(engine.statistics().condensations >= 1);
}
