//! Property tests for the ordering and unification laws.

use super::env::Env;
use super::ordering::{Kbo, KboConfig, TermOrder};
use super::substitution::Substitution;
use super::term::TermId;
use super::unification::{match_term, unify};
use proptest::prelude::*;

/// A small recipe language for ground-or-variable terms over a fixed
/// signature: constants a, b; unary f; binary g; variables 0..3.
#[derive(Debug, Clone)]
enum TermRecipe {
    Var(u32),
    Const(u8),
    Unary(Box<TermRecipe>),
    Binary(Box<TermRecipe>, Box<TermRecipe>),
}

fn term_recipe() -> impl Strategy<Value = TermRecipe> {
    let leaf = prop_oneof![
        (0u32..3).prop_map(TermRecipe::Var),
        (0u8..2).prop_map(TermRecipe::Const),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| TermRecipe::Unary(Box::new(t))),
            (inner.clone(), inner)
                .prop_map(|(s, t)| TermRecipe::Binary(Box::new(s), Box::new(t))),
        ]
    })
}

fn build(env: &mut Env, recipe: &TermRecipe) -> TermId {
    match recipe {
        TermRecipe::Var(v) => env.terms.var(*v),
        TermRecipe::Const(c) => {
            let name = if *c == 0 { "a" } else { "b" };
            let id = env.symbols.intern_function(name, 0);
            env.terms.app(id, vec![])
        }
        TermRecipe::Unary(t) => {
            let arg = build(env, t);
            let f = env.symbols.intern_function("f", 1);
            env.terms.app(f, vec![arg])
        }
        TermRecipe::Binary(s, t) => {
            let a = build(env, s);
            let b = build(env, t);
            let g = env.symbols.intern_function("g", 2);
            env.terms.app(g, vec![a, b])
        }
    }
}

proptest! {
    /// Pointer equality coincides with structural equality: building the
    /// same recipe twice yields the same id.
    #[test]
    fn hash_consing_law(recipe in term_recipe()) {
        let mut env = Env::new();
        let t1 = build(&mut env, &recipe);
        let t2 = build(&mut env, &recipe);
        prop_assert_eq!(t1, t2);
    }

    /// The ordering is antisymmetric.
    #[test]
    fn kbo_antisymmetric(r1 in term_recipe(), r2 in term_recipe()) {
        let mut env = Env::new();
        let kbo = Kbo::new(KboConfig::default());
        let s = build(&mut env, &r1);
        let t = build(&mut env, &r2);
        let st = kbo.compare(&env, s, t);
        let ts = kbo.compare(&env, t, s);
        prop_assert_eq!(st, ts.reverse());
    }

    /// The ordering is total on ground terms.
    #[test]
    fn kbo_ground_total(r1 in term_recipe(), r2 in term_recipe()) {
        let mut env = Env::new();
        let kbo = Kbo::new(KboConfig::default());
        let s = build(&mut env, &r1);
        let t = build(&mut env, &r2);
        if env.terms.is_ground(s) && env.terms.is_ground(t) {
            prop_assert_ne!(kbo.compare(&env, s, t), TermOrder::Incomparable);
        }
    }

    /// The ordering is stable under substitution: s > t implies sσ > tσ.
    #[test]
    fn kbo_substitution_monotone(r1 in term_recipe(), r2 in term_recipe(), r3 in term_recipe()) {
        let mut env = Env::new();
        let kbo = Kbo::new(KboConfig::default());
        let s = build(&mut env, &r1);
        let t = build(&mut env, &r2);
        let repl = build(&mut env, &r3);

        if kbo.compare(&env, s, t) == TermOrder::Greater {
            let mut subst = Substitution::new();
            // Bind variable 0 unless that would be cyclic.
            let mut vars = std::collections::HashSet::new();
            env.terms.collect_variables(repl, &mut vars);
            if !vars.contains(&0) {
                subst.bind(0, repl);
                let s2 = env.terms.apply(s, &subst);
                let t2 = env.terms.apply(t, &subst);
                prop_assert_eq!(kbo.compare(&env, s2, t2), TermOrder::Greater);
            }
        }
    }

    /// A successful unifier really unifies.
    #[test]
    fn unify_produces_unifier(r1 in term_recipe(), r2 in term_recipe()) {
        let mut env = Env::new();
        let s = build(&mut env, &r1);
        let t = build(&mut env, &r2);
        let mut subst = Substitution::new();
        if unify(&env.terms, s, t, &mut subst) {
            let s2 = env.terms.apply(s, &subst);
            let t2 = env.terms.apply(t, &subst);
            prop_assert_eq!(s2, t2);
        }
    }

    /// A successful match instantiates the pattern to the target, and
    /// matching implies unifiability.
    #[test]
    fn match_is_instantiation(r1 in term_recipe(), r2 in term_recipe()) {
        let mut env = Env::new();
        let pattern = build(&mut env, &r1);
        // Rename the pattern apart so the target shares no variables.
        let pattern = env.terms.rename(pattern, 16);
        let target = build(&mut env, &r2);
        let mut subst = Substitution::new();
        if match_term(&env.terms, pattern, target, &mut subst) {
            prop_assert_eq!(env.terms.apply(pattern, &subst), target);
            let mut mgu = Substitution::new();
            prop_assert!(unify(&env.terms, pattern, target, &mut mgu));
        }
    }
}
