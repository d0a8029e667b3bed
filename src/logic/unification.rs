//! Robinson unification and one-way matching over interned terms.
//!
//! Both operate on shared variable space: callers keep inference partners
//! apart by renaming one side with a variable offset first. Bindings are
//! recorded on the substitution trail, and both functions undo their own
//! bindings on failure, so a caller can chain attempts against the same
//! substitution.

use super::env::Env;
use super::literal::LiteralId;
use super::substitution::Substitution;
use super::term::{Term, TermId, TermStore};

/// Unify two terms, extending `subst`. Returns `false` (with `subst`
/// restored to its state at entry) if no unifier exists.
pub fn unify(terms: &TermStore, a: TermId, b: TermId, subst: &mut Substitution) -> bool {
    let mark = subst.mark();
    if unify_rec(terms, a, b, subst) {
        true
    } else {
        subst.backtrack(mark);
        false
    }
}

fn unify_rec(terms: &TermStore, a: TermId, b: TermId, subst: &mut Substitution) -> bool {
    let a = deref(terms, a, subst);
    let b = deref(terms, b, subst);
    if a == b {
        return true;
    }
    match (terms.term(a), terms.term(b)) {
        (Term::Var(v), _) => {
            if occurs(terms, *v, b, subst) {
                false
            } else {
                subst.bind(*v, b);
                true
            }
        }
        (_, Term::Var(v)) => {
            if occurs(terms, *v, a, subst) {
                false
            } else {
                subst.bind(*v, a);
                true
            }
        }
        (Term::App(f, args_a), Term::App(g, args_b)) => {
            if f != g {
                return false;
            }
            let args_a = args_a.clone();
            let args_b = args_b.clone();
            args_a
                .iter()
                .zip(args_b.iter())
                .all(|(&x, &y)| unify_rec(terms, x, y, subst))
        }
    }
}

/// One-way match: extend `subst` so that `pattern` under `subst` equals
/// `target`. Only pattern variables may be bound; the target is fixed.
/// Returns `false` (with `subst` restored) if no match exists.
pub fn match_term(
    terms: &TermStore,
    pattern: TermId,
    target: TermId,
    subst: &mut Substitution,
) -> bool {
    let mark = subst.mark();
    if match_rec(terms, pattern, target, subst) {
        true
    } else {
        subst.backtrack(mark);
        false
    }
}

fn match_rec(
    terms: &TermStore,
    pattern: TermId,
    target: TermId,
    subst: &mut Substitution,
) -> bool {
    match terms.term(pattern) {
        Term::Var(v) => match subst.get(*v) {
            Some(bound) => bound == target,
            None => {
                subst.bind(*v, target);
                true
            }
        },
        Term::App(f, args_p) => match terms.term(target) {
            Term::App(g, args_t) if f == g => {
                let args_p = args_p.clone();
                let args_t = args_t.clone();
                args_p
                    .iter()
                    .zip(args_t.iter())
                    .all(|(&p, &t)| match_rec(terms, p, t, subst))
            }
            _ => false,
        },
    }
}

/// Chase top-level variable bindings.
fn deref(terms: &TermStore, mut t: TermId, subst: &Substitution) -> TermId {
    while let Term::Var(v) = terms.term(t) {
        match subst.get(*v) {
            Some(bound) => t = bound,
            None => break,
        }
    }
    t
}

/// Occurs check under the current bindings.
fn occurs(terms: &TermStore, var: u32, t: TermId, subst: &Substitution) -> bool {
    let t = deref(terms, t, subst);
    match terms.term(t) {
        Term::Var(v) => *v == var,
        Term::App(_, args) => args.clone().iter().any(|&a| occurs(terms, var, a, subst)),
    }
}

/// Unify two literals argument-wise. Predicates must agree; polarity is the
/// caller's business (resolution unifies complementary pairs).
pub fn unify_literals(env: &Env, l1: LiteralId, l2: LiteralId, subst: &mut Substitution) -> bool {
    let a = env.literal(l1);
    let b = env.literal(l2);
    if a.predicate != b.predicate || a.args.len() != b.args.len() {
        return false;
    }
    let args_a = a.args.clone();
    let args_b = b.args.clone();
    let mark = subst.mark();
    for (&x, &y) in args_a.iter().zip(args_b.iter()) {
        if !unify_rec(&env.terms, x, y, subst) {
            subst.backtrack(mark);
            return false;
        }
    }
    true
}

/// Match a literal pattern onto a target literal (polarity must agree).
pub fn match_literals(
    env: &Env,
    pattern: LiteralId,
    target: LiteralId,
    subst: &mut Substitution,
) -> bool {
    let p = env.literal(pattern);
    let t = env.literal(target);
    if p.predicate != t.predicate || p.polarity != t.polarity || p.args.len() != t.args.len() {
        return false;
    }
    let args_p = p.args.clone();
    let args_t = t.args.clone();
    let mark = subst.mark();
    for (&x, &y) in args_p.iter().zip(args_t.iter()) {
        if !match_rec(&env.terms, x, y, subst) {
            subst.backtrack(mark);
            return false;
        }
    }
    true
}
