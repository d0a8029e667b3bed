//! Superposition.
//!
//! `l = r ∨ C1` and `L[s] ∨ C2` with `σ = mgu(l, s)`, `s` not a variable,
//! `lσ` not below `rσ`, yield `(L[r] ∨ C1 ∨ C2)σ`. When `L` is an
//! equality, the rewritten side must additionally not be below its
//! partner under `σ`. Both directions run against the active set: the
//! given clause rewriting indexed subterms (through the superposition
//! subterm index) and indexed equalities rewriting the given clause
//! (through the superposition LHS index).

use super::{other_side, rename_offset, Generated};
use crate::index::{rewritable_subterms, rewriting_sides, Indexes, TermEntry};
use crate::logic::{
    unify, ClauseArena, ClauseId, Env, InferenceRule, Kbo, Literal, LiteralId, Substitution,
    TermId, TermOrder,
};

pub fn superposition(
    env: &mut Env,
    kbo: &Kbo,
    arena: &ClauseArena,
    indexes: &Indexes,
    given: ClauseId,
) -> Vec<Generated> {
    let mut out = Vec::new();
    let g_literals = arena.get(given).literals.clone();
    let g_selected = arena.get(given).selected_literals().to_vec();
    let offset = rename_offset(env, &g_literals);

    // Direction 1: a selected equality of the given clause rewrites an
    // indexed subterm of an active clause.
    for &eq_lit in &g_selected {
        let lit = env.literal(eq_lit);
        if !lit.polarity || !lit.is_equality() {
            continue;
        }
        for l in rewriting_sides(env, kbo, eq_lit) {
            let r = other_side(env, eq_lit, l);
            let candidates: Vec<TermEntry> = indexes
                .superposition_subterm
                .index
                .unifiable(env, l)
                .collect();

            for cand in candidates {
                // Partner rides at `offset`; the given clause keeps its
                // variables.
                let target = env.terms.rename(cand.term, offset);
                let target_lit = env.rename_literal(cand.literal, offset);

                let mut subst = Substitution::new();
                if !unify(&env.terms, l, target, &mut subst) {
                    continue;
                }

                let partner_literals: Vec<LiteralId> = arena
                    .get(cand.clause)
                    .literals
                    .iter()
                    .map(|&x| env.rename_literal(x, offset))
                    .collect();

                let rewrites = rewrite_into(
                    env,
                    kbo,
                    eq_lit,
                    l,
                    r,
                    &subst,
                    target_lit,
                    target,
                    &partner_literals,
                    &g_literals
                        .iter()
                        .filter(|&&x| x != eq_lit)
                        .copied()
                        .collect::<Vec<_>>(),
                );
                for literals in rewrites {
                    out.push(Generated {
                        literals,
                        rule: InferenceRule::Superposition,
                        parents: vec![given, cand.clause],
                    });
                }
            }
        }
    }

    // Direction 2: an indexed equality rewrites a subterm of the given
    // clause's selected literals.
    for &lit in &g_selected {
        for s in rewritable_subterms(env, kbo, lit) {
            let candidates: Vec<TermEntry> = indexes
                .superposition_lhs
                .index
                .unifiable(env, s)
                .collect();

            for cand in candidates {
                let l = env.terms.rename(cand.term, offset);
                let eq_lit = env.rename_literal(cand.literal, offset);
                let r = other_side(env, eq_lit, l);

                let mut subst = Substitution::new();
                if !unify(&env.terms, l, s, &mut subst) {
                    continue;
                }

                let partner_side: Vec<LiteralId> = arena
                    .get(cand.clause)
                    .literals
                    .iter()
                    .filter(|&&x| x != cand.literal)
                    .map(|&x| env.rename_literal(x, offset))
                    .collect();

                let rewrites = rewrite_into(
                    env,
                    kbo,
                    eq_lit,
                    l,
                    r,
                    &subst,
                    lit,
                    s,
                    &g_literals,
                    &partner_side,
                );
                for literals in rewrites {
                    out.push(Generated {
                        literals,
                        rule: InferenceRule::Superposition,
                        parents: vec![cand.clause, given],
                    });
                }
            }
        }
    }

    out
}

/// Build the conclusions for one unifier: every occurrence of `target_sub`
/// inside `target_lit` yields one rewritten clause.
///
/// `rewriter_side` contains the side literals of the equality clause
/// (already renamed where applicable); `target_literals` the literals of
/// the clause being rewritten, `target_lit` included.
#[allow(clippy::too_many_arguments)]
fn rewrite_into(
    env: &mut Env,
    kbo: &Kbo,
    eq_lit: LiteralId,
    l: TermId,
    r: TermId,
    subst: &Substitution,
    target_lit: LiteralId,
    target_sub: TermId,
    target_literals: &[LiteralId],
    rewriter_side: &[LiteralId],
) -> Vec<Vec<LiteralId>> {
    // The rewritten position must not be a variable.
    if env.terms.is_var(target_sub) {
        return Vec::new();
    }

    // lσ must not be below (or equal to) rσ.
    let l_sigma = env.terms.apply(l, subst);
    let r_sigma = env.terms.apply(r, subst);
    if matches!(
        kbo.compare(env, l_sigma, r_sigma),
        TermOrder::Less | TermOrder::Equal
    ) {
        return Vec::new();
    }

    let target = env.literal(target_lit).clone();
    let mut conclusions = Vec::new();

    for (arg_index, &arg) in target.args.iter().enumerate() {
        for path in env.terms.positions_of(arg, target_sub) {
            // Rewriting inside an equality: the touched side must not be
            // below its partner under σ.
            if target.is_equality() {
                let this_side = env.terms.apply(target.args[arg_index], subst);
                let other = env.terms.apply(target.args[1 - arg_index], subst);
                if kbo.compare(env, this_side, other) == TermOrder::Less {
                    continue;
                }
            }

            // Apply σ argument-wise, then splice rσ in at the (σ-stable)
            // position of the rewritten occurrence.
            let mut new_args: Vec<TermId> = Vec::with_capacity(target.args.len());
            for (k, &a) in target.args.iter().enumerate() {
                let applied = env.terms.apply(a, subst);
                if k == arg_index {
                    new_args.push(env.terms.replace_at(applied, &path, r_sigma));
                } else {
                    new_args.push(applied);
                }
            }
            let rewritten = env.intern_literal(Literal {
                predicate: target.predicate,
                polarity: target.polarity,
                args: new_args,
            });

            let mut literals = vec![rewritten];
            for &x in target_literals {
                if x != target_lit {
                    literals.push(env.apply_literal(x, subst));
                }
            }
            for &x in rewriter_side {
                if x != eq_lit {
                    literals.push(env.apply_literal(x, subst));
                }
            }
            conclusions.push(literals);
        }
    }
    conclusions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Inference, KboConfig};
    use crate::selection::LiteralSelector;

    struct Ctx {
        env: Env,
        kbo: Kbo,
        arena: ClauseArena,
        indexes: Indexes,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                env: Env::new(),
                kbo: Kbo::new(KboConfig::default()),
                arena: ClauseArena::new(),
                indexes: Indexes::new(),
            }
        }

        fn var(&mut self, n: u32) -> TermId {
            self.env.terms.var(n)
        }

        fn const_(&mut self, name: &str) -> TermId {
            let id = self.env.symbols.intern_function(name, 0);
            self.env.terms.app(id, vec![])
        }

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let id = self.env.symbols.intern_function(name, args.len() as u8);
            self.env.terms.app(id, args)
        }

        fn activate(&mut self, literals: Vec<LiteralId>) -> ClauseId {
            let id = self
                .arena
                .create(&mut self.env, &self.kbo, literals, Inference::input());
            LiteralSelector::new(0).select_clause(&self.env, &self.kbo, &mut self.arena, id);
            self.indexes
                .on_activated(&self.env, &self.kbo, &self.arena, id);
            id
        }
    }

    #[test]
    fn test_rewrite_into_predicate_argument() {
        let mut ctx = Ctx::new();
        // mult(e, X) = X  and  p(mult(e, c))  give  p(c)
        let e = ctx.const_("e");
        let c = ctx.const_("c");
        let x = ctx.var(0);
        let mult_ex = ctx.func("mult", vec![e, x]);
        let mult_ec = ctx.func("mult", vec![e, c]);

        let eq = ctx.env.intern_literal(Literal::equality(true, mult_ex, x));
        let p = ctx.env.symbols.intern_predicate("p", 1);
        let p_mult = ctx
            .env
            .intern_literal(Literal::positive(p, vec![mult_ec]));

        let _target = ctx.activate(vec![p_mult]);
        let rewriter = ctx.activate(vec![eq]);

        let results = superposition(&mut ctx.env, &ctx.kbo, &ctx.arena, &ctx.indexes, rewriter);

        let pc = ctx.env.intern_literal(Literal::positive(p, vec![c]));
        assert!(
            results.iter().any(|g| g.literals == vec![pc]),
            "expected p(c), got {} conclusions",
            results.len()
        );
    }

    #[test]
    fn test_rewrite_from_active_into_given() {
        let mut ctx = Ctx::new();
        // Active: f(a) = a. Given: p(f(a)). Expect p(a).
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);
        let eq = ctx.env.intern_literal(Literal::equality(true, fa, a));
        let p = ctx.env.symbols.intern_predicate("p", 1);
        let pfa = ctx.env.intern_literal(Literal::positive(p, vec![fa]));

        let _rewriter = ctx.activate(vec![eq]);
        let target = ctx.activate(vec![pfa]);

        let results = superposition(&mut ctx.env, &ctx.kbo, &ctx.arena, &ctx.indexes, target);

        let pa = ctx.env.intern_literal(Literal::positive(p, vec![a]));
        assert!(results.iter().any(|g| g.literals == vec![pa]));
    }

    #[test]
    fn test_superposition_into_equality_right_side() {
        let mut ctx = Ctx::new();
        // From f(X) = X into a = f(b): rewriting the larger right side
        // gives a = b.
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);
        let fx = ctx.func("f", vec![x]);
        let fb = ctx.func("f", vec![b]);

        let rule = ctx.env.intern_literal(Literal::equality(true, fx, x));
        let target = ctx.env.intern_literal(Literal::equality(true, a, fb));

        let _t = ctx.activate(vec![target]);
        let rewriter = ctx.activate(vec![rule]);

        let results = superposition(&mut ctx.env, &ctx.kbo, &ctx.arena, &ctx.indexes, rewriter);

        // a = b (oriented either way by interning order; compare as sets)
        assert!(results.iter().any(|g| {
            g.literals.len() == 1 && {
                let lit = ctx.env.literal(g.literals[0]);
                lit.is_equality()
                    && lit.polarity
                    && (lit.args == vec![a, b] || lit.args == vec![b, a])
            }
        }));
    }

    #[test]
    fn test_no_rewrite_at_variable_position() {
        let mut ctx = Ctx::new();
        // f(a) = a must not superpose into the variable of p(X).
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);
        let x = ctx.var(0);
        let eq = ctx.env.intern_literal(Literal::equality(true, fa, a));
        let p = ctx.env.symbols.intern_predicate("p", 1);
        let px = ctx.env.intern_literal(Literal::positive(p, vec![x]));

        let _target = ctx.activate(vec![px]);
        let rewriter = ctx.activate(vec![eq]);

        let results = superposition(&mut ctx.env, &ctx.kbo, &ctx.arena, &ctx.indexes, rewriter);
        // Self-superposition of the equality may produce a = a, but p(X)
        // itself is never rewritten.
        assert!(results.iter().all(|g| {
            g.literals
                .iter()
                .all(|&l| ctx.env.literal(l).predicate != p)
        }));
    }

    #[test]
    fn test_ordering_blocks_backward_rewrite() {
        let mut ctx = Ctx::new();
        // With f(a) = a oriented left-to-right, the smaller side `a`
        // never rewrites to f(a).
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);
        let eq = ctx.env.intern_literal(Literal::equality(true, fa, a));
        let q = ctx.env.symbols.intern_predicate("q", 1);
        let qa = ctx.env.intern_literal(Literal::positive(q, vec![a]));

        let _target = ctx.activate(vec![qa]);
        let rewriter = ctx.activate(vec![eq]);

        let results = superposition(&mut ctx.env, &ctx.kbo, &ctx.arena, &ctx.indexes, rewriter);
        // The only possible rewrite is a -> f(a), blocked by the ordering
        // (and by the LHS policy, which indexes only the larger side).
        assert!(results.iter().all(|g| {
            g.literals
                .iter()
                .all(|&l| ctx.env.literal(l).args != vec![fa])
        }));
    }
}
