//! Clauses, inference records, and the clause arena.
//!
//! Clauses live in an arena indexed by `ClauseId`; the `inference` field of
//! every clause refers to its parents by id, so the records form an acyclic
//! derivation DAG (parents always precede children in creation order).
//! Literals within a clause are deduplicated, canonically sorted, and
//! variable-normalized at construction time.

use super::env::Env;
use super::literal::{Literal, LiteralId};
use super::ordering::{Kbo, TermOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Id of a clause in the arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClauseId(pub(crate) u32);

impl ClauseId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which container currently holds a clause.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StoreTag {
    #[default]
    None,
    Unprocessed,
    Passive,
    Active,
}

/// The rule that produced a clause.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum InferenceRule {
    Input,
    TheoryAxiom,
    NegatedConjecture,
    Resolution,
    Factoring,
    Superposition,
    EqualityResolution,
    EqualityFactoring,
    ForwardDemodulation,
    BackwardDemodulation,
    SubsumptionResolution,
    Condensation,
}

impl InferenceRule {
    pub fn name(self) -> &'static str {
        match self {
            InferenceRule::Input => "input",
            InferenceRule::TheoryAxiom => "theory_axiom",
            InferenceRule::NegatedConjecture => "negated_conjecture",
            InferenceRule::Resolution => "resolution",
            InferenceRule::Factoring => "factoring",
            InferenceRule::Superposition => "superposition",
            InferenceRule::EqualityResolution => "equality_resolution",
            InferenceRule::EqualityFactoring => "equality_factoring",
            InferenceRule::ForwardDemodulation => "forward_demodulation",
            InferenceRule::BackwardDemodulation => "backward_demodulation",
            InferenceRule::SubsumptionResolution => "subsumption_resolution",
            InferenceRule::Condensation => "condensation",
        }
    }

    pub fn is_input(self) -> bool {
        matches!(
            self,
            InferenceRule::Input | InferenceRule::TheoryAxiom | InferenceRule::NegatedConjecture
        )
    }
}

impl fmt::Display for InferenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Derivation record: rule plus parent clause ids.
#[derive(Debug, Clone, Serialize)]
pub struct Inference {
    pub rule: InferenceRule,
    pub parents: Vec<ClauseId>,
}

impl Inference {
    pub fn input() -> Self {
        Inference {
            rule: InferenceRule::Input,
            parents: Vec::new(),
        }
    }

    pub fn new(rule: InferenceRule, parents: Vec<ClauseId>) -> Self {
        Inference { rule, parents }
    }
}

/// An ordered multiset of literals with derivation bookkeeping.
///
/// `selected` counts the leading literals that participate in generating
/// inferences; it is set when the clause is activated. The theory-ancestor
/// counters feed the split-queue niceness heuristic, and the goal bit feeds
/// the effective selection weight.
#[derive(Debug, Clone)]
pub struct Clause {
    pub literals: Vec<LiteralId>,
    pub age: u32,
    pub weight: u32,
    pub selected: u32,
    pub store: StoreTag,
    pub inference: Inference,
    pub derived_from_goal: bool,
    pub theory_ancestors: f32,
    pub ancestors: f32,
}

impl Clause {
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// The selected prefix of the literals.
    pub fn selected_literals(&self) -> &[LiteralId] {
        &self.literals[..self.selected as usize]
    }

    /// Is this a single positive equality literal?
    pub fn is_unit_equality(&self, env: &Env) -> bool {
        self.is_unit() && {
            let lit = env.literal(self.literals[0]);
            lit.polarity && lit.is_equality()
        }
    }

    /// Fraction of theory ancestors in the derivation, in [0, 1].
    pub fn theory_ratio(&self) -> f32 {
        if self.ancestors <= 0.0 {
            0.0
        } else {
            self.theory_ancestors / self.ancestors
        }
    }

    /// Largest weight among the selected literals (0 if none selected).
    pub fn max_selected_literal_weight(&self, env: &Env) -> u32 {
        self.selected_literals()
            .iter()
            .map(|&l| env.literal_weight(l))
            .max()
            .unwrap_or(0)
    }

    /// Syntactic tautology check: complementary literal pair, or a
    /// reflexive positive equality. O(n) thanks to literal interning.
    pub fn is_tautology(&self, env: &Env) -> bool {
        for &lit in &self.literals {
            if let Some(comp) = env.literals.get_complement(lit) {
                if self.literals.contains(&comp) {
                    return true;
                }
            }
            let l = env.literal(lit);
            if l.polarity && l.is_equality() && l.args[0] == l.args[1] {
                return true;
            }
        }
        false
    }

    /// Format this clause with an environment for name resolution.
    pub fn display<'a>(&'a self, env: &'a Env) -> ClauseDisplay<'a> {
        ClauseDisplay { clause: self, env }
    }
}

/// Display wrapper for clauses.
pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    env: &'a Env,
}

impl fmt::Display for ClauseDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            write!(f, "$false")
        } else {
            for (i, &lit) in self.clause.literals.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{}", self.env.display_literal(lit))?;
            }
            Ok(())
        }
    }
}

/// Append-only storage for all clauses of a run.
#[derive(Debug, Default)]
pub struct ClauseArena {
    clauses: Vec<Clause>,
}

impl ClauseArena {
    pub fn new() -> Self {
        ClauseArena::default()
    }

    pub fn get(&self, id: ClauseId) -> &Clause {
        &self.clauses[id.index()]
    }

    pub fn get_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id.index()]
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClauseId> {
        (0..self.clauses.len() as u32).map(ClauseId)
    }

    /// Create a clause from raw literals.
    ///
    /// Normalization pipeline: orient equality literals by the ordering,
    /// remove duplicate literals, sort into the canonical order, and
    /// renumber variables in order of first occurrence. Age, goal bit, and
    /// ancestor counters derive from the parents.
    pub fn create(
        &mut self,
        env: &mut Env,
        kbo: &Kbo,
        literals: Vec<LiteralId>,
        inference: Inference,
    ) -> ClauseId {
        let mut literals = normalize_literals(env, kbo, literals);

        let weight = literals.iter().map(|&l| env.literal_weight(l)).sum();

        let (age, derived_from_goal, theory_ancestors, ancestors) = match inference.rule {
            InferenceRule::Input => (0, false, 0.0, 1.0),
            InferenceRule::TheoryAxiom => (0, false, 1.0, 1.0),
            InferenceRule::NegatedConjecture => (0, true, 0.0, 1.0),
            _ => {
                let mut age = u32::MAX;
                let mut goal = false;
                let mut th = 0.0;
                let mut all = 0.0;
                for &p in &inference.parents {
                    let parent = self.get(p);
                    age = age.min(parent.age);
                    goal |= parent.derived_from_goal;
                    th += parent.theory_ancestors;
                    all += parent.ancestors;
                }
                let age = if inference.parents.is_empty() {
                    0
                } else {
                    age + 1
                };
                (age, goal, th, all.max(1.0))
            }
        };

        // Variable normalization keeps structurally equal derivations
        // identical, which lets interning and tautology checks fire.
        renumber_variables(env, &mut literals);

        let id = ClauseId(self.clauses.len() as u32);
        self.clauses.push(Clause {
            literals,
            age,
            weight,
            selected: 0,
            store: StoreTag::None,
            inference,
            derived_from_goal,
            theory_ancestors,
            ancestors,
        });
        id
    }
}

/// Orient equalities, deduplicate, and canonically sort a literal list.
fn normalize_literals(env: &mut Env, kbo: &Kbo, literals: Vec<LiteralId>) -> Vec<LiteralId> {
    let mut literals: Vec<LiteralId> = literals
        .into_iter()
        .map(|l| orient_equality(env, kbo, l))
        .collect();

    // Canonical order: negative before positive, then predicate, then
    // weight, then interning id as a stable structural tiebreaker.
    literals.sort_by_key(|&l| {
        let lit = env.literal(l);
        (
            lit.polarity,
            lit.predicate.as_u32(),
            env.literal_weight(l),
            l.as_u32(),
        )
    });
    literals.dedup();
    literals
}

/// Swap the sides of an equality literal so that the larger side (when the
/// ordering decides) comes first.
pub fn orient_equality(env: &mut Env, kbo: &Kbo, lit: LiteralId) -> LiteralId {
    let l = env.literal(lit);
    if !l.is_equality() {
        return lit;
    }
    let (s, t, polarity) = (l.args[0], l.args[1], l.polarity);
    if kbo.compare(env, s, t) == TermOrder::Less {
        env.intern_literal(Literal::equality(polarity, t, s))
    } else {
        lit
    }
}

/// Renumber variables to 0..n in order of first occurrence.
fn renumber_variables(env: &mut Env, literals: &mut [LiteralId]) {
    use super::term::Term;

    let mut map: HashMap<u32, u32> = HashMap::new();
    let mut next = 0u32;
    for &lit in literals.iter() {
        for &arg in &env.literal(lit).args.clone() {
            for sub in env.terms.subterms(arg).collect::<Vec<_>>() {
                if let Term::Var(v) = env.terms.term(sub) {
                    let v = *v;
                    map.entry(v).or_insert_with(|| {
                        let n = next;
                        next += 1;
                        n
                    });
                }
            }
        }
    }
    if map.iter().all(|(k, v)| k == v) {
        return;
    }
    for lit in literals.iter_mut() {
        *lit = env.rename_literal_with(*lit, &map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ordering::KboConfig;
    use crate::logic::term::TermId;

    struct Ctx {
        env: Env,
        kbo: Kbo,
        arena: ClauseArena,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                env: Env::new(),
                kbo: Kbo::new(KboConfig::default()),
                arena: ClauseArena::new(),
            }
        }

        fn const_(&mut self, name: &str) -> TermId {
            let id = self.env.symbols.intern_function(name, 0);
            self.env.terms.app(id, vec![])
        }

        fn lit(&mut self, pred: &str, args: Vec<TermId>, polarity: bool) -> LiteralId {
            let p = self
                .env
                .symbols
                .intern_predicate(pred, args.len() as u8);
            self.env.intern_literal(Literal {
                predicate: p,
                polarity,
                args,
            })
        }
    }

    #[test]
    fn test_duplicate_literals_removed() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let l1 = ctx.lit("p", vec![a], true);
        let l2 = ctx.lit("q", vec![a], true);

        let id = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![l1, l2, l1], Inference::input());
        assert_eq!(ctx.arena.get(id).len(), 2);
    }

    #[test]
    fn test_age_from_parents() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let l = ctx.lit("p", vec![a], true);

        let p1 = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![l], Inference::input());
        let p2 = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![l], Inference::input());
        assert_eq!(ctx.arena.get(p1).age, 0);

        let child = ctx.arena.create(
            &mut ctx.env,
            &ctx.kbo,
            vec![l],
            Inference::new(InferenceRule::Resolution, vec![p1, p2]),
        );
        assert_eq!(ctx.arena.get(child).age, 1);

        let grandchild = ctx.arena.create(
            &mut ctx.env,
            &ctx.kbo,
            vec![l],
            Inference::new(InferenceRule::Resolution, vec![child, p1]),
        );
        // min of parent ages + 1
        assert_eq!(ctx.arena.get(grandchild).age, 1);
    }

    #[test]
    fn test_goal_and_theory_propagation() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let l = ctx.lit("p", vec![a], true);

        let th = ctx.arena.create(
            &mut ctx.env,
            &ctx.kbo,
            vec![l],
            Inference::new(InferenceRule::TheoryAxiom, vec![]),
        );
        let goal = ctx.arena.create(
            &mut ctx.env,
            &ctx.kbo,
            vec![l],
            Inference::new(InferenceRule::NegatedConjecture, vec![]),
        );

        let child = ctx.arena.create(
            &mut ctx.env,
            &ctx.kbo,
            vec![l],
            Inference::new(InferenceRule::Resolution, vec![th, goal]),
        );

        let c = ctx.arena.get(child);
        assert!(c.derived_from_goal);
        assert_eq!(c.theory_ancestors, 1.0);
        assert_eq!(c.ancestors, 2.0);
        assert!((c.theory_ratio() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tautology_detection() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let pos = ctx.lit("p", vec![a], true);
        let neg = ctx.lit("p", vec![a], false);
        let other = ctx.lit("q", vec![a], true);

        let taut = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![pos, neg], Inference::input());
        assert!(ctx.arena.get(taut).is_tautology(&ctx.env));

        let fine = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![pos, other], Inference::input());
        assert!(!ctx.arena.get(fine).is_tautology(&ctx.env));
    }

    #[test]
    fn test_reflexive_equality_is_tautology() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let refl = ctx
            .env
            .intern_literal(Literal::equality(true, a, a));
        let id = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![refl], Inference::input());
        assert!(ctx.arena.get(id).is_tautology(&ctx.env));
    }

    #[test]
    fn test_equality_orientation() {
        let mut ctx = Ctx::new();
        let a = ctx.const_("a");
        let f = ctx.env.symbols.intern_function("f", 1);
        let fa = ctx.env.terms.app(f, vec![a]);

        // a = f(a) gets oriented to f(a) = a
        let eq = ctx.env.intern_literal(Literal::equality(true, a, fa));
        let id = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![eq], Inference::input());
        let lit = ctx.env.literal(ctx.arena.get(id).literals[0]).clone();
        assert_eq!(lit.args[0], fa);
        assert_eq!(lit.args[1], a);
    }

    #[test]
    fn test_variable_renumbering_shares_variants() {
        let mut ctx = Ctx::new();
        let x7 = ctx.env.terms.var(7);
        let x0 = ctx.env.terms.var(0);
        let l7 = ctx.lit("p", vec![x7], true);
        let l0 = ctx.lit("p", vec![x0], true);

        let c7 = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![l7], Inference::input());
        let c0 = ctx
            .arena
            .create(&mut ctx.env, &ctx.kbo, vec![l0], Inference::input());

        // After renumbering both clauses hold the same literal id
        assert_eq!(
            ctx.arena.get(c7).literals,
            ctx.arena.get(c0).literals
        );
    }
}
