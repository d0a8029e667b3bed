//! Hash-consed term store.
//!
//! Every term lives exactly once in the store and is referred to by a
//! `TermId`. Structural equality therefore coincides with id equality, and
//! the weight and groundness of every term are computed once, at interning
//! time. The store is append-only: ids stay valid for the whole run.

use super::substitution::Substitution;
use super::symbols::FunctionId;
use std::collections::{HashMap, HashSet};

/// Id of an interned term. Equal ids mean structurally equal terms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A term: a variable or a function application. Constants are applications
/// of arity 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(u32),
    App(FunctionId, Vec<TermId>),
}

#[derive(Debug, Clone)]
struct TermInfo {
    term: Term,
    /// Sum of symbol weights with unit symbol weight, i.e. the symbol count.
    weight: u32,
    ground: bool,
}

/// Hash-consing store for terms.
#[derive(Debug, Clone, Default)]
pub struct TermStore {
    terms: Vec<TermInfo>,
    lookup: HashMap<Term, TermId>,
}

impl TermStore {
    pub fn new() -> Self {
        TermStore::default()
    }

    /// Intern a variable.
    pub fn var(&mut self, index: u32) -> TermId {
        self.intern(Term::Var(index))
    }

    /// Intern a function application. The argument count must match the
    /// functor's declared arity.
    pub fn app(&mut self, functor: FunctionId, args: Vec<TermId>) -> TermId {
        self.intern(Term::App(functor, args))
    }

    fn intern(&mut self, term: Term) -> TermId {
        if let Some(&id) = self.lookup.get(&term) {
            return id;
        }
        let (weight, ground) = match &term {
            Term::Var(_) => (1, false),
            Term::App(_, args) => {
                let mut weight = 1u32;
                let mut ground = true;
                for &arg in args {
                    let info = &self.terms[arg.0 as usize];
                    weight += info.weight;
                    ground &= info.ground;
                }
                (weight, ground)
            }
        };
        let id = TermId(self.terms.len() as u32);
        self.terms.push(TermInfo {
            term: term.clone(),
            weight,
            ground,
        });
        self.lookup.insert(term, id);
        id
    }

    pub fn term(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize].term
    }

    /// Cached weight: the symbol count of the term (every symbol and
    /// variable weighs 1). Always at least 1.
    pub fn weight(&self, id: TermId) -> u32 {
        self.terms[id.0 as usize].weight
    }

    pub fn is_ground(&self, id: TermId) -> bool {
        self.terms[id.0 as usize].ground
    }

    pub fn is_var(&self, id: TermId) -> bool {
        matches!(self.term(id), Term::Var(_))
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Preorder iterator over all subterms of `id`, including `id` itself.
    pub fn subterms(&self, id: TermId) -> SubtermIter<'_> {
        SubtermIter {
            store: self,
            stack: vec![id],
        }
    }

    /// Collect the variable indices occurring in `id`.
    pub fn collect_variables(&self, id: TermId, vars: &mut HashSet<u32>) {
        for sub in self.subterms(id) {
            if let Term::Var(v) = self.term(sub) {
                vars.insert(*v);
            }
        }
    }

    /// Largest variable index occurring in `id`, if any.
    pub fn max_variable(&self, id: TermId) -> Option<u32> {
        let mut max = None;
        for sub in self.subterms(id) {
            if let Term::Var(v) = self.term(sub) {
                max = Some(max.map_or(*v, |m: u32| m.max(*v)));
            }
        }
        max
    }

    /// Rename all variables in `id` by adding `offset`, producing a fresh
    /// interned term. Used to keep the variables of inference partners
    /// disjoint.
    pub fn rename(&mut self, id: TermId, offset: u32) -> TermId {
        if offset == 0 || self.is_ground(id) {
            return id;
        }
        match self.term(id).clone() {
            Term::Var(v) => self.var(v + offset),
            Term::App(f, args) => {
                let new_args = args.iter().map(|&a| self.rename(a, offset)).collect();
                self.app(f, new_args)
            }
        }
    }

    /// Rename variables through an explicit map. Variables without an entry
    /// are kept. Used for clause variable normalization.
    pub fn rename_with(&mut self, id: TermId, map: &HashMap<u32, u32>) -> TermId {
        if self.is_ground(id) {
            return id;
        }
        match self.term(id).clone() {
            Term::Var(v) => {
                let v = map.get(&v).copied().unwrap_or(v);
                self.var(v)
            }
            Term::App(f, args) => {
                let new_args = args.iter().map(|&a| self.rename_with(a, map)).collect();
                self.app(f, new_args)
            }
        }
    }

    /// Apply a substitution hereditarily, producing a fresh interned term.
    /// Bindings are chased: a variable bound to another bound variable
    /// resolves to the final term.
    pub fn apply(&mut self, id: TermId, subst: &Substitution) -> TermId {
        if subst.is_empty() || self.is_ground(id) {
            return id;
        }
        match self.term(id).clone() {
            Term::Var(v) => match subst.get(v) {
                Some(bound) => self.apply(bound, subst),
                None => id,
            },
            Term::App(f, args) => {
                let new_args = args.iter().map(|&a| self.apply(a, subst)).collect();
                self.app(f, new_args)
            }
        }
    }

    /// Replace the subterm at `path` with `replacement`, producing a fresh
    /// interned term.
    pub fn replace_at(&mut self, id: TermId, path: &[usize], replacement: TermId) -> TermId {
        if path.is_empty() {
            return replacement;
        }
        match self.term(id).clone() {
            Term::Var(_) => unreachable!("path descends into a variable"),
            Term::App(f, args) => {
                let mut new_args = args;
                new_args[path[0]] = self.replace_at(new_args[path[0]], &path[1..], replacement);
                self.app(f, new_args)
            }
        }
    }

    /// All paths at which `target` occurs as a subterm of `root`.
    pub fn positions_of(&self, root: TermId, target: TermId) -> Vec<Vec<usize>> {
        let mut positions = Vec::new();
        self.positions_rec(root, target, &mut Vec::new(), &mut positions);
        positions
    }

    fn positions_rec(
        &self,
        current: TermId,
        target: TermId,
        path: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current == target {
            out.push(path.clone());
            // A term never properly contains itself: no need to recurse.
            return;
        }
        if let Term::App(_, args) = self.term(current) {
            for (i, &arg) in args.clone().iter().enumerate() {
                path.push(i);
                self.positions_rec(arg, target, path, out);
                path.pop();
            }
        }
    }
}

/// Preorder subterm iterator.
pub struct SubtermIter<'a> {
    store: &'a TermStore,
    stack: Vec<TermId>,
}

impl<'a> Iterator for SubtermIter<'a> {
    type Item = TermId;

    fn next(&mut self) -> Option<TermId> {
        let id = self.stack.pop()?;
        if let Term::App(_, args) = self.store.term(id) {
            // Push in reverse so arguments come out left-to-right.
            for &arg in args.iter().rev() {
                self.stack.push(arg);
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::symbols::SymbolTable;

    fn setup() -> (SymbolTable, TermStore) {
        (SymbolTable::new(), TermStore::new())
    }

    #[test]
    fn test_hash_consing_law() {
        let (mut symbols, mut terms) = setup();
        let f = symbols.intern_function("f", 2);
        let a = symbols.intern_function("a", 0);

        let ta = terms.app(a, vec![]);
        let tx = terms.var(0);
        let t1 = terms.app(f, vec![ta, tx]);
        let t2 = terms.app(f, vec![ta, tx]);

        // Structurally equal terms share one id
        assert_eq!(t1, t2);

        let ty = terms.var(1);
        let t3 = terms.app(f, vec![ta, ty]);
        assert_ne!(t1, t3);
    }

    #[test]
    fn test_weight_and_ground_cached() {
        let (mut symbols, mut terms) = setup();
        let f = symbols.intern_function("f", 2);
        let a = symbols.intern_function("a", 0);

        let ta = terms.app(a, vec![]);
        let tx = terms.var(0);
        let fax = terms.app(f, vec![ta, tx]);
        let faa = terms.app(f, vec![ta, ta]);

        assert_eq!(terms.weight(ta), 1);
        assert_eq!(terms.weight(tx), 1);
        assert_eq!(terms.weight(fax), 3);

        assert!(terms.is_ground(ta));
        assert!(!terms.is_ground(fax));
        assert!(terms.is_ground(faa));
    }

    #[test]
    fn test_subterm_iteration() {
        let (mut symbols, mut terms) = setup();
        let f = symbols.intern_function("f", 2);
        let g = symbols.intern_function("g", 1);
        let a = symbols.intern_function("a", 0);

        let ta = terms.app(a, vec![]);
        let tx = terms.var(0);
        let gx = terms.app(g, vec![tx]);
        let t = terms.app(f, vec![ta, gx]);

        let subs: Vec<TermId> = terms.subterms(t).collect();
        assert_eq!(subs, vec![t, ta, gx, tx]);
    }

    #[test]
    fn test_rename() {
        let (mut symbols, mut terms) = setup();
        let g = symbols.intern_function("g", 1);

        let tx = terms.var(0);
        let gx = terms.app(g, vec![tx]);

        let renamed = terms.rename(gx, 5);
        let tx5 = terms.var(5);
        let expected = terms.app(g, vec![tx5]);
        assert_eq!(renamed, expected);

        // Renaming by 0 is the identity
        assert_eq!(terms.rename(gx, 0), gx);
    }

    #[test]
    fn test_apply_substitution() {
        let (mut symbols, mut terms) = setup();
        let g = symbols.intern_function("g", 1);
        let a = symbols.intern_function("a", 0);

        let tx = terms.var(0);
        let ta = terms.app(a, vec![]);
        let gx = terms.app(g, vec![tx]);

        let mut subst = Substitution::new();
        subst.bind(0, ta);

        let result = terms.apply(gx, &subst);
        let ga = terms.app(g, vec![ta]);
        assert_eq!(result, ga);
    }

    #[test]
    fn test_apply_chases_bindings() {
        let (mut symbols, mut terms) = setup();
        let a = symbols.intern_function("a", 0);

        let tx = terms.var(0);
        let ty = terms.var(1);
        let ta = terms.app(a, vec![]);

        let mut subst = Substitution::new();
        subst.bind(0, ty);
        subst.bind(1, ta);

        assert_eq!(terms.apply(tx, &subst), ta);
    }

    #[test]
    fn test_replace_at_and_positions() {
        let (mut symbols, mut terms) = setup();
        let f = symbols.intern_function("f", 2);
        let a = symbols.intern_function("a", 0);
        let b = symbols.intern_function("b", 0);

        let ta = terms.app(a, vec![]);
        let tb = terms.app(b, vec![]);
        let faa = terms.app(f, vec![ta, ta]);

        let positions = terms.positions_of(faa, ta);
        assert_eq!(positions, vec![vec![0], vec![1]]);

        let fba = terms.replace_at(faa, &[0], tb);
        let expected = terms.app(f, vec![tb, ta]);
        assert_eq!(fba, expected);
    }
}
