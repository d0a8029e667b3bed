//! Narrow clausal input reader.
//!
//! The core consumes clauses, not formula syntax; this module reads just
//! the `cnf(name, role, disjunction).` subset of TPTP so the binary has a
//! problem format. Parsing happens in two phases: nom combinators build a
//! raw tree, then lowering interns symbols and terms into the `Env`.

use crate::logic::{Env, Literal, LiteralId};
use crate::saturation::{ClauseInput, ClauseRole};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::{map, opt},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error near '{0}'")]
    Syntax(String),

    #[error("trailing input near '{0}'")]
    TrailingInput(String),

    #[error("symbol '{name}' used with arities {first} and {second}")]
    ArityMismatch {
        name: String,
        first: usize,
        second: usize,
    },
}

// === Raw tree ===

#[derive(Debug, Clone)]
enum RawTerm {
    Var(String),
    App(String, Vec<RawTerm>),
}

#[derive(Debug, Clone)]
enum RawAtom {
    Pred(String, Vec<RawTerm>),
    Eq(RawTerm, RawTerm),
}

#[derive(Debug, Clone)]
struct RawLiteral {
    polarity: bool,
    atom: RawAtom,
}

#[derive(Debug)]
struct RawClause {
    role: String,
    literals: Vec<RawLiteral>,
}

// === Lexing helpers ===

/// Whitespace and `%` line comments.
fn sp(input: &str) -> IResult<&str, ()> {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        if let Some(comment) = trimmed.strip_prefix('%') {
            rest = match comment.find('\n') {
                Some(pos) => &comment[pos + 1..],
                None => "",
            };
        } else if trimmed.len() != rest.len() {
            rest = trimmed;
        } else {
            return Ok((rest, ()));
        }
    }
}

fn token<'a, O>(
    mut inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    move |input| {
        let (input, _) = sp(input)?;
        inner(input)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Function, predicate, and name tokens: lower-case head.
fn lower_word(input: &str) -> IResult<&str, &str> {
    let (rest, head) = take_while1(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())(input)?;
    let (rest, tail) = take_while(is_ident_char)(rest)?;
    Ok((rest, &input[..head.len() + tail.len()]))
}

/// Variables: upper-case head.
fn upper_word(input: &str) -> IResult<&str, &str> {
    let (rest, head) = take_while1(|c: char| c.is_ascii_uppercase())(input)?;
    let (rest, tail) = take_while(is_ident_char)(rest)?;
    Ok((rest, &input[..head.len() + tail.len()]))
}

// === Grammar ===

fn term(input: &str) -> IResult<&str, RawTerm> {
    alt((
        map(token(upper_word), |name| RawTerm::Var(name.to_string())),
        map(
            pair(
                token(lower_word),
                opt(delimited(
                    token(char('(')),
                    separated_list1(token(char(',')), term),
                    token(char(')')),
                )),
            ),
            |(name, args)| RawTerm::App(name.to_string(), args.unwrap_or_default()),
        ),
    ))(input)
}

fn atom(original: &str) -> IResult<&str, RawLiteral> {
    let (input, lhs) = term(original)?;
    let (input, eq) = opt(alt((
        map(token(tag("!=")), |_| false),
        map(token(char('=')), |_| true),
    )))(input)?;

    match eq {
        Some(polarity) => {
            let (input, rhs) = term(input)?;
            Ok((
                input,
                RawLiteral {
                    polarity,
                    atom: RawAtom::Eq(lhs, rhs),
                },
            ))
        }
        None => match lhs {
            RawTerm::App(name, args) => Ok((
                input,
                RawLiteral {
                    polarity: true,
                    atom: RawAtom::Pred(name, args),
                },
            )),
            // A bare variable is not an atom.
            RawTerm::Var(_) => Err(nom::Err::Error(nom::error::Error::new(
                original,
                nom::error::ErrorKind::Tag,
            ))),
        },
    }
}

fn literal(input: &str) -> IResult<&str, RawLiteral> {
    let (input, negation) = opt(token(char('~')))(input)?;
    let (input, mut lit) = atom(input)?;
    if negation.is_some() {
        lit.polarity = !lit.polarity;
    }
    Ok((input, lit))
}

fn disjunction(input: &str) -> IResult<&str, Vec<RawLiteral>> {
    alt((
        delimited(token(char('(')), disjunction, token(char(')'))),
        separated_list1(token(char('|')), literal),
    ))(input)
}

fn cnf_statement(input: &str) -> IResult<&str, RawClause> {
    let (input, _) = token(tag("cnf"))(input)?;
    let (input, (_, _name, _, role, _, literals, _)) = tuple((
        token(char('(')),
        token(lower_word),
        token(char(',')),
        token(lower_word),
        token(char(',')),
        disjunction,
        token(char(')')),
    ))(input)?;
    let (input, _) = token(char('.'))(input)?;
    Ok((
        input,
        RawClause {
            role: role.to_string(),
            literals,
        },
    ))
}

fn problem(input: &str) -> IResult<&str, Vec<RawClause>> {
    terminated(many0(cnf_statement), sp)(input)
}

// === Lowering ===

struct Lowering<'a> {
    env: &'a mut Env,
    arities: HashMap<String, usize>,
}

impl<'a> Lowering<'a> {
    fn check_arity(&mut self, name: &str, arity: usize) -> Result<(), ParseError> {
        match self.arities.get(name) {
            Some(&known) if known != arity => Err(ParseError::ArityMismatch {
                name: name.to_string(),
                first: known,
                second: arity,
            }),
            Some(_) => Ok(()),
            None => {
                self.arities.insert(name.to_string(), arity);
                Ok(())
            }
        }
    }

    fn lower_term(
        &mut self,
        raw: &RawTerm,
        vars: &mut HashMap<String, u32>,
    ) -> Result<crate::logic::TermId, ParseError> {
        match raw {
            RawTerm::Var(name) => {
                let next = vars.len() as u32;
                let index = *vars.entry(name.clone()).or_insert(next);
                Ok(self.env.terms.var(index))
            }
            RawTerm::App(name, args) => {
                self.check_arity(name, args.len())?;
                let functor = self
                    .env
                    .symbols
                    .intern_function(name, args.len() as u8);
                let args = args
                    .iter()
                    .map(|a| self.lower_term(a, vars))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.env.terms.app(functor, args))
            }
        }
    }

    fn lower_clause(&mut self, raw: &RawClause) -> Result<ClauseInput, ParseError> {
        let mut vars = HashMap::new();
        let mut literals: Vec<LiteralId> = Vec::with_capacity(raw.literals.len());

        for lit in &raw.literals {
            let interned = match &lit.atom {
                RawAtom::Eq(lhs, rhs) => {
                    let s = self.lower_term(lhs, &mut vars)?;
                    let t = self.lower_term(rhs, &mut vars)?;
                    self.env.intern_literal(Literal::equality(lit.polarity, s, t))
                }
                RawAtom::Pred(name, args) => {
                    // Predicates share the arity namespace with functions
                    // only through this per-name consistency check.
                    self.check_arity(&format!("p${}", name), args.len())?;
                    let predicate = self
                        .env
                        .symbols
                        .intern_predicate(name, args.len() as u8);
                    let args = args
                        .iter()
                        .map(|a| self.lower_term(a, &mut vars))
                        .collect::<Result<Vec<_>, _>>()?;
                    let raw_literal = Literal {
                        predicate,
                        polarity: lit.polarity,
                        args,
                    };
                    self.env.intern_literal(raw_literal)
                }
            };
            literals.push(interned);
        }

        let role = match raw.role.as_str() {
            "negated_conjecture" | "conjecture" => ClauseRole::NegatedConjecture,
            _ => ClauseRole::Axiom,
        };

        Ok(ClauseInput { literals, role })
    }
}

/// Parse a CNF problem, interning everything into `env`.
pub fn parse_cnf(input: &str, env: &mut Env) -> Result<Vec<ClauseInput>, ParseError> {
    let (rest, raw) =
        problem(input).map_err(|_| ParseError::Syntax(snippet(input)))?;
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput(snippet(rest)));
    }

    let mut lowering = Lowering {
        env,
        arities: HashMap::new(),
    };
    raw.iter().map(|c| lowering.lower_clause(c)).collect()
}

fn snippet(input: &str) -> String {
    input.trim_start().chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_problem() {
        let mut env = Env::new();
        let inputs = parse_cnf(
            r#"
            % a comment
            cnf(p_a, axiom, p(a)).
            cnf(rule, axiom, ~p(X) | q(X)).
            cnf(goal, negated_conjecture, ~q(a)).
            "#,
            &mut env,
        )
        .unwrap();

        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0].role, ClauseRole::Axiom);
        assert_eq!(inputs[2].role, ClauseRole::NegatedConjecture);
        assert_eq!(inputs[1].literals.len(), 2);

        // Symbols are interned once across clauses
        assert!(env.symbols.get_predicate("p").is_some());
        assert!(env.symbols.get_predicate("q").is_some());
        assert!(env.symbols.get_function("a").is_some());
    }

    #[test]
    fn test_parse_equality_literals() {
        let mut env = Env::new();
        let inputs = parse_cnf(
            r#"
            cnf(trans, axiom, a = b).
            cnf(goal, negated_conjecture, a != c).
            "#,
            &mut env,
        )
        .unwrap();

        assert_eq!(inputs.len(), 2);
        let eq = env.literal(inputs[0].literals[0]);
        assert!(eq.is_equality() && eq.polarity);
        let neq = env.literal(inputs[1].literals[0]);
        assert!(neq.is_equality() && !neq.polarity);
    }

    #[test]
    fn test_variables_are_clause_local() {
        let mut env = Env::new();
        let inputs = parse_cnf(
            r#"
            cnf(one, axiom, p(X)).
            cnf(two, axiom, q(X)).
            "#,
            &mut env,
        )
        .unwrap();

        // Both clauses use variable index 0
        let a = env.literal(inputs[0].literals[0]).args[0];
        let b = env.literal(inputs[1].literals[0]).args[0];
        assert_eq!(a, b);
    }

    #[test]
    fn test_negated_equality_with_tilde() {
        let mut env = Env::new();
        let inputs = parse_cnf("cnf(c, axiom, ~ a = b).", &mut env).unwrap();
        let lit = env.literal(inputs[0].literals[0]);
        assert!(lit.is_equality() && !lit.polarity);
    }

    #[test]
    fn test_parenthesized_disjunction() {
        let mut env = Env::new();
        let inputs = parse_cnf("cnf(c, axiom, (p(a) | q(b))).", &mut env).unwrap();
        assert_eq!(inputs[0].literals.len(), 2);
    }

    #[test]
    fn test_nested_terms() {
        let mut env = Env::new();
        let inputs =
            parse_cnf("cnf(c, axiom, p(f(g(X), a))).", &mut env).unwrap();
        let lit = env.literal(inputs[0].literals[0]).clone();
        assert_eq!(env.terms.weight(lit.args[0]), 4);
    }

    #[test]
    fn test_syntax_error_reported() {
        let mut env = Env::new();
        assert!(parse_cnf("cnf(broken, axiom, p(a)", &mut env).is_err());
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut env = Env::new();
        let result = parse_cnf(
            "cnf(one, axiom, p(f(a))). cnf(two, axiom, p(f(a, b))).",
            &mut env,
        );
        assert!(matches!(result, Err(ParseError::ArityMismatch { .. })));
    }
}
