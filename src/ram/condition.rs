//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::Expression;
use smallvec::SmallVec;
use static_assertions::assert_eq_size;
use std::fmt;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The comparison operators of a [`Condition::Constraint`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ConstraintOp {
    /// `lhs = rhs`, the only operator the index rewrite can consume
    Eq,
    /// `lhs != rhs`
    Ne,
    /// `lhs < rhs`
    Lt,
    /// `lhs <= rhs`
    Le,
    /// `lhs > rhs`
    Gt,
    /// `lhs >= rhs`
    Ge,
    /// `lhs` matches the regular expression `rhs`
    Match,
    /// Negated [`Self::Match`]
    NotMatch,
    /// The string `rhs` contains `lhs`
    Contains,
    /// Negated [`Self::Contains`]
    NotContains,
}

assert_eq_size!(ConstraintOp, u8);

impl ConstraintOp {
    /// The operator's spelling in the canonical text form.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Match => "MATCH",
            Self::NotMatch => "NOT MATCH",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT CONTAINS",
        }
    }
}

/// A boolean-producing node of the RAM IR.
///
/// Filters, breaks, exits, choices and aggregates are all guarded by one of
/// these. The lowering delivers conjunctions in *split form*: a filter
/// never carries a `Conjunction` at its outermost position, `IF a AND b` is
/// expressed as two nested filters instead. The hoisting pass depends on
/// this, see [`split_conjunction`].
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Condition {
    /// The always-true condition.
    True,
    /// The always-false condition.
    False,
    /// Binary logical and.
    Conjunction(Box<Condition>, Box<Condition>),
    /// Logical negation.
    Negation(Box<Condition>),
    /// A comparison between two expressions.
    Constraint {
        /// The comparison operator.
        op: ConstraintOp,
        /// The left-hand operand.
        lhs: Box<Expression>,
        /// The right-hand operand.
        rhs: Box<Expression>,
    },
    /// Does any tuple of `relation` match `pattern`? Pattern slots holding
    /// [`Expression::Undef`] are unconstrained, and the pattern always has
    /// exactly one slot per attribute of the relation.
    ExistenceCheck {
        /// The probed relation's name.
        relation: String,
        /// One expression per attribute, `Undef` where free.
        pattern: SmallVec<[Expression; 4]>,
    },
    /// An existence check against the provenance-extended form of the
    /// relation, used by the explain machinery.
    ProvenanceExistenceCheck {
        /// The probed relation's name.
        relation: String,
        /// One expression per attribute, `Undef` where free.
        pattern: SmallVec<[Expression; 4]>,
    },
    /// Is `relation` empty?
    EmptinessCheck {
        /// The probed relation's name.
        relation: String,
    },
}

impl Condition {
    /// Shorthand for an equality [`Condition::Constraint`].
    pub fn eq(lhs: Expression, rhs: Expression) -> Self {
        Self::constraint(ConstraintOp::Eq, lhs, rhs)
    }

    /// Shorthand for building a [`Condition::Constraint`].
    pub fn constraint(op: ConstraintOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Constraint {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Shorthand for building a [`Condition::Conjunction`].
    pub fn and(lhs: Condition, rhs: Condition) -> Self {
        Self::Conjunction(Box::new(lhs), Box::new(rhs))
    }

    /// Shorthand for building a [`Condition::Negation`].
    pub fn not(inner: Condition) -> Self {
        Self::Negation(Box::new(inner))
    }

    /// Shorthand for building a [`Condition::ExistenceCheck`].
    pub fn exists(relation: impl Into<String>, pattern: Vec<Expression>) -> Self {
        Self::ExistenceCheck {
            relation: relation.into(),
            pattern: pattern.into(),
        }
    }

    /// Whether the outermost connective is a conjunction, i.e. whether the
    /// condition violates split form when used as a filter guard.
    pub fn is_conjunction(&self) -> bool {
        matches!(self, Self::Conjunction(_, _))
    }
}

/// Flattens a condition into the list of its conjunction terms.
///
/// `a AND (b AND c)` becomes `[a, b, c]`; a condition that is not a
/// conjunction becomes a singleton list. The inverse is [`conjoin`].
pub fn split_conjunction(condition: Condition) -> Vec<Condition> {
    let mut terms = Vec::new();

    split_into(condition, &mut terms);

    terms
}

fn split_into(condition: Condition, terms: &mut Vec<Condition>) {
    match condition {
        Condition::Conjunction(lhs, rhs) => {
            split_into(*lhs, terms);
            split_into(*rhs, terms);
        }
        other => terms.push(other),
    }
}

/// Folds a list of terms back into one condition.
///
/// An empty list yields [`Condition::True`], and the terms keep their
/// order: `[a, b, c]` becomes `a AND (b AND c)`.
pub fn conjoin(terms: impl IntoIterator<Item = Condition>) -> Condition {
    let mut terms: Vec<Condition> = terms.into_iter().collect();
    let last = match terms.pop() {
        Some(last) => last,
        None => return Condition::True,
    };

    terms
        .into_iter()
        .rev()
        .fold(last, |acc, term| Condition::and(term, acc))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "TRUE"),
            Self::False => write!(f, "FALSE"),
            Self::Conjunction(lhs, rhs) => write!(f, "({lhs} AND {rhs})"),
            Self::Negation(inner) => write!(f, "NOT ({inner})"),
            Self::Constraint { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Self::ExistenceCheck { relation, pattern } => {
                write_pattern(f, pattern)?;
                write!(f, " IN {relation}")
            }
            Self::ProvenanceExistenceCheck { relation, pattern } => {
                write_pattern(f, pattern)?;
                write!(f, " IN PROVENANCE({relation})")
            }
            Self::EmptinessCheck { relation } => write!(f, "ISEMPTY({relation})"),
        }
    }
}

pub(crate) fn write_pattern(f: &mut fmt::Formatter<'_>, pattern: &[Expression]) -> fmt::Result {
    write!(f, "(")?;

    for (i, expr) in pattern.iter().enumerate() {
        if i != 0 {
            write!(f, ",")?;
        }

        write!(f, "{expr}")?;
    }

    write!(f, ")")
}
