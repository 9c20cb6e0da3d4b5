//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::{Condition, Expression};
use smallvec::SmallVec;
use static_assertions::assert_eq_size;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The fold performed by an [`Operation::Aggregate`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum AggregateOp {
    /// The smallest value of the aggregated expression.
    Min,
    /// The largest value of the aggregated expression.
    Max,
    /// The number of matching tuples.
    Count,
    /// The sum of the aggregated expression.
    Sum,
}

assert_eq_size!(AggregateOp, u8);

impl AggregateOp {
    /// The aggregator's spelling in the canonical text form.
    pub fn name(self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
        }
    }
}

/// A node that introduces or consumes tuple bindings inside a query.
///
/// A query's operations form a nest: every non-leaf variant owns exactly
/// one `body`, and the nest bottoms out in a [`Operation::Project`] or a
/// [`Operation::SubroutineReturn`]. Operations that iterate a relation bind
/// a tuple at their `level`; levels are unique within the nest and grow
/// strictly from outer to inner.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Operation {
    /// Binds the tuple at `level` to each tuple of `relation` in turn.
    Scan {
        /// The scanned relation's name.
        relation: String,
        /// The tuple identifier this scan binds.
        level: usize,
        /// The nested operation evaluated per tuple.
        body: Box<Operation>,
    },
    /// Like [`Operation::Scan`], but only over the tuples matching an
    /// equality pattern, served by an index on the relation.
    IndexScan {
        /// The scanned relation's name.
        relation: String,
        /// The tuple identifier this scan binds.
        level: usize,
        /// One expression per attribute, [`Expression::Undef`] where free.
        pattern: SmallVec<[Expression; 4]>,
        /// The nested operation evaluated per matching tuple.
        body: Box<Operation>,
    },
    /// Binds the tuple at `level` to *some* tuple of `relation` satisfying
    /// `condition`, evaluating `body` at most once.
    Choice {
        /// The searched relation's name.
        relation: String,
        /// The tuple identifier this choice binds.
        level: usize,
        /// The predicate a chosen tuple must satisfy.
        condition: Condition,
        /// Evaluated for the chosen tuple, if any.
        body: Box<Operation>,
    },
    /// The indexed form of [`Operation::Choice`]: candidates are narrowed
    /// by an equality pattern first.
    IndexChoice {
        /// The searched relation's name.
        relation: String,
        /// The tuple identifier this choice binds.
        level: usize,
        /// One expression per attribute, [`Expression::Undef`] where free.
        pattern: SmallVec<[Expression; 4]>,
        /// The predicate a chosen tuple must satisfy.
        condition: Condition,
        /// Evaluated for the chosen tuple, if any.
        body: Box<Operation>,
    },
    /// Folds `expression` over every tuple of `relation` satisfying
    /// `condition`, then runs `body` once with the result bound at `level`.
    Aggregate {
        /// The fold to perform.
        op: AggregateOp,
        /// The aggregated relation's name.
        relation: String,
        /// The tuple identifier bound while folding (and carrying the
        /// result into `body`).
        level: usize,
        /// Restricts which tuples participate in the fold.
        condition: Condition,
        /// The value folded per tuple (ignored by [`AggregateOp::Count`]).
        expression: Box<Expression>,
        /// Evaluated once with the fold's result.
        body: Box<Operation>,
    },
    /// The indexed form of [`Operation::Aggregate`].
    IndexAggregate {
        /// The fold to perform.
        op: AggregateOp,
        /// The aggregated relation's name.
        relation: String,
        /// The tuple identifier bound while folding.
        level: usize,
        /// One expression per attribute, [`Expression::Undef`] where free.
        pattern: SmallVec<[Expression; 4]>,
        /// Restricts which tuples participate in the fold.
        condition: Condition,
        /// The value folded per tuple.
        expression: Box<Expression>,
        /// Evaluated once with the fold's result.
        body: Box<Operation>,
    },
    /// Evaluates `body` only if `condition` holds.
    Filter {
        /// The guard.
        condition: Condition,
        /// Evaluated when the guard holds.
        body: Box<Operation>,
    },
    /// Terminates the innermost enclosing scan when `condition` holds,
    /// otherwise continues with `body`.
    Break {
        /// The loop-exit condition.
        condition: Condition,
        /// Evaluated when the condition does not hold.
        body: Box<Operation>,
    },
    /// Inserts a tuple built from `args` into `relation`. Leaf.
    Project {
        /// The target relation's name.
        relation: String,
        /// One expression per attribute of the target.
        args: SmallVec<[Expression; 4]>,
    },
    /// Returns a row of values from a subroutine. Leaf.
    SubroutineReturn {
        /// The returned values.
        args: SmallVec<[Expression; 4]>,
    },
}

impl Operation {
    /// Shorthand for building a [`Operation::Scan`].
    pub fn scan(relation: impl Into<String>, level: usize, body: Operation) -> Self {
        Self::Scan {
            relation: relation.into(),
            level,
            body: Box::new(body),
        }
    }

    /// Shorthand for building a [`Operation::IndexScan`].
    pub fn index_scan(
        relation: impl Into<String>,
        level: usize,
        pattern: Vec<Expression>,
        body: Operation,
    ) -> Self {
        Self::IndexScan {
            relation: relation.into(),
            level,
            pattern: pattern.into(),
            body: Box::new(body),
        }
    }

    /// Shorthand for building a [`Operation::Filter`].
    pub fn filter(condition: Condition, body: Operation) -> Self {
        Self::Filter {
            condition,
            body: Box::new(body),
        }
    }

    /// Shorthand for building a [`Operation::Break`].
    pub fn break_if(condition: Condition, body: Operation) -> Self {
        Self::Break {
            condition,
            body: Box::new(body),
        }
    }

    /// Shorthand for building a [`Operation::Project`].
    pub fn project(relation: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Project {
            relation: relation.into(),
            args: args.into(),
        }
    }

    /// The tuple level this operation binds, if it binds one.
    ///
    /// Scans, choices and aggregates bind a tuple; filters, breaks and the
    /// leaves do not.
    pub fn binding_level(&self) -> Option<usize> {
        match self {
            Self::Scan { level, .. }
            | Self::IndexScan { level, .. }
            | Self::Choice { level, .. }
            | Self::IndexChoice { level, .. }
            | Self::Aggregate { level, .. }
            | Self::IndexAggregate { level, .. } => Some(*level),
            Self::Filter { .. }
            | Self::Break { .. }
            | Self::Project { .. }
            | Self::SubroutineReturn { .. } => None,
        }
    }

    /// The nested operation, for every non-leaf variant.
    pub fn body(&self) -> Option<&Operation> {
        match self {
            Self::Scan { body, .. }
            | Self::IndexScan { body, .. }
            | Self::Choice { body, .. }
            | Self::IndexChoice { body, .. }
            | Self::Aggregate { body, .. }
            | Self::IndexAggregate { body, .. }
            | Self::Filter { body, .. }
            | Self::Break { body, .. } => Some(body),
            Self::Project { .. } | Self::SubroutineReturn { .. } => None,
        }
    }

    /// Mutable access to the nested operation, for every non-leaf variant.
    pub fn body_mut(&mut self) -> Option<&mut Operation> {
        match self {
            Self::Scan { body, .. }
            | Self::IndexScan { body, .. }
            | Self::Choice { body, .. }
            | Self::IndexChoice { body, .. }
            | Self::Aggregate { body, .. }
            | Self::IndexAggregate { body, .. }
            | Self::Filter { body, .. }
            | Self::Break { body, .. } => Some(body),
            Self::Project { .. } | Self::SubroutineReturn { .. } => None,
        }
    }
}
