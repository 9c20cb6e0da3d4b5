//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::passes::RamAnalysis;
use crate::ram::{Condition, Expression, Program};
use std::cmp;

/// The minimum tuple-nesting level an expression can be evaluated at.
///
/// `Some(l)` means the expression reads the tuple bound at level `l` (and
/// possibly shallower ones); `None` means it reads no tuple at all and is
/// available anywhere in the query, even above the outermost binding.
pub fn expression_level(expr: &Expression) -> Option<usize> {
    match expr {
        Expression::Constant(_)
        | Expression::AutoIncrement
        | Expression::SubroutineArg(_)
        | Expression::Undef => None,
        Expression::TupleElement { level, .. } => Some(*level),
        Expression::Intrinsic { args, .. }
        | Expression::UserDefined { args, .. }
        | Expression::PackRecord { args } => {
            args.iter().map(expression_level).max().flatten()
        }
    }
}

/// The minimum tuple-nesting level a condition can be evaluated at, see
/// [`expression_level`].
///
/// This is the number the hoisting pass positions filters by: a filter
/// whose condition has level `Some(l)` may sit immediately inside the
/// operation binding tuple `l`, and one with level `None` may wrap the
/// whole query.
pub fn condition_level(cond: &Condition) -> Option<usize> {
    match cond {
        Condition::True | Condition::False | Condition::EmptinessCheck { .. } => None,
        Condition::Conjunction(lhs, rhs) => {
            cmp::max(condition_level(lhs), condition_level(rhs))
        }
        Condition::Negation(inner) => condition_level(inner),
        Condition::Constraint { lhs, rhs, .. } => {
            cmp::max(expression_level(lhs), expression_level(rhs))
        }
        Condition::ExistenceCheck { pattern, .. }
        | Condition::ProvenanceExistenceCheck { pattern, .. } => {
            pattern.iter().map(expression_level).max().flatten()
        }
    }
}

/// The result handle of [`ExpressionLevelAnalysis`].
pub struct ExpressionLevels(());

impl ExpressionLevels {
    /// See [`expression_level`].
    pub fn level(&self, expr: &Expression) -> Option<usize> {
        expression_level(expr)
    }
}

/// Levelling analysis for expressions: at which nesting depth are all
/// tuple identifiers an expression references in scope?
///
/// The index rewrite uses this to prove that a pattern value does not
/// depend on the tuple being searched.
#[derive(Default)]
pub struct ExpressionLevelAnalysis;

impl RamAnalysis for ExpressionLevelAnalysis {
    type Result = ExpressionLevels;

    fn name(&self) -> &'static str {
        "expression-level"
    }

    fn run(&self, _: &Program) -> ExpressionLevels {
        ExpressionLevels(())
    }
}

/// The result handle of [`ConditionLevelAnalysis`].
pub struct ConditionLevels(());

impl ConditionLevels {
    /// See [`condition_level`].
    pub fn level(&self, cond: &Condition) -> Option<usize> {
        condition_level(cond)
    }
}

/// Levelling analysis for conditions, the hoisting pass's whole basis.
#[derive(Default)]
pub struct ConditionLevelAnalysis;

impl RamAnalysis for ConditionLevelAnalysis {
    type Result = ConditionLevels;

    fn name(&self) -> &'static str {
        "condition-level"
    }

    fn run(&self, _: &Program) -> ConditionLevels {
        ConditionLevels(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{Expression as E, IntrinsicOp};

    #[test]
    fn constants_have_no_level() {
        assert_eq!(expression_level(&E::constant(5)), None);
        assert_eq!(expression_level(&E::AutoIncrement), None);
        assert_eq!(expression_level(&E::SubroutineArg(2)), None);
        assert_eq!(expression_level(&E::Undef), None);
    }

    #[test]
    fn tuple_elements_level_at_their_binding() {
        assert_eq!(expression_level(&E::tuple_element(3, 0)), Some(3));
    }

    #[test]
    fn operators_take_the_max_of_their_arguments() {
        let e = E::intrinsic(
            IntrinsicOp::Add,
            vec![E::tuple_element(1, 0), E::tuple_element(4, 2)],
        );

        assert_eq!(expression_level(&e), Some(4));

        // an empty argument list is level-independent
        let e = E::intrinsic(IntrinsicOp::Cat, vec![]);

        assert_eq!(expression_level(&e), None);
    }

    #[test]
    fn constraint_level_is_max_of_both_sides() {
        let c = Condition::eq(E::tuple_element(0, 0), E::tuple_element(2, 1));

        assert_eq!(condition_level(&c), Some(2));

        let c = Condition::eq(E::constant(1), E::constant(2));

        assert_eq!(condition_level(&c), None);
    }

    #[test]
    fn connectives_take_the_max() {
        let lhs = Condition::eq(E::tuple_element(1, 0), E::constant(0));
        let rhs = Condition::eq(E::tuple_element(0, 0), E::constant(0));
        let c = Condition::and(lhs.clone(), rhs);

        assert_eq!(condition_level(&c), Some(1));
        assert_eq!(condition_level(&Condition::not(lhs)), Some(1));
        assert_eq!(condition_level(&Condition::True), None);
        assert_eq!(condition_level(&Condition::False), None);
    }

    #[test]
    fn existence_checks_level_over_their_pattern() {
        let c = Condition::exists("A", vec![E::Undef, E::tuple_element(2, 0), E::constant(1)]);

        assert_eq!(condition_level(&c), Some(2));

        let c = Condition::exists("A", vec![E::Undef, E::Undef]);

        assert_eq!(condition_level(&c), None);

        let c = Condition::EmptinessCheck {
            relation: "A".to_string(),
        };

        assert_eq!(condition_level(&c), None);
    }
}
