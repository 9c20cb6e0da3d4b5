//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Walkers and mappers over the RAM tree.
//!
//! The read-only `for_each_*` functions visit nodes in pre-order. The
//! owning [`map_operation_bottom_up`] is the node-mapper the rewriting
//! passes are built on: a child is taken out of its slot by value, rebuilt,
//! and put back, all in one logical step. Nothing here ever aliases a node,
//! the tree stays exclusively owned top to bottom.

use crate::ram::{Condition, Expression, Operation, Statement};

/// Applies `f` to the root operation of every [`Statement::Query`]
/// reachable from `stmt`.
pub fn for_each_query_mut(stmt: &mut Statement, f: &mut impl FnMut(&mut Operation)) {
    match stmt {
        Statement::Query(op) => f(op),
        Statement::Sequence(children) | Statement::Parallel(children) => {
            for child in children {
                for_each_query_mut(child, f);
            }
        }
        Statement::Loop(body) => for_each_query_mut(body, f),
        Statement::DebugInfo { body, .. } => for_each_query_mut(body, f),
        Statement::Exit(_)
        | Statement::Clear { .. }
        | Statement::Merge { .. }
        | Statement::Swap { .. }
        | Statement::IO { .. }
        | Statement::LogSize { .. } => {}
    }
}

/// The read-only counterpart of [`for_each_query_mut`].
pub fn for_each_query(stmt: &Statement, f: &mut impl FnMut(&Operation)) {
    match stmt {
        Statement::Query(op) => f(op),
        Statement::Sequence(children) | Statement::Parallel(children) => {
            for child in children {
                for_each_query(child, f);
            }
        }
        Statement::Loop(body) => for_each_query(body, f),
        Statement::DebugInfo { body, .. } => for_each_query(body, f),
        Statement::Exit(_)
        | Statement::Clear { .. }
        | Statement::Merge { .. }
        | Statement::Swap { .. }
        | Statement::IO { .. }
        | Statement::LogSize { .. } => {}
    }
}

/// Rebuilds an operation nest bottom-up.
///
/// Children are mapped before their parent, so by the time `f` sees a node
/// its body is already in final form. `f` owns the node it is handed and
/// returns the node to install in its place.
pub fn map_operation_bottom_up(
    op: Operation,
    f: &mut impl FnMut(Operation) -> Operation,
) -> Operation {
    let mapped = match op {
        Operation::Scan {
            relation,
            level,
            body,
        } => Operation::Scan {
            relation,
            level,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::IndexScan {
            relation,
            level,
            pattern,
            body,
        } => Operation::IndexScan {
            relation,
            level,
            pattern,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::Choice {
            relation,
            level,
            condition,
            body,
        } => Operation::Choice {
            relation,
            level,
            condition,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::IndexChoice {
            relation,
            level,
            pattern,
            condition,
            body,
        } => Operation::IndexChoice {
            relation,
            level,
            pattern,
            condition,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::Aggregate {
            op,
            relation,
            level,
            condition,
            expression,
            body,
        } => Operation::Aggregate {
            op,
            relation,
            level,
            condition,
            expression,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::IndexAggregate {
            op,
            relation,
            level,
            pattern,
            condition,
            expression,
            body,
        } => Operation::IndexAggregate {
            op,
            relation,
            level,
            pattern,
            condition,
            expression,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::Filter { condition, body } => Operation::Filter {
            condition,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        Operation::Break { condition, body } => Operation::Break {
            condition,
            body: Box::new(map_operation_bottom_up(*body, f)),
        },
        leaf @ (Operation::Project { .. } | Operation::SubroutineReturn { .. }) => leaf,
    };

    f(mapped)
}

/// Visits `op` and every operation nested under it, in pre-order.
pub fn for_each_operation(op: &Operation, f: &mut impl FnMut(&Operation)) {
    f(op);

    if let Some(body) = op.body() {
        for_each_operation(body, f);
    }
}

/// Visits an expression and all of its sub-expressions, in pre-order.
pub fn for_each_expression(expr: &Expression, f: &mut impl FnMut(&Expression)) {
    f(expr);

    match expr {
        Expression::Intrinsic { args, .. }
        | Expression::UserDefined { args, .. }
        | Expression::PackRecord { args } => {
            for arg in args {
                for_each_expression(arg, f);
            }
        }
        Expression::Constant(_)
        | Expression::TupleElement { .. }
        | Expression::AutoIncrement
        | Expression::SubroutineArg(_)
        | Expression::Undef => {}
    }
}

/// Visits every expression node inside a condition, in pre-order.
pub fn for_each_expression_in_condition(cond: &Condition, f: &mut impl FnMut(&Expression)) {
    match cond {
        Condition::Conjunction(lhs, rhs) => {
            for_each_expression_in_condition(lhs, f);
            for_each_expression_in_condition(rhs, f);
        }
        Condition::Negation(inner) => for_each_expression_in_condition(inner, f),
        Condition::Constraint { lhs, rhs, .. } => {
            for_each_expression(lhs, f);
            for_each_expression(rhs, f);
        }
        Condition::ExistenceCheck { pattern, .. }
        | Condition::ProvenanceExistenceCheck { pattern, .. } => {
            for arg in pattern {
                for_each_expression(arg, f);
            }
        }
        Condition::True | Condition::False | Condition::EmptinessCheck { .. } => {}
    }
}

/// Visits every expression node in an operation nest: index patterns,
/// guard conditions, aggregate expressions, projection and return
/// arguments, recursively through every body.
pub fn for_each_expression_in_operation(op: &Operation, f: &mut impl FnMut(&Expression)) {
    for_each_operation(op, &mut |op| match op {
        Operation::Scan { .. } => {}
        Operation::IndexScan { pattern, .. } => {
            for arg in pattern {
                for_each_expression(arg, f);
            }
        }
        Operation::Choice { condition, .. } => for_each_expression_in_condition(condition, f),
        Operation::IndexChoice {
            pattern, condition, ..
        } => {
            for arg in pattern {
                for_each_expression(arg, f);
            }

            for_each_expression_in_condition(condition, f);
        }
        Operation::Aggregate {
            condition,
            expression,
            ..
        } => {
            for_each_expression_in_condition(condition, f);
            for_each_expression(expression, f);
        }
        Operation::IndexAggregate {
            pattern,
            condition,
            expression,
            ..
        } => {
            for arg in pattern {
                for_each_expression(arg, f);
            }

            for_each_expression_in_condition(condition, f);
            for_each_expression(expression, f);
        }
        Operation::Filter { condition, .. } | Operation::Break { condition, .. } => {
            for_each_expression_in_condition(condition, f)
        }
        Operation::Project { args, .. } | Operation::SubroutineReturn { args } => {
            for arg in args {
                for_each_expression(arg, f);
            }
        }
    });
}

/// Visits every condition in an operation nest, in pre-order.
pub fn for_each_condition_in_operation(op: &Operation, f: &mut impl FnMut(&Condition)) {
    for_each_operation(op, &mut |op| match op {
        Operation::Choice { condition, .. }
        | Operation::IndexChoice { condition, .. }
        | Operation::Aggregate { condition, .. }
        | Operation::IndexAggregate { condition, .. }
        | Operation::Filter { condition, .. }
        | Operation::Break { condition, .. } => f(condition),
        Operation::Scan { .. }
        | Operation::IndexScan { .. }
        | Operation::Project { .. }
        | Operation::SubroutineReturn { .. } => {}
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::Expression as E;

    fn nest() -> Operation {
        Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                Operation::project("C", vec![E::tuple_element(0, 1)]),
            ),
        )
    }

    #[test]
    fn preorder_operation_walk() {
        let mut kinds = Vec::new();

        for_each_operation(&nest(), &mut |op| {
            kinds.push(match op {
                Operation::Scan { .. } => "scan",
                Operation::Filter { .. } => "filter",
                Operation::Project { .. } => "project",
                _ => "other",
            });
        });

        assert_eq!(kinds, vec!["scan", "filter", "project"]);
    }

    #[test]
    fn expression_walk_reaches_guards_and_leaves() {
        let mut tuple_refs = Vec::new();

        for_each_expression_in_operation(&nest(), &mut |e| {
            if let E::TupleElement { level, column } = e {
                tuple_refs.push((*level, *column));
            }
        });

        assert_eq!(tuple_refs, vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn bottom_up_mapper_sees_children_first() {
        let mut order = Vec::new();

        let mapped = map_operation_bottom_up(nest(), &mut |op| {
            order.push(match &op {
                Operation::Scan { .. } => "scan",
                Operation::Filter { .. } => "filter",
                Operation::Project { .. } => "project",
                _ => "other",
            });

            op
        });

        assert_eq!(order, vec!["project", "filter", "scan"]);
        assert_eq!(mapped, nest());
    }

    #[test]
    fn mapper_installs_replacements() {
        let mapped = map_operation_bottom_up(nest(), &mut |op| match op {
            Operation::Filter { body, .. } => *body,
            other => other,
        });

        let expected = Operation::scan("A", 0, Operation::project("C", vec![E::tuple_element(0, 1)]));

        assert_eq!(mapped, expected);
    }
}
