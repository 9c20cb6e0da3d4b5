//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{ConstValueAnalysis, ConstValues, ExpressionLevelAnalysis, ExpressionLevels};
use crate::passes::RamTransformer;
use crate::ram::{
    conjoin, split_conjunction, visit, AggregateOp, Condition, ConstraintOp, Expression, Operation,
    Program,
};
use crate::unit::TranslationUnit;
use crate::utility::SaHashMap;
use smallvec::{smallvec, SmallVec};
use std::mem;

/// Turns indexable scans and aggregates into their indexed forms.
///
/// The pass assumes the program has been levelled before: any condition
/// that could constrain a scanned tuple has been hoisted to sit
/// immediately inside that tuple's binding. The equality constraints among
/// those become the index pattern, everything else stays behind as a
/// residual filter:
///
/// ```text
/// QUERY                             QUERY
///  FOR t1 IN A                       SEARCH t1 IN A ON INDEX t1.0 = number(10)
///   IF t1.0 = number(10)      =>      IF C
///    IF C                              ...
///     ...
/// ```
///
/// This is the rewrite that turns an O(|A|) enumeration per outer
/// iteration into a logarithmic probe of a pre-built index on `A`.
pub struct MakeIndexPass;

impl RamTransformer for MakeIndexPass {
    fn name(&self) -> &'static str {
        "MakeIndex"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        let levels = unit.analysis::<ExpressionLevelAnalysis>();
        let consts = unit.analysis::<ConstValueAnalysis>();

        make_index(unit.program_mut(), &levels, &consts)
    }
}

/// Rewrites every indexable scan and aggregate in `program`, see
/// [`MakeIndexPass`]. Returns whether anything was rewritten.
pub fn make_index(
    program: &mut Program,
    levels: &ExpressionLevels,
    consts: &ConstValues,
) -> bool {
    let arities: SaHashMap<String, usize> = program
        .relations()
        .map(|r| (r.name().to_string(), r.arity()))
        .collect();
    let mut changed = false;

    program.for_each_query_mut(|root| {
        let op = mem::replace(root, Operation::SubroutineReturn { args: SmallVec::new() });

        *root = visit::map_operation_bottom_up(op, &mut |op| match op {
            Operation::Scan {
                relation,
                level,
                body,
            } => match arities.get(&relation) {
                Some(&arity) => rewrite_scan(relation, level, *body, arity, levels, consts, &mut changed),
                None => Operation::Scan {
                    relation,
                    level,
                    body,
                },
            },
            Operation::Aggregate {
                op,
                relation,
                level,
                condition,
                expression,
                body,
            } => match arities.get(&relation) {
                Some(&arity) => rewrite_aggregate(
                    op, relation, level, condition, expression, body, arity, levels, consts,
                    &mut changed,
                ),
                None => Operation::Aggregate {
                    op,
                    relation,
                    level,
                    condition,
                    expression,
                    body,
                },
            },
            other => other,
        });
    });

    changed
}

/// Splits a scan's leading filters into an index pattern and residual
/// conditions. Returns the `IndexScan` if any equality was consumed, the
/// reassembled original `Scan` otherwise.
#[allow(clippy::too_many_arguments)]
fn rewrite_scan(
    relation: String,
    level: usize,
    body: Operation,
    arity: usize,
    levels: &ExpressionLevels,
    consts: &ConstValues,
    changed: &mut bool,
) -> Operation {
    let mut pattern: SmallVec<[Expression; 4]> = smallvec![Expression::Undef; arity];
    let mut residual: SmallVec<[Condition; 4]> = SmallVec::new();
    let mut indexable = false;

    // walk the consecutive filters immediately inside the scan; everything
    // from the first non-filter onward belongs to deeper operations
    let mut cursor = body;

    loop {
        match cursor {
            Operation::Filter { condition, body } => {
                match try_bind(condition, level, &mut pattern, levels, consts) {
                    None => indexable = true,
                    Some(kept) => residual.push(kept),
                }

                cursor = *body;
            }
            other => {
                cursor = other;
                break;
            }
        }
    }

    // residuals keep their original relative order either way; when no
    // equality was consumed this reassembles the scan exactly as it was
    let body = residual
        .into_iter()
        .rev()
        .fold(cursor, |acc, condition| Operation::filter(condition, acc));

    if indexable {
        *changed = true;

        Operation::IndexScan {
            relation,
            level,
            pattern,
            body: Box::new(body),
        }
    } else {
        Operation::Scan {
            relation,
            level,
            body: Box::new(body),
        }
    }
}

/// The aggregate analogue of [`rewrite_scan`]: the candidate equalities
/// live in the aggregate's own condition rather than in body filters.
#[allow(clippy::too_many_arguments)]
fn rewrite_aggregate(
    op: AggregateOp,
    relation: String,
    level: usize,
    condition: Condition,
    expression: Box<Expression>,
    body: Box<Operation>,
    arity: usize,
    levels: &ExpressionLevels,
    consts: &ConstValues,
    changed: &mut bool,
) -> Operation {
    let mut pattern: SmallVec<[Expression; 4]> = smallvec![Expression::Undef; arity];
    let mut residual: SmallVec<[Condition; 4]> = SmallVec::new();
    let mut indexable = false;
    let original = condition.clone();

    for term in split_conjunction(condition) {
        match try_bind(term, level, &mut pattern, levels, consts) {
            None => indexable = true,
            Some(kept) => residual.push(kept),
        }
    }

    if indexable {
        *changed = true;

        Operation::IndexAggregate {
            op,
            relation,
            level,
            pattern,
            condition: conjoin(residual),
            expression,
            body,
        }
    } else {
        // keep the original condition tree rather than a re-associated one
        Operation::Aggregate {
            op,
            relation,
            level,
            condition: original,
            expression,
            body,
        }
    }
}

/// Tries to consume an equality constraint of the shape `t{level}.k = e`
/// (or `e = t{level}.k`) into the pattern.
///
/// Returns `None` when the constraint was folded into the pattern, and
/// gives the condition back when it must stay as a residual: it is not an
/// eligible equality, or its slot is already taken by an earlier one (the
/// first equality in source order wins, later ones remain as provably
/// redundant post-index checks).
fn try_bind(
    condition: Condition,
    level: usize,
    pattern: &mut [Expression],
    levels: &ExpressionLevels,
    consts: &ConstValues,
) -> Option<Condition> {
    let (lhs, rhs) = match condition {
        Condition::Constraint {
            op: ConstraintOp::Eq,
            lhs,
            rhs,
        } => (lhs, rhs),
        other => return Some(other),
    };

    let bound = match (&*lhs, &*rhs) {
        (Expression::TupleElement { level: l, column }, _)
            if *l == level && eligible(&rhs, level, levels, consts) =>
        {
            Some((*column, true))
        }
        (_, Expression::TupleElement { level: l, column })
            if *l == level && eligible(&lhs, level, levels, consts) =>
        {
            Some((*column, false))
        }
        _ => None,
    };

    match bound {
        Some((column, value_is_rhs)) if pattern[column].is_undef() => {
            pattern[column] = if value_is_rhs { *rhs } else { *lhs };

            None
        }
        _ => Some(Condition::Constraint {
            op: ConstraintOp::Eq,
            lhs,
            rhs,
        }),
    }
}

/// Whether an expression may serve as a pattern value for the tuple bound
/// at `level`.
///
/// The expression must provably not read the searched tuple (or anything
/// bound deeper), and it must not change between evaluations: a probe
/// evaluates its pattern once, a filter re-evaluates per tuple, so folding
/// a counter or an arbitrary functor into the pattern would change how
/// often it runs.
fn eligible(
    expr: &Expression,
    level: usize,
    levels: &ExpressionLevels,
    consts: &ConstValues,
) -> bool {
    if consts.is_constant(expr) {
        return true;
    }

    if expr.is_undef() || levels.level(expr).is_some_and(|l| l >= level) {
        return false;
    }

    let mut stable = true;

    visit::for_each_expression(expr, &mut |e| match e {
        Expression::AutoIncrement | Expression::UserDefined { .. } => stable = false,
        _ => {}
    });

    stable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{AggregateOp, Expression as E, Relation, Statement};
    use crate::utility::SymbolTable;

    fn unit_with(query: Operation) -> TranslationUnit {
        let program = Program::new(
            vec![
                Relation::with_attributes("A", &["x", "y", "z"]),
                Relation::with_attributes("B", &["x", "y", "z"]),
                Relation::with_attributes("C", &["u", "v", "w"]),
            ],
            Statement::query(query),
        );

        TranslationUnit::new(program, SymbolTable::new())
    }

    fn root(unit: &TranslationUnit) -> &Operation {
        match unit.program().main() {
            Statement::Query(op) => op,
            _ => unreachable!(),
        }
    }

    fn run(unit: &mut TranslationUnit) -> bool {
        MakeIndexPass.apply(unit)
    }

    #[test]
    fn single_equality_becomes_a_pattern() {
        // the S2 shape: the hoisted equality sits right below its scan
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                Operation::project("C", vec![E::tuple_element(0, 1)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::index_scan(
            "A",
            0,
            vec![E::constant(5), E::Undef, E::Undef],
            Operation::project("C", vec![E::tuple_element(0, 1)]),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn flipped_equalities_bind_too() {
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::constant(7), E::tuple_element(0, 2)),
                Operation::project("C", vec![E::constant(0)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::index_scan(
            "A",
            0,
            vec![E::Undef, E::Undef, E::constant(7)],
            Operation::project("C", vec![E::constant(0)]),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn non_equalities_stay_as_residual_filters() {
        // the S6 shape: an equality plus an inequality on the same tuple
        let eq = Condition::eq(E::tuple_element(0, 0), E::constant(5));
        let gt = Condition::constraint(
            ConstraintOp::Gt,
            E::tuple_element(0, 1),
            E::tuple_element(0, 0),
        );
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                eq,
                Operation::filter(gt.clone(), Operation::project("C", vec![E::constant(1)])),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::index_scan(
            "A",
            0,
            vec![E::constant(5), E::Undef, E::Undef],
            Operation::filter(gt, Operation::project("C", vec![E::constant(1)])),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn first_equality_per_slot_wins() {
        let first = Condition::eq(E::tuple_element(0, 0), E::constant(5));
        let second = Condition::eq(E::tuple_element(0, 0), E::constant(6));
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                first,
                Operation::filter(
                    second.clone(),
                    Operation::project("C", vec![E::constant(1)]),
                ),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::index_scan(
            "A",
            0,
            vec![E::constant(5), E::Undef, E::Undef],
            Operation::filter(second, Operation::project("C", vec![E::constant(1)])),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn values_may_reference_outer_tuples() {
        let query = Operation::scan(
            "A",
            0,
            Operation::scan(
                "B",
                1,
                Operation::filter(
                    Condition::eq(E::tuple_element(1, 0), E::tuple_element(0, 2)),
                    Operation::project("C", vec![E::tuple_element(1, 1)]),
                ),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::scan(
            "A",
            0,
            Operation::index_scan(
                "B",
                1,
                vec![E::tuple_element(0, 2), E::Undef, E::Undef],
                Operation::project("C", vec![E::tuple_element(1, 1)]),
            ),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn self_referential_equalities_do_not_bind() {
        // t0.0 = t0.1 reads the searched tuple on both sides
        let cond = Condition::eq(E::tuple_element(0, 0), E::tuple_element(0, 1));
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(cond, Operation::project("C", vec![E::constant(0)])),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn effectful_values_do_not_bind() {
        let auto = Condition::eq(E::tuple_element(0, 0), E::AutoIncrement);
        let functor = Condition::eq(
            E::tuple_element(0, 1),
            E::user_defined("f", vec![E::constant(1)]),
        );
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                auto,
                Operation::filter(functor, Operation::project("C", vec![E::constant(0)])),
            ),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn aggregates_fold_their_condition_into_a_pattern() {
        let query = Operation::scan(
            "A",
            0,
            Operation::Aggregate {
                op: AggregateOp::Sum,
                relation: "B".to_string(),
                level: 1,
                condition: Condition::and(
                    Condition::eq(E::tuple_element(1, 0), E::tuple_element(0, 0)),
                    Condition::constraint(
                        ConstraintOp::Gt,
                        E::tuple_element(1, 1),
                        E::constant(0),
                    ),
                ),
                expression: Box::new(E::tuple_element(1, 2)),
                body: Box::new(Operation::project("C", vec![E::tuple_element(1, 0)])),
            },
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::scan(
            "A",
            0,
            Operation::IndexAggregate {
                op: AggregateOp::Sum,
                relation: "B".to_string(),
                level: 1,
                pattern: smallvec![E::tuple_element(0, 0), E::Undef, E::Undef],
                condition: Condition::constraint(
                    ConstraintOp::Gt,
                    E::tuple_element(1, 1),
                    E::constant(0),
                ),
                expression: Box::new(E::tuple_element(1, 2)),
                body: Box::new(Operation::project("C", vec![E::tuple_element(1, 0)])),
            },
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn is_idempotent() {
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                Operation::project("C", vec![E::tuple_element(0, 1)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let once = root(&unit).clone();

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &once);
    }

    #[test]
    fn patterns_match_relation_arity() {
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 2), E::constant(9)),
                Operation::project("C", vec![E::constant(0)]),
            ),
        );
        let mut unit = unit_with(query);

        run(&mut unit);

        match root(&unit) {
            Operation::IndexScan { pattern, .. } => assert_eq!(pattern.len(), 3),
            other => panic!("expected an index scan, got {other:?}"),
        }
    }
}
