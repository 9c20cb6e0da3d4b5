//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{ConditionLevelAnalysis, ConditionLevels};
use crate::passes::RamTransformer;
use crate::ram::{Condition, Operation, Program};
use crate::unit::TranslationUnit;
use smallvec::SmallVec;
use std::mem;

/// Hoists filter conditions to the earliest point in a query's loop nest
/// where their evaluation is still semantically correct.
///
/// A condition reading only tuples `0..=k` is equally valid immediately
/// inside the operation binding tuple `k` as it is deeper inside the nest,
/// and evaluating it there skips it for every tuple the deeper loops would
/// have enumerated. Conditions reading no tuple at all end up wrapping the
/// whole query.
///
/// The pass assumes filter operations are stored verbose, i.e. a
/// conjunction is expressed by two consecutive filters:
///
/// ```text
/// QUERY                      QUERY
///  ...                        ...
///   IF C1 AND C2     =>        IF C1
///    ...                        IF C2
///                                ...
/// ```
///
/// Otherwise the levelling becomes imprecise: the combined condition is
/// placed at the most-inner level of its two halves rather than each half
/// being placed separately, which is this pass's whole point. The lowering
/// delivers split form already, and the verifier rejects trees that
/// violate it.
///
/// `Break` subtrees are left untouched: moving a filter across a `break`
/// changes which iteration the loop stops at.
pub struct HoistConditionsPass;

impl RamTransformer for HoistConditionsPass {
    fn name(&self) -> &'static str {
        "HoistConditions"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        let levels = unit.analysis::<ConditionLevelAnalysis>();

        hoist_conditions(unit.program_mut(), &levels)
    }
}

/// Hoists the filters of every query in `program`, see
/// [`HoistConditionsPass`]. Returns whether any filter was relocated.
pub fn hoist_conditions(program: &mut Program, levels: &ConditionLevels) -> bool {
    let mut changed = false;

    program.for_each_query_mut(|root| {
        let original = mem::replace(root, Operation::SubroutineReturn { args: SmallVec::new() });
        let mut pending: Pending = SmallVec::new();

        let stripped = strip_filters(original.clone(), levels, &mut pending);
        let rebuilt = reinsert(stripped, &mut pending);

        // tuple-independent conditions wrap the whole query
        let rebuilt = wrap_filters(rebuilt, take_level(&mut pending, None));

        assert!(
            pending.is_empty(),
            "filter condition references a tuple level never bound in its query: {}",
            pending[0].1
        );

        if rebuilt != original {
            changed = true;
        }

        *root = rebuilt;
    });

    changed
}

/// Conditions stripped out of a query, each with its level, in pre-order
/// of the filters they came from. Pre-order is what makes the rewrite
/// stable: conditions landing at the same level keep their relative
/// nesting.
type Pending = SmallVec<[(Option<usize>, Condition); 8]>;

fn strip_filters(op: Operation, levels: &ConditionLevels, pending: &mut Pending) -> Operation {
    match op {
        Operation::Filter { condition, body } => {
            pending.push((levels.level(&condition), condition));

            strip_filters(*body, levels, pending)
        }
        // a break's subtree is a hoisting barrier
        barrier @ Operation::Break { .. } => barrier,
        mut other => {
            if let Some(body) = other.body_mut() {
                let inner = mem::replace(body, Operation::SubroutineReturn { args: SmallVec::new() });

                *body = strip_filters(inner, levels, pending);
            }

            other
        }
    }
}

fn reinsert(op: Operation, pending: &mut Pending) -> Operation {
    match op {
        barrier @ Operation::Break { .. } => barrier,
        mut other => {
            let binds = other.binding_level();

            if let Some(body) = other.body_mut() {
                let inner = mem::replace(body, Operation::SubroutineReturn { args: SmallVec::new() });
                let inner = reinsert(inner, pending);

                *body = match binds {
                    Some(level) => wrap_filters(inner, take_level(pending, Some(level))),
                    None => inner,
                };
            }

            other
        }
    }
}

fn take_level(pending: &mut Pending, level: Option<usize>) -> SmallVec<[Condition; 4]> {
    let mut taken = SmallVec::new();
    let mut rest = Pending::new();

    for (l, condition) in pending.drain(..) {
        if l == level {
            taken.push(condition);
        } else {
            rest.push((l, condition));
        }
    }

    *pending = rest;

    taken
}

fn wrap_filters(body: Operation, conditions: SmallVec<[Condition; 4]>) -> Operation {
    // fold right so the earliest-collected condition is outermost
    conditions
        .into_iter()
        .rev()
        .fold(body, |acc, condition| Operation::filter(condition, acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::condition_level;
    use crate::ram::{visit, Expression as E, Relation, Statement};
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
        HoistConditionsPass.apply(unit)
    }

    fn filter_conditions(op: &Operation) -> Vec<Condition> {
        let mut conds = Vec::new();

        visit::for_each_operation(op, &mut |op| {
            if let Operation::Filter { condition, .. } = op {
                conds.push(condition.clone());
            }
        });

        conds
    }

    /// The S1 skeleton: two nested scans with a tuple-independent filter
    /// and a filter on the outer tuple buried at the innermost position.
    fn s1() -> Operation {
        Operation::scan(
            "A",
            0,
            Operation::scan(
                "B",
                1,
                Operation::filter(
                    Condition::True,
                    Operation::filter(
                        Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                        Operation::project("C", vec![E::tuple_element(1, 0)]),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn hoists_to_the_outermost_legal_position() {
        let mut unit = unit_with(s1());

        assert!(run(&mut unit));

        let expected = Operation::filter(
            Condition::True,
            Operation::scan(
                "A",
                0,
                Operation::filter(
                    Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                    Operation::scan("B", 1, Operation::project("C", vec![E::tuple_element(1, 0)])),
                ),
            ),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn is_idempotent() {
        let mut unit = unit_with(s1());

        run(&mut unit);

        let once = root(&unit).clone();

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &once);
    }

    #[test]
    fn preserves_the_multiset_of_conditions() {
        let mut unit = unit_with(s1());
        let mut before = filter_conditions(root(&unit));

        run(&mut unit);

        let mut after = filter_conditions(root(&unit));

        before.sort_by_key(|c| c.to_string());
        after.sort_by_key(|c| c.to_string());

        assert_eq!(before, after);
    }

    #[test]
    fn every_filter_lands_at_or_above_its_level() {
        let mut unit = unit_with(s1());

        run(&mut unit);

        // walk the nest tracking the innermost binding depth; every filter's
        // condition level must be bounded by it
        fn check(op: &Operation, innermost: Option<usize>) {
            if let Operation::Filter { condition, .. } = op {
                assert!(condition_level(condition) <= innermost);
            }

            let inner = op.binding_level().or(innermost);

            if let Some(body) = op.body() {
                check(body, inner);
            }
        }

        check(root(&unit), None);
    }

    #[test]
    fn already_hoisted_queries_are_untouched() {
        let hoisted = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                Operation::scan("B", 1, Operation::project("C", vec![E::tuple_element(1, 0)])),
            ),
        );
        let mut unit = unit_with(hoisted.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &hoisted);
    }

    #[test]
    fn filters_at_one_level_keep_their_relative_order() {
        let first = Condition::eq(E::tuple_element(0, 0), E::constant(1));
        let second = Condition::eq(E::tuple_element(0, 1), E::constant(2));
        let query = Operation::scan(
            "A",
            0,
            Operation::scan(
                "B",
                1,
                Operation::filter(
                    first.clone(),
                    Operation::filter(
                        second.clone(),
                        Operation::project("C", vec![E::tuple_element(1, 2)]),
                    ),
                ),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::scan(
            "A",
            0,
            Operation::filter(
                first,
                Operation::filter(
                    second,
                    Operation::scan("B", 1, Operation::project("C", vec![E::tuple_element(1, 2)])),
                ),
            ),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn break_bodies_are_left_alone() {
        let query = Operation::scan(
            "A",
            0,
            Operation::break_if(
                Condition::eq(E::tuple_element(0, 0), E::constant(3)),
                Operation::filter(
                    Condition::True,
                    Operation::project("C", vec![E::tuple_element(0, 1)]),
                ),
            ),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }
}
