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
use crate::ram::{visit, Operation, Program};
use crate::transforms::common::contains_break;
use crate::unit::TranslationUnit;
use smallvec::SmallVec;
use std::mem;

/// Converts "find any matching tuple" scans into choices.
///
/// A scan whose body is a single filter on the scanned tuple expresses
/// "for every tuple satisfying `c`"; when the continuation cannot tell the
/// matches apart, binding *some* satisfying tuple once is enough, and a
/// choice lets the evaluator stop at the first hit:
///
/// ```text
/// QUERY                                 QUERY
///  FOR t1 IN R                           CHOICE t1 IN R WHERE t1.0 = number(7)
///   IF t1.0 = number(7)          =>       ...
///    ...
/// ```
///
/// Two guards apply. The condition must actually depend on the scanned
/// tuple (a tuple-independent condition would have been hoisted out
/// already, and converting on it would be meaningless), and the body must
/// not contain a `break`: a break counts iterations of the enclosing loop,
/// and a choice changes how many there are.
pub struct ChoiceConversionPass;

impl RamTransformer for ChoiceConversionPass {
    fn name(&self) -> &'static str {
        "ChoiceConversion"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        let levels = unit.analysis::<ConditionLevelAnalysis>();

        convert_scans(unit.program_mut(), &levels)
    }
}

/// Rewrites every eligible scan and index scan in `program`, see
/// [`ChoiceConversionPass`]. Returns whether anything was rewritten.
pub fn convert_scans(program: &mut Program, levels: &ConditionLevels) -> bool {
    let mut changed = false;

    program.for_each_query_mut(|root| {
        let op = mem::replace(root, Operation::SubroutineReturn { args: SmallVec::new() });

        *root = visit::map_operation_bottom_up(op, &mut |op| match op {
            Operation::Scan {
                relation,
                level,
                body,
            } => match *body {
                Operation::Filter { condition, body }
                    if levels.level(&condition) == Some(level) && !contains_break(&body) =>
                {
                    changed = true;

                    Operation::Choice {
                        relation,
                        level,
                        condition,
                        body,
                    }
                }
                other => Operation::Scan {
                    relation,
                    level,
                    body: Box::new(other),
                },
            },
            Operation::IndexScan {
                relation,
                level,
                pattern,
                body,
            } => match *body {
                Operation::Filter { condition, body }
                    if levels.level(&condition) == Some(level) && !contains_break(&body) =>
                {
                    changed = true;

                    Operation::IndexChoice {
                        relation,
                        level,
                        pattern,
                        condition,
                        body,
                    }
                }
                other => Operation::IndexScan {
                    relation,
                    level,
                    pattern,
                    body: Box::new(other),
                },
            },
            other => other,
        });
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{Condition, Expression as E, Relation, Statement};
    use crate::utility::SymbolTable;
    use smallvec::smallvec;

    fn unit_with(query: Operation) -> TranslationUnit {
        let program = Program::new(
            vec![
                Relation::with_attributes("R", &["x", "y", "z"]),
                Relation::with_attributes("S", &["u", "v", "w"]),
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
        ChoiceConversionPass.apply(unit)
    }

    #[test]
    fn filtered_scans_become_choices() {
        // the S5 shape
        let query = Operation::scan(
            "R",
            1,
            Operation::filter(
                Condition::eq(E::tuple_element(1, 0), E::constant(7)),
                Operation::project("S", vec![E::tuple_element(1, 1)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::Choice {
            relation: "R".to_string(),
            level: 1,
            condition: Condition::eq(E::tuple_element(1, 0), E::constant(7)),
            body: Box::new(Operation::project("S", vec![E::tuple_element(1, 1)])),
        };

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn filtered_index_scans_become_index_choices() {
        let query = Operation::index_scan(
            "R",
            1,
            vec![E::constant(3), E::Undef, E::Undef],
            Operation::filter(
                Condition::eq(E::tuple_element(1, 1), E::constant(7)),
                Operation::project("S", vec![E::tuple_element(1, 2)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::IndexChoice {
            relation: "R".to_string(),
            level: 1,
            pattern: smallvec![E::constant(3), E::Undef, E::Undef],
            condition: Condition::eq(E::tuple_element(1, 1), E::constant(7)),
            body: Box::new(Operation::project("S", vec![E::tuple_element(1, 2)])),
        };

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn breaks_in_the_body_block_the_conversion() {
        let query = Operation::scan(
            "R",
            1,
            Operation::filter(
                Condition::eq(E::tuple_element(1, 0), E::constant(7)),
                Operation::break_if(
                    Condition::eq(E::tuple_element(1, 1), E::constant(0)),
                    Operation::project("S", vec![E::tuple_element(1, 1)]),
                ),
            ),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn tuple_independent_filters_block_the_conversion() {
        // a condition that never reads t1 belongs to the hoister, not here
        let query = Operation::scan(
            "R",
            1,
            Operation::filter(
                Condition::eq(E::constant(1), E::constant(1)),
                Operation::project("S", vec![E::tuple_element(1, 0)]),
            ),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn outer_tuple_filters_block_the_conversion() {
        // the filter's level is 0, not the scanned level 1
        let query = Operation::scan(
            "R",
            0,
            Operation::scan(
                "R",
                1,
                Operation::filter(
                    Condition::eq(E::tuple_element(0, 0), E::constant(2)),
                    Operation::project("S", vec![E::tuple_element(1, 0)]),
                ),
            ),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn bare_scans_are_untouched() {
        let query = Operation::scan("R", 0, Operation::project("S", vec![E::tuple_element(0, 0)]));
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn is_idempotent() {
        let query = Operation::scan(
            "R",
            1,
            Operation::filter(
                Condition::eq(E::tuple_element(1, 0), E::constant(7)),
                Operation::project("S", vec![E::tuple_element(1, 1)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let once = root(&unit).clone();

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &once);
    }
}
