//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::passes::RamTransformer;
use crate::ram::{visit, Condition, Operation, Program};
use crate::transforms::common::tuple_is_live;
use crate::unit::TranslationUnit;
use smallvec::SmallVec;
use std::mem;

/// Converts index scans whose bound tuple is dead into existence checks.
///
/// An index scan that binds a tuple nothing ever reads degenerates to the
/// question "does any tuple match the pattern", which an evaluator can
/// answer with a single probe instead of a loop:
///
/// ```text
/// QUERY                                          QUERY
///  SEARCH t1 IN A ON INDEX t1.0 = number(10)      IF (number(10),_) IN A
///   ... no occurrence of t1              =>        ...
/// ```
///
/// Liveness is syntactic: the tuple is live iff some `t{l}.k` occurs in
/// the scan's body. The rewrite applies bottom-up, so a scan whose body
/// only used the tuple in a deeper scan that itself got converted is
/// caught in the same run.
pub struct IfConversionPass;

impl RamTransformer for IfConversionPass {
    fn name(&self) -> &'static str {
        "IfConversion"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        convert_index_scans(unit.program_mut())
    }
}

/// Rewrites every dead index scan in `program`, see [`IfConversionPass`].
/// Returns whether anything was rewritten.
pub fn convert_index_scans(program: &mut Program) -> bool {
    let mut changed = false;

    program.for_each_query_mut(|root| {
        let op = mem::replace(root, Operation::SubroutineReturn { args: SmallVec::new() });

        *root = visit::map_operation_bottom_up(op, &mut |op| match op {
            Operation::IndexScan {
                relation,
                level,
                pattern,
                body,
            } if !tuple_is_live(level, &body) => {
                changed = true;

                Operation::Filter {
                    condition: Condition::ExistenceCheck { relation, pattern },
                    body,
                }
            }
            other => other,
        });
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{Expression as E, Relation, Statement};
    use crate::utility::SymbolTable;

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
        IfConversionPass.apply(unit)
    }

    #[test]
    fn dead_index_scans_become_existence_checks() {
        // the S3 shape: the body never reads tuple 2
        let query = Operation::index_scan(
            "R",
            2,
            vec![E::constant(1), E::Undef, E::Undef],
            Operation::project("S", vec![E::constant(0)]),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::filter(
            Condition::exists("R", vec![E::constant(1), E::Undef, E::Undef]),
            Operation::project("S", vec![E::constant(0)]),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn live_index_scans_are_preserved() {
        // the S4 shape: the body projects t2.1
        let query = Operation::index_scan(
            "R",
            2,
            vec![E::constant(1), E::Undef, E::Undef],
            Operation::project("S", vec![E::tuple_element(2, 1)]),
        );
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }

    #[test]
    fn conversion_cascades_bottom_up() {
        // the inner scan's only use of t0 is its pattern; once the inner
        // scan is converted, t1 is dead in the outer body too... except the
        // existence check still reads t1, keeping the outer scan alive
        let query = Operation::index_scan(
            "R",
            1,
            vec![E::constant(3), E::Undef, E::Undef],
            Operation::index_scan(
                "R",
                2,
                vec![E::tuple_element(1, 0), E::Undef, E::Undef],
                Operation::project("S", vec![E::constant(0)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::index_scan(
            "R",
            1,
            vec![E::constant(3), E::Undef, E::Undef],
            Operation::filter(
                Condition::exists("R", vec![E::tuple_element(1, 0), E::Undef, E::Undef]),
                Operation::project("S", vec![E::constant(0)]),
            ),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn fully_dead_nests_collapse_in_one_run() {
        let query = Operation::index_scan(
            "R",
            1,
            vec![E::constant(3), E::Undef, E::Undef],
            Operation::index_scan(
                "R",
                2,
                vec![E::constant(4), E::Undef, E::Undef],
                Operation::project("S", vec![E::constant(0)]),
            ),
        );
        let mut unit = unit_with(query);

        assert!(run(&mut unit));

        let expected = Operation::filter(
            Condition::exists("R", vec![E::constant(3), E::Undef, E::Undef]),
            Operation::filter(
                Condition::exists("R", vec![E::constant(4), E::Undef, E::Undef]),
                Operation::project("S", vec![E::constant(0)]),
            ),
        );

        assert_eq!(root(&unit), &expected);
    }

    #[test]
    fn plain_scans_are_never_converted() {
        let query = Operation::scan("R", 0, Operation::project("S", vec![E::constant(0)]));
        let mut unit = unit_with(query.clone());

        assert!(!run(&mut unit));
        assert_eq!(root(&unit), &query);
    }
}
