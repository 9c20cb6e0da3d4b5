//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{print_program, stringify_operation};
use crate::passes::RamTransformer;
use crate::ram::{Condition, Expression, Operation, Program, Statement};
use crate::unit::TranslationUnit;
use smallvec::SmallVec;

/// A RAM validity verification pass.
///
/// This scans the entire program and does nothing if the program is valid.
/// If it isn't, it aborts with a dump of the program, every violation
/// found, and the path to each offending node.
///
/// The invariants checked here are the ones the rewrite passes rely on:
/// nobody rewrites a broken tree into a fixed one, a broken tree is a bug
/// in whatever produced it and the only sound reaction is to fail loudly.
pub struct VerifyRamPass;

impl RamTransformer for VerifyRamPass {
    fn name(&self) -> &'static str {
        "VerifyRam"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        verify_program_panic(unit.program());

        false
    }
}

/// Verifies that an entire program is valid RAM.
///
/// This checks that every referenced relation is declared, that index and
/// probe patterns (and projected tuples) match their relation's arity,
/// that filters carry split-form conditions, that tuple levels are bound
/// once per nest and grow outer-to-inner, and that every tuple reference
/// is in scope.
///
/// If the program is invalid, the returned errors name each violation and
/// the path of operations leading to it.
pub fn verify_program(program: &Program) -> Result<(), Vec<String>> {
    let mut verifier = Verifier {
        program,
        errors: Vec::default(),
        path: Vec::default(),
    };

    verifier.check_statement(program.main());

    for (_, body) in program.subroutines() {
        verifier.check_statement(body);
    }

    if verifier.errors.is_empty() {
        Ok(())
    } else {
        Err(verifier.errors)
    }
}

/// This is [`verify_program`], except that it dumps the program and every
/// error and then panics on failure.
pub fn verify_program_panic(program: &Program) {
    if let Err(errors) = verify_program(program) {
        println!();
        print_program(program);
        println!();

        for error in &errors {
            println!("{error}");
        }

        panic!("RAM program failed verification with {} error(s)", errors.len());
    }
}

struct Verifier<'a> {
    program: &'a Program,
    errors: Vec<String>,
    path: Vec<String>,
}

impl Verifier<'_> {
    fn error(&mut self, message: String) {
        if self.path.is_empty() {
            self.errors.push(message);
        } else {
            self.errors
                .push(format!("{message}\n  at: {}", self.path.join(" > ")));
        }
    }

    fn check_relation(&mut self, name: &str) {
        if self.program.relation(name).is_none() {
            self.error(format!("reference to undeclared relation `{name}`"));
        }
    }

    fn check_pattern(&mut self, relation: &str, pattern: &[Expression], what: &str) {
        self.check_relation(relation);

        if let Some(arity) = self.program.arity(relation) {
            if pattern.len() != arity {
                self.error(format!(
                    "{what} on `{relation}` has {} slot(s), the relation has arity {arity}",
                    pattern.len()
                ));
            }
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Query(op) => {
                self.path.push("QUERY".to_string());
                self.check_operation(op, &mut SmallVec::new());
                self.path.pop();
            }
            Statement::Sequence(children) | Statement::Parallel(children) => {
                for child in children {
                    self.check_statement(child);
                }
            }
            Statement::Loop(body) => self.check_statement(body),
            Statement::DebugInfo { body, .. } => self.check_statement(body),
            Statement::Exit(cond) => {
                // statement-level conditions have no tuple scope at all
                self.check_condition(cond, &SmallVec::new());
            }
            Statement::Clear { relation }
            | Statement::IO { relation, .. }
            | Statement::LogSize { relation, .. } => self.check_relation(relation),
            Statement::Merge { target, source } => {
                self.check_relation(target);
                self.check_relation(source);

                if let (Some(t), Some(s)) = (self.program.arity(target), self.program.arity(source))
                {
                    if t != s {
                        self.error(format!(
                            "merge of `{source}` (arity {s}) into `{target}` (arity {t})"
                        ));
                    }
                }
            }
            Statement::Swap { first, second } => {
                self.check_relation(first);
                self.check_relation(second);

                if let (Some(f), Some(s)) = (self.program.arity(first), self.program.arity(second))
                {
                    if f != s {
                        self.error(format!(
                            "swap of `{first}` (arity {f}) with `{second}` (arity {s})"
                        ));
                    }
                }
            }
        }
    }

    fn check_operation(&mut self, op: &Operation, bound: &mut SmallVec<[usize; 8]>) {
        let first_line = stringify_operation(op)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        self.path.push(first_line);

        if let Some(level) = op.binding_level() {
            if bound.contains(&level) {
                self.error(format!("tuple level {level} is bound twice on this path"));
            }

            if let Some(&outer) = bound.last() {
                if level <= outer {
                    self.error(format!(
                        "binding level {level} does not exceed the enclosing level {outer}"
                    ));
                }
            }
        }

        match op {
            Operation::Scan { relation, .. } => self.check_relation(relation),
            Operation::IndexScan {
                relation, pattern, ..
            } => {
                self.check_pattern(relation, pattern, "index pattern");

                // pattern values are evaluated before the tuple is bound
                for value in pattern {
                    self.check_expression(value, bound);
                }
            }
            Operation::Choice {
                relation,
                level,
                condition,
                ..
            } => {
                self.check_relation(relation);
                self.check_scoped_condition(condition, bound, *level);
            }
            Operation::IndexChoice {
                relation,
                level,
                pattern,
                condition,
                ..
            } => {
                self.check_pattern(relation, pattern, "index pattern");

                for value in pattern {
                    self.check_expression(value, bound);
                }

                self.check_scoped_condition(condition, bound, *level);
            }
            Operation::Aggregate {
                relation,
                level,
                condition,
                expression,
                ..
            } => {
                self.check_relation(relation);
                self.check_scoped_condition(condition, bound, *level);
                self.check_scoped_expression(expression, bound, *level);
            }
            Operation::IndexAggregate {
                relation,
                level,
                pattern,
                condition,
                expression,
                ..
            } => {
                self.check_pattern(relation, pattern, "index pattern");

                for value in pattern {
                    self.check_expression(value, bound);
                }

                self.check_scoped_condition(condition, bound, *level);
                self.check_scoped_expression(expression, bound, *level);
            }
            Operation::Filter { condition, .. } => {
                if condition.is_conjunction() {
                    self.error(format!(
                        "filter condition is an unsplit conjunction: {condition}"
                    ));
                }

                self.check_condition(condition, bound);
            }
            Operation::Break { condition, .. } => self.check_condition(condition, bound),
            Operation::Project { relation, args } => {
                self.check_pattern(relation, args, "projected tuple");

                for arg in args {
                    self.check_expression(arg, bound);
                }
            }
            Operation::SubroutineReturn { args } => {
                for arg in args {
                    self.check_expression(arg, bound);
                }
            }
        }

        if let Some(body) = op.body() {
            let pushed = op.binding_level();

            if let Some(level) = pushed {
                bound.push(level);
            }

            self.check_operation(body, bound);

            if pushed.is_some() {
                bound.pop();
            }
        }

        self.path.pop();
    }

    fn check_condition(&mut self, cond: &Condition, bound: &SmallVec<[usize; 8]>) {
        match cond {
            Condition::Conjunction(lhs, rhs) => {
                self.check_condition(lhs, bound);
                self.check_condition(rhs, bound);
            }
            Condition::Negation(inner) => self.check_condition(inner, bound),
            Condition::Constraint { lhs, rhs, .. } => {
                self.check_expression(lhs, bound);
                self.check_expression(rhs, bound);
            }
            Condition::ExistenceCheck { relation, pattern }
            | Condition::ProvenanceExistenceCheck { relation, pattern } => {
                self.check_pattern(relation, pattern, "probe pattern");

                for value in pattern {
                    self.check_expression(value, bound);
                }
            }
            Condition::EmptinessCheck { relation } => self.check_relation(relation),
            Condition::True | Condition::False => {}
        }
    }

    // for guards evaluated with the operation's own tuple in scope
    fn check_scoped_condition(
        &mut self,
        cond: &Condition,
        bound: &mut SmallVec<[usize; 8]>,
        level: usize,
    ) {
        bound.push(level);
        self.check_condition(cond, bound);
        bound.pop();
    }

    fn check_scoped_expression(
        &mut self,
        expr: &Expression,
        bound: &mut SmallVec<[usize; 8]>,
        level: usize,
    ) {
        bound.push(level);
        self.check_expression(expr, bound);
        bound.pop();
    }

    fn check_expression(&mut self, expr: &Expression, bound: &SmallVec<[usize; 8]>) {
        match expr {
            Expression::TupleElement { level, .. } => {
                if !bound.contains(level) {
                    self.error(format!(
                        "dangling tuple reference: t{level} is not bound here"
                    ));
                }
            }
            Expression::Intrinsic { args, .. }
            | Expression::UserDefined { args, .. }
            | Expression::PackRecord { args } => {
                for arg in args {
                    self.check_expression(arg, bound);
                }
            }
            Expression::Constant(_)
            | Expression::AutoIncrement
            | Expression::SubroutineArg(_)
            | Expression::Undef => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{Expression as E, Relation};
    use crate::utility::SymbolTable;

    fn program_with(query: Operation) -> Program {
        Program::new(
            vec![
                Relation::with_attributes("A", &["x", "y", "z"]),
                Relation::with_attributes("C", &["u", "v", "w"]),
            ],
            Statement::query(query),
        )
    }

    fn valid_query() -> Operation {
        Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::eq(E::tuple_element(0, 0), E::constant(5)),
                Operation::project("C", vec![E::tuple_element(0, 1), E::constant(0), E::constant(1)]),
            ),
        )
    }

    #[test]
    fn valid_programs_pass() {
        assert!(verify_program(&program_with(valid_query())).is_ok());
    }

    #[test]
    fn unsplit_conjunctions_are_rejected() {
        let query = Operation::scan(
            "A",
            0,
            Operation::filter(
                Condition::and(
                    Condition::eq(E::tuple_element(0, 0), E::constant(1)),
                    Condition::eq(E::tuple_element(0, 1), E::constant(2)),
                ),
                Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
            ),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("unsplit conjunction")));
    }

    #[test]
    fn pattern_arity_mismatches_are_rejected() {
        let query = Operation::index_scan(
            "A",
            0,
            vec![E::constant(5), E::Undef],
            Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("index pattern")));
    }

    #[test]
    fn dangling_tuple_references_are_rejected() {
        let query = Operation::scan(
            "A",
            0,
            Operation::project("C", vec![E::tuple_element(3, 0), E::constant(0), E::constant(1)]),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("dangling tuple reference")));
    }

    #[test]
    fn duplicate_levels_are_rejected() {
        let query = Operation::scan(
            "A",
            0,
            Operation::scan(
                "A",
                0,
                Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
            ),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("bound twice")));
    }

    #[test]
    fn inverted_levels_are_rejected() {
        let query = Operation::scan(
            "A",
            3,
            Operation::scan(
                "A",
                1,
                Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
            ),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("does not exceed")));
    }

    #[test]
    fn unknown_relations_are_rejected() {
        let query = Operation::scan(
            "Nope",
            0,
            Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors.iter().any(|e| e.contains("undeclared relation")));
    }

    #[test]
    fn choice_conditions_may_read_their_own_tuple() {
        let query = Operation::Choice {
            relation: "A".to_string(),
            level: 0,
            condition: Condition::eq(E::tuple_element(0, 0), E::constant(7)),
            body: Box::new(Operation::project(
                "C",
                vec![E::tuple_element(0, 1), E::constant(0), E::constant(1)],
            )),
        };

        assert!(verify_program(&program_with(query)).is_ok());
    }

    #[test]
    fn errors_name_the_offending_path() {
        let query = Operation::scan(
            "A",
            0,
            Operation::project("C", vec![E::tuple_element(3, 0), E::constant(0), E::constant(1)]),
        );
        let errors = verify_program(&program_with(query)).unwrap_err();

        assert!(errors[0].contains("QUERY > FOR t0 IN A > PROJECT"));
    }

    #[test]
    #[should_panic(expected = "failed verification")]
    fn the_panicking_form_panics() {
        let query = Operation::scan(
            "Nope",
            0,
            Operation::project("C", vec![E::constant(0), E::constant(1), E::constant(2)]),
        );

        verify_program_panic(&program_with(query));
    }

    #[test]
    fn the_pass_reports_no_change() {
        let mut unit = TranslationUnit::new(program_with(valid_query()), SymbolTable::new());

        assert!(!VerifyRamPass.apply(&mut unit));
    }
}
