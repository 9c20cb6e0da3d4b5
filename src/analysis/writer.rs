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
use crate::ram::{Expression, Operation, Program, Statement};
use std::fmt::Write;

/// A RAM -> text pass that takes in a whole program and turns it into the
/// canonical text form: one node per line, indentation encoding nesting,
/// attributes on the node's own line.
///
/// This is the serialization the debug report snapshots and the form the
/// verifier dumps when it aborts; two structurally equal programs always
/// produce byte-identical text (declarations are emitted in sorted order).
#[derive(Debug, Clone)]
pub struct ProgramWriter {
    whole: String,
}

impl ProgramWriter {
    /// Stringifies a whole program.
    pub fn from(program: &Program) -> Self {
        let mut out = String::new();

        out.push_str("PROGRAM\n");

        let mut relations: Vec<_> = program.relations().collect();

        relations.sort_by_key(|r| r.name());

        for relation in relations {
            let _ = writeln!(out, " RELATION {relation}");
        }

        let mut subroutines: Vec<_> = program.subroutines().collect();

        subroutines.sort_by_key(|(name, _)| *name);

        for (name, body) in subroutines {
            let _ = writeln!(out, " SUBROUTINE {name}");
            write_statement(&mut out, body, 2);
        }

        out.push_str(" MAIN\n");
        write_statement(&mut out, program.main(), 2);

        Self { whole: out }
    }

    /// Returns the entire program as a string.
    pub fn program(&self) -> &str {
        &self.whole
    }
}

/// Prints an entire program to `stdout`.
///
/// Wrapper for when setting up a translation unit and running the writer
/// pass is too much.
pub fn print_program(program: &Program) {
    print!("{}", ProgramWriter::from(program).program());
}

/// Stringifies a single operation nest in the canonical form, rooted at
/// indentation zero. Used for dumps of an offending node.
pub fn stringify_operation(op: &Operation) -> String {
    let mut out = String::new();

    write_operation(&mut out, op, 0);

    out
}

/// This is an analysis that provides a [`ProgramWriter`] to any code that
/// wants one, so consecutive printing passes behind an unchanged program
/// share the same snapshot.
#[derive(Default)]
pub struct ProgramTextAnalysis;

impl RamAnalysis for ProgramTextAnalysis {
    type Result = ProgramWriter;

    fn name(&self) -> &'static str {
        "program-text"
    }

    fn run(&self, program: &Program) -> ProgramWriter {
        ProgramWriter::from(program)
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push(' ');
    }
}

fn write_statement(out: &mut String, stmt: &Statement, depth: usize) {
    indent(out, depth);

    match stmt {
        Statement::Query(op) => {
            out.push_str("QUERY\n");
            write_operation(out, op, depth + 1);
        }
        Statement::Sequence(children) => {
            out.push_str("SEQUENCE\n");

            for child in children {
                write_statement(out, child, depth + 1);
            }
        }
        Statement::Parallel(children) => {
            out.push_str("PARALLEL\n");

            for child in children {
                write_statement(out, child, depth + 1);
            }
        }
        Statement::Loop(body) => {
            out.push_str("LOOP\n");
            write_statement(out, body, depth + 1);
        }
        Statement::Exit(cond) => {
            let _ = writeln!(out, "EXIT {cond}");
        }
        Statement::Clear { relation } => {
            let _ = writeln!(out, "CLEAR {relation}");
        }
        Statement::Merge { target, source } => {
            let _ = writeln!(out, "MERGE {source} INTO {target}");
        }
        Statement::Swap { first, second } => {
            let _ = writeln!(out, "SWAP ({first}, {second})");
        }
        Statement::IO {
            relation,
            directives,
        } => {
            let _ = write!(out, "IO {relation} (");

            for (i, (key, value)) in directives.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                }

                let _ = write!(out, "{key}=\"{value}\"");
            }

            out.push_str(")\n");
        }
        Statement::LogSize { relation, message } => {
            let _ = writeln!(out, "LOGSIZE {relation} \"{message}\"");
        }
        Statement::DebugInfo { message, body } => {
            let _ = writeln!(out, "DEBUG \"{message}\"");
            write_statement(out, body, depth + 1);
        }
    }
}

fn write_operation(out: &mut String, op: &Operation, depth: usize) {
    indent(out, depth);

    match op {
        Operation::Scan {
            relation,
            level,
            body,
        } => {
            let _ = writeln!(out, "FOR t{level} IN {relation}");
            write_operation(out, body, depth + 1);
        }
        Operation::IndexScan {
            relation,
            level,
            pattern,
            body,
        } => {
            let _ = write!(out, "SEARCH t{level} IN {relation}");
            write_index(out, *level, pattern);
            out.push('\n');
            write_operation(out, body, depth + 1);
        }
        Operation::Choice {
            relation,
            level,
            condition,
            body,
        } => {
            let _ = writeln!(out, "CHOICE t{level} IN {relation} WHERE {condition}");
            write_operation(out, body, depth + 1);
        }
        Operation::IndexChoice {
            relation,
            level,
            pattern,
            condition,
            body,
        } => {
            let _ = write!(out, "CHOICE t{level} IN {relation}");
            write_index(out, *level, pattern);
            let _ = writeln!(out, " WHERE {condition}");
            write_operation(out, body, depth + 1);
        }
        Operation::Aggregate {
            op,
            relation,
            level,
            condition,
            expression,
            body,
        } => {
            let _ = writeln!(
                out,
                "AGGREGATE t{level} = {} {expression} IN {relation} WHERE {condition}",
                op.name()
            );
            write_operation(out, body, depth + 1);
        }
        Operation::IndexAggregate {
            op,
            relation,
            level,
            pattern,
            condition,
            expression,
            body,
        } => {
            let _ = write!(
                out,
                "AGGREGATE t{level} = {} {expression} IN {relation}",
                op.name()
            );
            write_index(out, *level, pattern);
            let _ = writeln!(out, " WHERE {condition}");
            write_operation(out, body, depth + 1);
        }
        Operation::Filter { condition, body } => {
            let _ = writeln!(out, "IF {condition}");
            write_operation(out, body, depth + 1);
        }
        Operation::Break { condition, body } => {
            let _ = writeln!(out, "BREAK IF {condition}");
            write_operation(out, body, depth + 1);
        }
        Operation::Project { relation, args } => {
            out.push_str("PROJECT (");
            write_args(out, args);
            let _ = writeln!(out, ") INTO {relation}");
        }
        Operation::SubroutineReturn { args } => {
            out.push_str("RETURN (");
            write_args(out, args);
            out.push_str(")\n");
        }
    }
}

fn write_index(out: &mut String, level: usize, pattern: &[Expression]) {
    let mut first = true;

    for (column, value) in pattern.iter().enumerate() {
        if value.is_undef() {
            continue;
        }

        let _ = write!(
            out,
            "{} t{level}.{column} = {value}",
            if first { " ON INDEX" } else { " AND" }
        );

        first = false;
    }
}

fn write_args(out: &mut String, args: &[Expression]) {
    for (i, arg) in args.iter().enumerate() {
        if i != 0 {
            out.push(',');
        }

        let _ = write!(out, "{arg}");
    }
}
