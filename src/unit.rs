//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The translation unit: one RAM program plus everything the pass
//! pipeline needs around it.

use crate::diagnostics::ErrorReport;
use crate::passes::RamAnalysis;
use crate::ram::Program;
use crate::utility::{SaHashMap, SymbolTable};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

/// Owns a RAM program, its symbol table, a diagnostics sink, and a lazily
/// populated cache of analysis results.
///
/// The front end builds one of these per compilation; the pass pipeline
/// rewrites the program in place; the back end finally takes the program
/// out by value. Analyses are requested through [`Self::analysis`] and are
/// cached by the analysis type's identity until a transformer reports a
/// change, at which point the entire cache is dropped (see
/// [`RamTransformer::apply`](crate::passes::RamTransformer::apply)).
pub struct TranslationUnit {
    program: Program,
    symbols: SymbolTable,
    errors: ErrorReport,
    cache: RefCell<SaHashMap<TypeId, Rc<dyn Any>>>,
}

impl TranslationUnit {
    /// Creates a unit from a lowered program and its symbol table.
    pub fn new(program: Program, symbols: SymbolTable) -> Self {
        Self {
            program,
            symbols,
            errors: ErrorReport::new(),
            cache: RefCell::new(SaHashMap::default()),
        }
    }

    /// The current program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Mutable access to the program, for transformers.
    ///
    /// Mutating through this without going through
    /// [`RamTransformer::apply`](crate::passes::RamTransformer::apply)
    /// leaves the analysis cache stale; call [`Self::invalidate_analyses`]
    /// yourself if you must rewrite outside a pass.
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// The unit's symbol-table handle, carried for the executor back
    /// ends; the RAM passes never look inside.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The unit's diagnostics sink.
    pub fn error_report(&self) -> &ErrorReport {
        &self.errors
    }

    /// Mutable access to the diagnostics sink.
    pub fn error_report_mut(&mut self) -> &mut ErrorReport {
        &mut self.errors
    }

    /// Lazily gets the result of an analysis.
    ///
    /// If a valid cached result exists it is returned directly; otherwise
    /// the analysis runs against the current program, the result is
    /// cached, and a handle to it is returned.
    pub fn analysis<A: RamAnalysis + Default>(&self) -> Rc<A::Result> {
        let id = TypeId::of::<A>();

        {
            let cache = self.cache.borrow();

            if let Some(hit) = cache.get(&id) {
                return Rc::clone(hit)
                    .downcast::<A::Result>()
                    .ok()
                    .expect("cached analysis result has the wrong type");
            }
        }

        // not cached (or invalidated): recompute outside of the borrow so
        // an analysis may itself request other analyses
        let result = Rc::new(A::default().run(&self.program));

        self.cache
            .borrow_mut()
            .insert(id, Rc::clone(&result) as Rc<dyn Any>);

        result
    }

    /// Drops every cached analysis result.
    pub fn invalidate_analyses(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Hands the program and symbol table off by value, consuming the
    /// unit. This is the hand-over point to an executor back end.
    pub fn into_parts(self) -> (Program, SymbolTable) {
        (self.program, self.symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::{Operation, Relation, Statement};
    use std::cell::Cell;

    thread_local! {
        static RUNS: Cell<usize> = const { Cell::new(0) };
    }

    #[derive(Default)]
    struct CountingAnalysis;

    impl RamAnalysis for CountingAnalysis {
        type Result = usize;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&self, _: &Program) -> usize {
            RUNS.with(|r| {
                r.set(r.get() + 1);
                r.get()
            })
        }
    }

    fn unit() -> TranslationUnit {
        let program = Program::new(
            vec![Relation::with_attributes("A", &["x"])],
            Statement::query(Operation::project("A", vec![])),
        );

        TranslationUnit::new(program, SymbolTable::new())
    }

    #[test]
    fn analysis_is_computed_once_until_invalidated() {
        let unit = unit();
        let before = RUNS.with(|r| r.get());

        let first = unit.analysis::<CountingAnalysis>();
        let second = unit.analysis::<CountingAnalysis>();

        assert_eq!(*first, *second);
        assert_eq!(RUNS.with(|r| r.get()), before + 1);

        unit.invalidate_analyses();

        let third = unit.analysis::<CountingAnalysis>();

        assert_eq!(RUNS.with(|r| r.get()), before + 2);
        assert_eq!(*third, before + 2);
    }
}
