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
use crate::unit::TranslationUnit;

/// Manages running a fixed sequence of passes over a translation unit.
///
/// An important note is that this is actually a transformer itself, it's a
/// pass that simply runs other passes. That is what lets a whole pipeline
/// be wrapped by the debug-report decorator or nested in a larger
/// pipeline.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn RamTransformer>>,
}

impl PassManager {
    /// Creates a new, empty pass manager.
    pub fn new() -> Self {
        Self {
            passes: Vec::default(),
        }
    }

    /// Adds a pass to the manager. This pass's order is defined relative
    /// to other calls to [`Self::add_pass`].
    pub fn add_pass<T: RamTransformer + 'static>(&mut self, pass: T) {
        self.passes.push(Box::new(pass));
    }

    /// Adds an already-boxed pass, e.g. one wrapped by
    /// [`DebugReportPass`](crate::transforms::DebugReportPass).
    pub fn add_boxed_pass(&mut self, pass: Box<dyn RamTransformer>) {
        self.passes.push(pass);
    }

    /// Applies the sequence once, in insertion order. Returns whether any
    /// pass rewrote the program.
    pub fn run(&mut self, unit: &mut TranslationUnit) -> bool {
        let mut changed = false;

        for pass in self.passes.iter_mut() {
            changed |= pass.apply(unit);
        }

        changed
    }
}

impl RamTransformer for PassManager {
    fn name(&self) -> &'static str {
        "PassManager"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        self.run(unit)
    }
}
