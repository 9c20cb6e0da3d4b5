//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::Program;
use std::any::Any;

/// An analysis over a RAM program.
///
/// Analyses are pure functions of the current program: running the same
/// analysis twice on the same tree must produce the same result. Their
/// identity is the implementing type itself, which is how the translation
/// unit keys its cache (see
/// [`TranslationUnit::analysis`](crate::unit::TranslationUnit::analysis)),
/// and [`Self::name`] is the stable human label for diagnostics.
///
/// Results are cached until a transformer reports a change, at which point
/// the whole cache is dropped. There is no finer-grained preservation
/// tracking: with one IR unit and a handful of cheap analyses, clearing
/// everything on any mutation is the simplest policy that cannot go stale.
pub trait RamAnalysis: Any {
    /// The result type this analysis computes.
    type Result: Any;

    /// A stable, human-readable label for the analysis.
    fn name(&self) -> &'static str;

    /// Computes the result by walking the given program.
    fn run(&self, program: &Program) -> Self::Result;
}
