//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The contract between the mid-end and the executor back ends.
//!
//! Once the pass pipeline is done, the program and symbol table are taken
//! out of the translation unit (see
//! [`TranslationUnit::into_parts`](crate::unit::TranslationUnit::into_parts))
//! and handed to an implementation of [`RamExecutor`]. The IR is the whole
//! contract; there is no side channel between the mid-end and a back end.

use crate::ram::Program;
use crate::utility::SymbolTable;
use std::io;
use std::path::Path;

/// A back end that can consume an optimized RAM program.
///
/// Implementations are interpreters, native compilers, or source-code
/// generators; none of them live in this crate. The program is passed by
/// value where execution consumes it: ownership transfers, and the
/// mid-end keeps no handle on the tree afterwards.
pub trait RamExecutor {
    /// Writes generated source code for `program` to `out` without
    /// compiling or running anything.
    fn generate_code(
        &self,
        symbols: &SymbolTable,
        program: &Program,
        out: &Path,
    ) -> io::Result<()>;

    /// Compiles `program` down to a binary without running it.
    fn compile_to_binary(&self, symbols: &SymbolTable, program: Program) -> io::Result<()>;

    /// Evaluates `program` to completion.
    fn execute(&self, symbols: &SymbolTable, program: Program) -> io::Result<()>;
}
