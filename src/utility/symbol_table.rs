//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

/// The mid-end's handle to a translation unit's symbol table.
///
/// The table itself lives outside this crate, like the executors do: the
/// front end interns a program's string constants, the back ends resolve
/// them, and the RAM passes in between never look inside. Symbol values
/// travel through the IR as plain domain constants, so all the mid-end
/// does with the table is carry it from the lowering to an executor
/// untouched (see [`RamExecutor`](crate::executor::RamExecutor)).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable(());

impl SymbolTable {
    /// Creates the handle for a fresh translation unit.
    pub fn new() -> Self {
        Self(())
    }
}
