//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::expression_level;
use crate::passes::RamAnalysis;
use crate::ram::{visit, Expression, Program};

/// Whether an expression is a constant of the current query: its value
/// reads no tuple binding and cannot change between two evaluations.
///
/// Concretely that means level `None` *and* free of [`AutoIncrement`]
/// (a counter that moves on every evaluation), [`SubroutineArg`] (fixed
/// only per invocation) and user-defined functors (arbitrary external
/// code). The pattern wildcard is not a value at all and is never
/// constant.
///
/// [`AutoIncrement`]: Expression::AutoIncrement
/// [`SubroutineArg`]: Expression::SubroutineArg
pub fn is_constant(expr: &Expression) -> bool {
    if expr.is_undef() || expression_level(expr).is_some() {
        return false;
    }

    let mut constant = true;

    visit::for_each_expression(expr, &mut |e| match e {
        Expression::AutoIncrement
        | Expression::SubroutineArg(_)
        | Expression::UserDefined { .. } => constant = false,
        _ => {}
    });

    constant
}

/// The result handle of [`ConstValueAnalysis`].
pub struct ConstValues(());

impl ConstValues {
    /// See [`is_constant`].
    pub fn is_constant(&self, expr: &Expression) -> bool {
        is_constant(expr)
    }
}

/// Constness analysis: classifies expressions that the index rewrite may
/// safely fold into a query pattern without re-evaluation hazards.
#[derive(Default)]
pub struct ConstValueAnalysis;

impl RamAnalysis for ConstValueAnalysis {
    type Result = ConstValues;

    fn name(&self) -> &'static str {
        "const-value"
    }

    fn run(&self, _: &Program) -> ConstValues {
        ConstValues(())
    }
}
