//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::{visit, Expression, Operation};

/// Whether any node inside `op` reads the tuple bound at `level`.
///
/// This is a purely syntactic scan over every expression in the subtree,
/// index patterns and guard conditions included. It is what decides
/// if-conversion: an index scan whose tuple is dead in its body degenerates
/// to an existence probe.
pub fn tuple_is_live(level: usize, op: &Operation) -> bool {
    let mut live = false;

    visit::for_each_expression_in_operation(op, &mut |e| {
        if let Expression::TupleElement { level: l, .. } = e {
            live |= *l == level;
        }
    });

    live
}

/// Whether the subtree contains a [`Operation::Break`] anywhere.
///
/// A `break` aborts the innermost enclosing scan, so any rewrite that
/// changes how many tuples a scan visits must refuse subtrees containing
/// one.
pub fn contains_break(op: &Operation) -> bool {
    let mut found = false;

    visit::for_each_operation(op, &mut |op| {
        found |= matches!(op, Operation::Break { .. });
    });

    found
}
