//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::{Condition, Operation};
use std::collections::BTreeMap;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A top-level control-flow node of a RAM program.
///
/// Statements schedule queries and relation maintenance; the interesting
/// tuple-level work happens in the [`Operation`] nest under each
/// [`Statement::Query`]. The [`Statement::Parallel`] variant *represents*
/// back-end parallelism, it does not authorize concurrent mutation of the
/// tree.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Statement {
    /// Executes one operation nest.
    Query(Operation),
    /// Executes the children one after another.
    Sequence(Vec<Statement>),
    /// Executes the children in any order (or concurrently, in a back end
    /// that supports it).
    Parallel(Vec<Statement>),
    /// Executes the body until an enclosed [`Statement::Exit`] fires.
    Loop(Box<Statement>),
    /// Leaves the innermost enclosing loop when the condition holds.
    Exit(Condition),
    /// Removes every tuple of a relation.
    Clear {
        /// The emptied relation's name.
        relation: String,
    },
    /// Adds every tuple of `source` to `target`.
    Merge {
        /// The relation receiving the tuples.
        target: String,
        /// The relation the tuples are read from.
        source: String,
    },
    /// Exchanges the contents of two relations.
    Swap {
        /// One relation.
        first: String,
        /// The other relation.
        second: String,
    },
    /// Loads or stores a relation through an I/O driver chosen by the
    /// directive map (e.g. `IO="file"`, `filename="edge.facts"`).
    IO {
        /// The relation read or written.
        relation: String,
        /// Driver-specific key/value directives, kept sorted for a
        /// deterministic canonical form.
        directives: BTreeMap<String, String>,
    },
    /// Emits the size of a relation to the profiling log.
    LogSize {
        /// The measured relation's name.
        relation: String,
        /// The log message attached to the measurement.
        message: String,
    },
    /// Attaches a human-readable annotation to a nested statement, for the
    /// debug report.
    DebugInfo {
        /// The annotation text.
        message: String,
        /// The annotated statement.
        body: Box<Statement>,
    },
}

impl Statement {
    /// Shorthand for building a [`Statement::Query`].
    pub fn query(op: Operation) -> Self {
        Self::Query(op)
    }

    /// Shorthand for building a [`Statement::Loop`].
    pub fn repeat(body: Statement) -> Self {
        Self::Loop(Box::new(body))
    }

    /// Shorthand for building a [`Statement::DebugInfo`].
    pub fn debug_info(message: impl Into<String>, body: Statement) -> Self {
        Self::DebugInfo {
            message: message.into(),
            body: Box::new(body),
        }
    }
}
