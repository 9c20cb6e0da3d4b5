//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Provides the types required to represent and manipulate RAM, the
//! relational algebra machine programs that Datalog compiles down to.
//!
//! The IR is a tagged tree with four node categories: [`Expression`]s
//! produce values, [`Condition`]s produce booleans, [`Operation`]s bind and
//! consume tuples inside a query, and [`Statement`]s schedule queries and
//! relation maintenance. Every child is exclusively owned by its parent;
//! the transform passes in [`crate::transforms`] rewrite the tree through
//! the mappers in [`visit`].

mod condition;
mod expression;
mod operation;
mod program;
mod relation;
mod statement;
pub mod visit;

pub use condition::*;
pub use expression::*;
pub use operation::*;
pub use program::*;
pub use relation::*;
pub use statement::*;
