//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains the analyses the mid-end defines over RAM programs.
//!
//! These all model the [`RamAnalysis`] trait and range from the levelling
//! analyses the rewrite passes depend on for correctness to the canonical
//! text writer the debug tooling is built on.
//!
//! [`RamAnalysis`]: crate::passes::RamAnalysis

mod const_value;
mod levels;
mod writer;

pub use const_value::*;
pub use levels::*;
pub use writer::*;
