//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the pass infrastructure of the mid-end.
//!
//! Passes are broken down into two categories:
//!
//! 1. Transformations
//! 2. Analyses
//!
//! A transformation ([`RamTransformer`]) rewrites the program of a
//! translation unit and reports whether it changed anything. An analysis
//! ([`RamAnalysis`]) computes a result from the current program without
//! touching it; results live in the translation unit's cache, keyed by the
//! analysis type, and are recomputed lazily after any transformation
//! reports a change.
//!
//! The concrete analyses live in [`crate::analysis`] and the concrete
//! transformations in [`crate::transforms`]; this module only defines the
//! contracts and the [`PassManager`] that drives a fixed sequence of
//! transformations.

mod analysis;
mod manager;
mod transform;

pub use analysis::*;
pub use manager::*;
pub use transform::*;
