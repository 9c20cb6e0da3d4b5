//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the "transform" passes of the mid-end.
//!
//! These are the passes that can (potentially) modify RAM, and don't
//! logically yield a result. Some of them are not actually
//! transformations (the verifier and the printers manipulate no IR), but
//! most of them are.
//!
//! The optimization sequence is ordered: hoisting establishes the normal
//! form the index rewrite matches on, the index rewrite produces the
//! index scans that if-conversion and choice-conversion inspect. The
//! [`default_pipeline`](crate::default_pipeline) helper wires them up in
//! that order.

/// Shared helper utilities used by multiple transform passes.
pub mod common;

mod choice_conversion;
mod hoist;
mod if_conversion;
mod make_index;
mod printers;
mod verify;

pub use choice_conversion::*;
pub use hoist::*;
pub use if_conversion::*;
pub use make_index::*;
pub use printers::*;
pub use verify::*;
