//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Garnet
//!
//! The mid-end of a Datalog compiler: the Relational Algebra Machine
//! (RAM) IR that queries are lowered into, and the passes that optimize
//! it before it is handed to an executor back end.
//!
//! The front end delivers a [`ram::Program`] inside a
//! [`unit::TranslationUnit`]; [`optimize`] runs the standard pipeline over
//! it; the back end takes the program out and evaluates or compiles it
//! (see [`executor::RamExecutor`]). The pipeline's order matters, each
//! pass consumes the normal form the previous one establishes:
//!
//! 1. [`HoistConditionsPass`] pushes every filter to the outermost legal
//!    position, parking tuple constraints right below their binding.
//! 2. [`MakeIndexPass`] folds the equality constraints parked below a scan
//!    or aggregate into an index pattern.
//! 3. [`IfConversionPass`] degrades index scans whose tuple is never read
//!    into existence checks.
//! 4. [`ChoiceConversionPass`] turns "find any match" scans into choices
//!    the evaluator can short-circuit.
//!
//! [`HoistConditionsPass`]: transforms::HoistConditionsPass
//! [`MakeIndexPass`]: transforms::MakeIndexPass
//! [`IfConversionPass`]: transforms::IfConversionPass
//! [`ChoiceConversionPass`]: transforms::ChoiceConversionPass

pub mod analysis;
pub mod diagnostics;
pub mod executor;
pub mod passes;
pub mod ram;
pub mod transforms;
pub mod unit;
pub mod utility;

use crate::passes::{PassManager, RamTransformer};
use crate::transforms::{
    ChoiceConversionPass, DebugReportPass, HoistConditionsPass, IfConversionPass, MakeIndexPass,
    ProgramWriterPass, VerifyRamPass,
};
use crate::unit::TranslationUnit;

/// Builds the standard optimization pipeline in its fixed order.
pub fn default_pipeline() -> PassManager {
    let mut manager = PassManager::new();

    manager.add_pass(HoistConditionsPass);
    manager.add_pass(MakeIndexPass);
    manager.add_pass(IfConversionPass);
    manager.add_pass(ChoiceConversionPass);

    manager
}

/// Runs the standard pipeline once over a translation unit. Returns
/// whether anything was rewritten.
pub fn optimize(unit: &mut TranslationUnit) -> bool {
    default_pipeline().run(unit)
}

/// A helper function that handles "run these passes specified by the user"
/// in a way that multiple tools can use.
///
/// This is not intended for the pre-determined pipeline (use [`optimize`]
/// for that), but is useful for debugging tools that take a pass list on
/// the command line.
///
/// - `verify` is whether to insert verify passes between all passes
/// - `report` is whether to wrap each pass in a debug-report decorator
/// - `passes` is the user-specified list of pass names
pub fn run_passes(unit: &mut TranslationUnit, verify: bool, report: bool, passes: &[String]) {
    let mut manager = PassManager::new();

    if verify {
        manager.add_pass(VerifyRamPass);
    }

    for pass in passes {
        let resolved: Box<dyn RamTransformer> = match pass.as_str() {
            "hoist-conditions" => Box::new(HoistConditionsPass),
            "make-index" => Box::new(MakeIndexPass),
            "if-conversion" => Box::new(IfConversionPass),
            "choice-conversion" => Box::new(ChoiceConversionPass),
            "verify" => Box::new(VerifyRamPass),
            "program-stdout" => Box::new(ProgramWriterPass::stdout()),
            "program-stderr" => Box::new(ProgramWriterPass::stderr()),
            unknown => panic!("unknown pass name: {unknown}"),
        };

        if report {
            manager.add_pass(DebugReportPass::wrap(BoxedPass(resolved)));
        } else {
            manager.add_boxed_pass(resolved);
        }

        if verify {
            manager.add_pass(VerifyRamPass);
        }
    }

    manager.run(unit);
}

// lets an already-boxed pass go through APIs that take a concrete type
struct BoxedPass(Box<dyn RamTransformer>);

impl RamTransformer for BoxedPass {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        self.0.transform(unit)
    }
}
