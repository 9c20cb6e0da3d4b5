//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{ProgramTextAnalysis, ProgramWriter};
use crate::passes::RamTransformer;
use crate::unit::TranslationUnit;
use std::io;
use std::io::Write;

/// This is a pass that writes out the canonical text of the program to a
/// given stream.
pub struct ProgramWriterPass {
    out: Box<dyn io::Write>,
}

impl ProgramWriterPass {
    /// Shorthand for a writer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a writer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    ///
    /// This writer is where the program is printed when the pass runs.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl RamTransformer for ProgramWriterPass {
    fn name(&self) -> &'static str {
        "ProgramWriter"
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        let writer = unit.analysis::<ProgramTextAnalysis>();

        self.out
            .write_all(writer.program().as_bytes())
            .expect("unable to write program to writer");

        false
    }
}

/// Decorates another pass with before/after snapshots for the debug
/// report.
///
/// The wrapped pass runs exactly as it would on its own; when it reports a
/// change, the canonical text of the program from before and after the run
/// is written to the sink. Unchanged runs emit a single marker line, so
/// the report still shows the pipeline's shape.
pub struct DebugReportPass {
    inner: Box<dyn RamTransformer>,
    out: Box<dyn io::Write>,
}

impl DebugReportPass {
    /// Wraps a pass, reporting to [`std::io::stderr`].
    pub fn wrap<T: RamTransformer + 'static>(pass: T) -> Self {
        Self::wrap_with_writer(pass, io::stderr())
    }

    /// Wraps a pass with a given report sink.
    pub fn wrap_with_writer<T, W>(pass: T, writer: W) -> Self
    where
        T: RamTransformer + 'static,
        W: io::Write + 'static,
    {
        Self {
            inner: Box::new(pass),
            out: Box::new(writer),
        }
    }
}

impl RamTransformer for DebugReportPass {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn transform(&mut self, unit: &mut TranslationUnit) -> bool {
        let before = ProgramWriter::from(unit.program()).program().to_string();
        let changed = self.inner.transform(unit);

        if changed {
            let after = ProgramWriter::from(unit.program()).program().to_string();

            writeln!(
                self.out,
                "=== {} ===\n--- before ---\n{before}--- after ---\n{after}",
                self.inner.name()
            )
            .expect("unable to write debug report");
        } else {
            writeln!(self.out, "=== {} (unchanged) ===", self.inner.name())
                .expect("unable to write debug report");
        }

        changed
    }
}
