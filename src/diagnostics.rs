//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The diagnostics sink a translation unit carries.
//!
//! The RAM passes themselves never report user diagnostics, every program
//! they see has already been validated by the front end. The sink exists so
//! the phases around the mid-end (semantic checking upstream, I/O layers
//! downstream) have one place to accumulate what they want the user to
//! see.

use std::fmt;
use std::io;

/// How severe a [`Diagnostic`] is.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    /// The input is ill-formed, compilation cannot proceed past this phase.
    Error,
    /// Something is suspect but compilation can continue.
    Warning,
}

/// One message line of a [`Diagnostic`].
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DiagnosticMessage {
    message: String,
}

impl DiagnosticMessage {
    /// Creates a message from its text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A user-facing diagnostic: a severity, a primary message, and any number
/// of notes attached to it.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    primary: DiagnosticMessage,
    additional: Vec<DiagnosticMessage>,
}

impl Diagnostic {
    /// Creates a diagnostic with no attached notes.
    pub fn new(severity: Severity, primary: DiagnosticMessage) -> Self {
        Self {
            severity,
            primary,
            additional: Vec::default(),
        }
    }

    /// Attaches a note to the diagnostic.
    pub fn with_note(mut self, note: DiagnosticMessage) -> Self {
        self.additional.push(note);
        self
    }

    /// The diagnostic's severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The primary message.
    pub fn primary(&self) -> &DiagnosticMessage {
        &self.primary
    }

    /// The attached notes, in attachment order.
    pub fn notes(&self) -> &[DiagnosticMessage] {
        &self.additional
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };

        writeln!(f, "{label}: {}", self.primary)?;

        for note in &self.additional {
            writeln!(f, "{note}")?;
        }

        Ok(())
    }
}

/// Accumulates the diagnostics of a translation unit.
///
/// Errors sort before warnings when printed, insertion order is kept
/// within a severity.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the report.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Shorthand for reporting an error with no notes.
    pub fn error(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::new(
            Severity::Error,
            DiagnosticMessage::new(message),
        ));
    }

    /// Shorthand for reporting a warning with no notes.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.report(Diagnostic::new(
            Severity::Warning,
            DiagnosticMessage::new(message),
        ));
    }

    /// How many errors have been reported.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    /// How many warnings have been reported.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Whether nothing has been reported at all.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Every diagnostic, in insertion order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Writes the report, errors first, to the given sink.
    pub fn print(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let mut sorted: Vec<&Diagnostic> = self.diagnostics.iter().collect();

        sorted.sort_by_key(|d| d.severity());

        for diagnostic in sorted {
            write!(out, "{diagnostic}")?;
        }

        Ok(())
    }
}
