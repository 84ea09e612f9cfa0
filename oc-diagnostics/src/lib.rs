//! Diagnostic collection and formatting.
//!
//! Grounded on `vex-diagnostics`: a `Diagnostic` builder plus a
//! `DiagnosticEngine` that accumulates diagnostics and tracks an error
//! count. The message shape here is narrower than vex's (no rustc-style
//! source snippets) because the source language's own diagnostics are a
//! single `line.file.col: message` per spec.md's worked scenarios in §8 --
//! that ordering (line first, then file, then column) looks backwards
//! next to the "file.line.col" prose in §6/§7, but it's what every worked
//! example actually prints, so it's what we print. See DESIGN.md.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index into a per-compilation file table. File 0 is unused; the file
/// named on the command line is file 1, matching the source language's
/// own one-based file numbering.
pub type FileId = u32;

pub const MAIN_FILE: FileId = 1;

/// A single point in source: the unit this project's diagnostics key off
/// of. The language has no multi-character span concept in its own
/// diagnostics -- every message points at one token's start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    pub line: u32,
    pub file: FileId,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        SourceLoc { file, line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.line, self.file, self.column)
    }
}

/// A table mapping file indices to display names, populated as the lexer
/// consumes `# <line> "<file>"` preprocessor markers.
#[derive(Debug, Default, Clone)]
pub struct FileTable {
    names: Vec<String>,
}

impl FileTable {
    pub fn new() -> Self {
        FileTable { names: vec![String::new()] }
    }

    /// Registers `name`, returning its existing id if already known or a
    /// freshly allocated one otherwise.
    pub fn intern(&mut self, name: &str) -> FileId {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return pos as FileId;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as FileId
    }

    pub fn name(&self, id: FileId) -> &str {
        self.names.get(id as usize).map(String::as_str).unwrap_or("<unknown>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub loc: SourceLoc,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(loc: SourceLoc, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Error, loc, message: message.into(), notes: Vec::new() }
    }

    pub fn warning(loc: SourceLoc, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, loc, message: message.into(), notes: Vec::new() }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Renders exactly the wire format the original tool prints:
    /// `line.file.col: message`, one line, with any notes appended inline
    /// (the source language has no multi-line diagnostic convention).
    pub fn format(&self) -> String {
        let mut out = format!("{}: {}", self.loc, self.message);
        for note in &self.notes {
            out.push_str(". ");
            out.push_str(note);
        }
        out
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        let tag = match self.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".cyan().bold(),
        };
        format!("{} {}", tag, self.format())
    }
}

/// Accumulates diagnostics across a compilation unit and tracks the
/// semantic-error count that gates emission (spec.md §7: a non-zero count
/// after the semantic pass means emission must not run, exit code 2).
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, loc: SourceLoc, message: impl Into<String>) {
        self.emit(Diagnostic::error(loc, message));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn print_all(&self, use_color: bool) {
        for d in &self.diagnostics {
            if use_color {
                eprintln!("{}", d.format_colored());
            } else {
                eprintln!("{}", d.format());
            }
        }
    }
}

/// `strsim`-backed "did you mean" suggestions for undefined-identifier
/// diagnostics, grounded on `vex-diagnostics::fuzzy`.
pub mod fuzzy {
    use strsim::jaro_winkler;

    /// Returns candidates from `known` similar enough to `name` to suggest,
    /// closest first.
    pub fn find_similar<'a>(name: &str, known: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        let mut scored: Vec<(f64, &str)> =
            known.map(|k| (jaro_winkler(name, k), k)).filter(|(score, _)| *score > 0.75).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, k)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_undefined_identifier() {
        let loc = SourceLoc::new(MAIN_FILE, 1, 15);
        let d = Diagnostic::error(loc, "identifier 'x' is undefined");
        assert_eq!(d.format(), "1.1.15: identifier 'x' is undefined");
    }

    #[test]
    fn formats_duplicate_declaration_with_note() {
        let loc = SourceLoc::new(MAIN_FILE, 2, 5);
        let prev = SourceLoc::new(MAIN_FILE, 1, 5);
        let d = Diagnostic::error(loc, "duplicate declaration of identifier 'x'")
            .with_note(&format!("Previous declaration at {prev}"));
        assert_eq!(
            d.format(),
            "2.1.5: duplicate declaration of identifier 'x'. Previous declaration at 1.1.5"
        );
    }

    #[test]
    fn engine_tracks_error_count() {
        let mut engine = DiagnosticEngine::new();
        assert!(!engine.has_errors());
        engine.error(SourceLoc::new(MAIN_FILE, 1, 1), "boom");
        assert!(engine.has_errors());
        assert_eq!(engine.error_count(), 1);
    }

    #[test]
    fn file_table_interns_by_name() {
        let mut table = FileTable::new();
        let a = table.intern("main.oc");
        let b = table.intern("main.oc");
        let c = table.intern("lib.oc");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fuzzy_suggests_close_names() {
        let known = ["length", "count", "total"];
        let hits = fuzzy::find_similar("lenght", known.iter().copied());
        assert_eq!(hits.first(), Some(&"length"));
    }
}
