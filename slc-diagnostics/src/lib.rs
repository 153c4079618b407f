// Diagnostics for the SLC shader compiler
// Structured messages with stable codes, severity counters and suggestions

use colored::Colorize;
use std::fmt;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "{}", "error".red().bold()),
            Severity::Warning => write!(f, "{}", "warning".yellow().bold()),
            Severity::Note => write!(f, "{}", "note".cyan().bold()),
            Severity::Help => write!(f, "{}", "help".green().bold()),
        }
    }
}

/// Structured diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String, // e.g. "E0201" for a binding conflict
    pub message: String,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: &str, message: String) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn fatal(code: &str, message: String) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    pub fn warning(code: &str, message: String) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.code.is_empty() {
            writeln!(f, "{}: {}", self.severity, self.message.bold())?;
        } else {
            writeln!(f, "{}[{}]: {}", self.severity, self.code, self.message.bold())?;
        }
        for note in &self.notes {
            writeln!(f, " {} {}", "=".cyan().bold(), note.cyan())?;
        }
        if let Some(help) = &self.help {
            writeln!(f, " {} {}", "help:".green().bold(), help)?;
        }
        Ok(())
    }
}

/// Append-only diagnostic buffer shared by a compilation
///
/// Fatal diagnostics terminate the current compilation at the call site that
/// emitted them; the engine only records and counts.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    fatal_count: usize,
    warning_count: usize,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Fatal => self.fatal_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn fatal(&mut self, code: &str, message: String) {
        self.emit(Diagnostic::fatal(code, message));
    }

    pub fn warn(&mut self, code: &str, message: String) {
        self.emit(Diagnostic::warning(code, message));
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal_count > 0
    }

    pub fn fatal_count(&self) -> usize {
        self.fatal_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print all diagnostics to stderr
    pub fn print_all(&self) {
        for diag in &self.diagnostics {
            eprintln!("{}", diag);
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        if self.fatal_count > 0 {
            eprintln!(
                "{}: {} error{} emitted",
                "error".red().bold(),
                self.fatal_count,
                if self.fatal_count == 1 { "" } else { "s" }
            );
        }
        if self.warning_count > 0 {
            eprintln!(
                "{}: {} warning{} emitted",
                "warning".yellow().bold(),
                self.warning_count,
                if self.warning_count == 1 { "" } else { "s" }
            );
        }
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.fatal_count = 0;
        self.warning_count = 0;
    }
}

/// Stable diagnostic codes
pub mod codes {
    // Declaration errors (E01xx)
    pub const LEXICAL_COLLISION: &str = "E0101";
    pub const DUPLICATE_DECLARATION: &str = "E0102";
    pub const NULL_TYPE_BINDING: &str = "E0103";
    pub const QUALIFIER_VIOLATION: &str = "E0104";
    pub const UNKNOWN_NAMED_TYPE: &str = "E0105";
    pub const UNKNOWN_INTRINSIC: &str = "E0106";
    pub const INVALID_FIELD_TYPE: &str = "E0107";

    // Template errors (E02xx)
    pub const CONCEPT_MISMATCH: &str = "E0201";
    pub const ARITY_MISMATCH: &str = "E0202";
    pub const NULL_RETURN_TYPE: &str = "E0203";

    // Codegen errors (E03xx)
    pub const INVALID_SEMANTIC: &str = "E0301";
    pub const BINDING_CONFLICT: &str = "E0302";
    pub const CODEGEN_UNREACHABLE: &str = "E0303";
    pub const PRELUDE_LOAD: &str = "E0304";

    // Warnings (W0xxx)
    pub const PARTIAL_BINDING: &str = "W0001";
}

/// Fuzzy matching utilities for "did you mean?" suggestions
pub mod fuzzy {
    use strsim::jaro_winkler;

    /// Find similar names using fuzzy matching (Jaro-Winkler distance)
    /// Returns up to `max_suggestions` names with similarity > threshold
    pub fn find_similar_names(
        target: &str,
        candidates: &[String],
        threshold: f64,
        max_suggestions: usize,
    ) -> Vec<String> {
        let mut scored: Vec<(String, f64)> = candidates
            .iter()
            .map(|candidate| {
                let similarity = jaro_winkler(target, candidate);
                (candidate.clone(), similarity)
            })
            .filter(|(_, score)| *score > threshold)
            .collect();

        // Sort by similarity (descending)
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(max_suggestions)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_format() {
        let diag = Diagnostic::fatal(
            codes::BINDING_CONFLICT,
            "push constant `params` at space 2 conflicts with other resources".to_string(),
        )
        .with_note("resource `albedo` is also bound in space 2".to_string())
        .with_help("move `albedo` to an explicit space".to_string());

        let formatted = format!("{}", diag);
        assert!(formatted.contains("E0302"));
        assert!(formatted.contains("push constant `params`"));
        assert!(formatted.contains("albedo"));
    }

    #[test]
    fn test_engine_counts() {
        let mut engine = DiagnosticEngine::new();
        engine.warn(codes::PARTIAL_BINDING, "partially constrained binding".to_string());
        assert!(!engine.has_fatal());
        assert_eq!(engine.warning_count(), 1);

        engine.fatal(codes::LEXICAL_COLLISION, "`float` is a reserved word".to_string());
        assert!(engine.has_fatal());
        assert_eq!(engine.fatal_count(), 1);
        assert_eq!(engine.diagnostics().len(), 2);

        engine.clear();
        assert!(!engine.has_fatal());
        assert_eq!(engine.diagnostics().len(), 0);
    }

    #[test]
    fn test_fuzzy_suggestions() {
        let candidates = vec![
            "WaveActiveSum".to_string(),
            "WaveActiveMax".to_string(),
            "BUFFER_READ".to_string(),
        ];
        let found = fuzzy::find_similar_names("WaveActivSum", &candidates, 0.7, 3);
        assert_eq!(found.first().map(String::as_str), Some("WaveActiveSum"));
    }
}
