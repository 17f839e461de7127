//! Positioned diagnostics (§6, §7): the single currency for user-facing
//! problems surfaced by any pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal error"),
        }
    }
}

/// A single buffered diagnostic: message plus the source position it
/// applies to. Diagnostics are accumulated during parsing and rendered
/// after the fact against the original source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    pub col: u32,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: u32, col: u32) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            line,
            col,
        }
    }

    pub fn fatal(message: impl Into<String>, line: u32, col: u32) -> Self {
        Diagnostic {
            severity: Severity::Fatal,
            message: message.into(),
            line,
            col,
        }
    }

    /// Renders this diagnostic per the external-interface format:
    /// `<file>:<line>:<col>: error: <message>\n<source-line>\n<caret-line>\n`
    /// with tabs in the offending line preserved verbatim in the caret line
    /// so caret alignment survives tab expansion by the terminal.
    pub fn render(&self, file: &str, source: &str) -> String {
        let source_line = source.lines().nth(self.line.saturating_sub(1) as usize).unwrap_or("");
        let caret_line = caret_line(source_line, self.col);
        format!(
            "{file}:{line}:{col}: {severity}: {message}\n{source_line}\n{caret_line}\n",
            file = file,
            line = self.line,
            col = self.col,
            severity = self.severity,
            message = self.message,
            source_line = source_line,
            caret_line = caret_line,
        )
    }
}

/// Builds a caret-indicator line: a tab for every tab in `source_line` up
/// to `col`, a space for every other preceding character, and a single `^`
/// at the target column.
fn caret_line(source_line: &str, col: u32) -> String {
    let target = col.saturating_sub(1) as usize;
    let mut line: String = source_line
        .chars()
        .take(target)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    line.push('^');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_matches_external_format() {
        let diag = Diagnostic::error("Use of undeclared identifier 'y'", 1, 21);
        let rendered = diag.render("a.c", "int main() { int x; x = y; return 0; }");
        assert!(rendered.starts_with("a.c:1:21: error: Use of undeclared identifier 'y'\n"));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].len(), 21);
        assert!(lines[2].ends_with('^'));
    }

    #[test]
    fn caret_preserves_tabs() {
        let line = "\tint x;";
        let caret = caret_line(line, 6);
        assert_eq!(caret, "\t    ^");
    }
}
