//! Line-oriented parser turning `.pc` file contents into a [`Record`].
//!
//! Each line is one of:
//!
//! - **Field**: `Key: value`. `Name`, `Description`, `Version`, `CFLAGS` and
//!   `LIBS` are stored as expanded strings; `Requires` and `Conflicts` are
//!   expanded and then split into [`Dependency`](crate::dependency::Dependency)
//!   lists. Keys are matched case-insensitively. Other keys are kept raw in
//!   [`Record::unknown_fields`] and otherwise ignored.
//! - **Variable**: `key=value`. The value is expanded and added to the
//!   record's [`VariableTable`](crate::variables::VariableTable), shadowing
//!   any earlier definition.
//! - Blank lines and `#` comments.
//!
//! Anything else is skipped and noted in [`Record::diagnostics`]. Bad lines
//! never cost the rest of the file: only failing to read the input at all
//! is an error.
//!
//! # Example
//!
//! ```
//! use pkgmeta::parser::parse_str;
//!
//! let record = parse_str("zlib.pc", "\
//! prefix=/usr
//! libdir=${prefix}/lib
//!
//! Name: zlib
//! Version: 1.3
//! Libs: -L${libdir} -lz
//! ");
//! assert_eq!(record.libs.as_deref(), Some("-L/usr/lib -lz"));
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};

use crate::dependency::parse_dependency_list;
use crate::error::{Error, Result};
use crate::expand::Expander;
use crate::record::{Diagnostic, DiagnosticKind, Keyword, Record};
use crate::{
    DEFAULT_MAX_EXPANSION_DEPTH, DEFAULT_MAX_EXPANSION_SCAN, DEFAULT_MAX_LINE_LENGTH,
    DEFAULT_MAX_VALUE_LENGTH,
};

/// Tunables for a [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of `${...}` references before expansion fails.
    pub max_expansion_depth: usize,
    /// Maximum length of an expanded value in bytes; the rest is dropped.
    pub max_value_len: usize,
    /// Maximum bytes of variable values read while expanding one value.
    /// Expansion stops there, as it does at `max_value_len`.
    pub max_expansion_scan: usize,
    /// Maximum length of an input line in bytes; the rest is dropped.
    pub max_line_len: usize,
    /// Drop the last character of every line unconditionally instead of
    /// stripping only an actual `\n` / `\r\n`. An unterminated last line
    /// then loses its final character, as in the original tool.
    pub legacy_line_endings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            max_value_len: DEFAULT_MAX_VALUE_LENGTH,
            max_expansion_scan: DEFAULT_MAX_EXPANSION_SCAN,
            max_line_len: DEFAULT_MAX_LINE_LENGTH,
            legacy_line_endings: false,
        }
    }
}

/// Builder for [`Parser`].
#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    options: ParseOptions,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_expansion_depth(mut self, depth: usize) -> Self {
        self.options.max_expansion_depth = depth;
        self
    }

    pub fn max_value_len(mut self, len: usize) -> Self {
        self.options.max_value_len = len;
        self
    }

    pub fn max_expansion_scan(mut self, bytes: usize) -> Self {
        self.options.max_expansion_scan = bytes;
        self
    }

    pub fn max_line_len(mut self, len: usize) -> Self {
        self.options.max_line_len = len;
        self
    }

    pub fn legacy_line_endings(mut self, legacy: bool) -> Self {
        self.options.legacy_line_endings = legacy;
        self
    }

    pub fn build(self) -> Parser {
        Parser::new(self.options)
    }
}

/// Parses `.pc` files into [`Record`]s.
///
/// A parser holds only configuration, so one instance can be shared across
/// threads; every call builds its own record.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
    expander: Expander,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            expander: Expander::new(options.max_expansion_depth, options.max_value_len)
                .with_max_scan(options.max_expansion_scan),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read. This is
    /// the only failure; a file full of malformed lines still yields a
    /// (possibly empty) record.
    pub fn parse_file(&self, path: &Path) -> Result<Record> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        self.read_lines(&path.display().to_string(), BufReader::new(file))
            .map_err(|e| Error::io(path, e))
    }

    /// Parse `.pc` contents from a buffered reader. Invalid UTF-8 is replaced
    /// rather than rejected.
    pub fn parse_reader<R: BufRead>(&self, source_id: &str, reader: R) -> Result<Record> {
        self.read_lines(source_id, reader)
            .map_err(|e| Error::io(source_id, e))
    }

    /// Parse `.pc` contents already held in memory.
    pub fn parse_str(&self, source_id: &str, content: &str) -> Record {
        let mut record = Record::new(source_id);
        for (idx, line) in content.split_inclusive('\n').enumerate() {
            self.parse_line(&mut record, idx + 1, line);
        }
        self.finish(&record);
        record
    }

    fn read_lines<R: BufRead>(&self, source_id: &str, mut reader: R) -> std::io::Result<Record> {
        let mut record = Record::new(source_id);
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            let line = String::from_utf8_lossy(&buf);
            self.parse_line(&mut record, line_no, &line);
        }

        self.finish(&record);
        Ok(record)
    }

    fn finish(&self, record: &Record) {
        debug!(
            "parsed '{}': {} variables, {} requires, {} conflicts, {} diagnostics",
            record.source_id,
            record.variables.len(),
            record.requires.len(),
            record.conflicts.len(),
            record.diagnostics.len()
        );
    }

    /// Apply one raw input line, terminator included, to `record`.
    fn parse_line(&self, record: &mut Record, line_no: usize, raw: &str) {
        let mut line = self.strip_terminator(raw);
        if line.len() > self.options.max_line_len {
            warn!(
                "{}:{line_no}: line longer than {} bytes, truncating",
                record.source_id, self.options.max_line_len
            );
            line = truncate(line, self.options.max_line_len);
        }

        match Directive::parse(line) {
            Directive::Blank | Directive::Comment => {}
            Directive::Malformed => {
                debug!("{}:{line_no}: skipping malformed line", record.source_id);
                push_diagnostic(record, line_no, DiagnosticKind::MalformedLine);
            }
            Directive::UnknownOperator(op) => {
                debug!(
                    "{}:{line_no}: skipping line with unknown operator '{op}'",
                    record.source_id
                );
                push_diagnostic(record, line_no, DiagnosticKind::UnknownOperator(op));
            }
            Directive::Field { key, value } => self.apply_field(record, line_no, key, value),
            Directive::Variable { key, value } => {
                self.apply_variable(record, line_no, key, value)
            }
        }
    }

    fn apply_field(&self, record: &mut Record, line_no: usize, key: &str, value: &str) {
        let Some(keyword) = Keyword::from_key(key) else {
            debug!("{}:{line_no}: ignoring unknown field '{key}'", record.source_id);
            record
                .unknown_fields
                .push((key.to_string(), value.to_string()));
            push_diagnostic(record, line_no, DiagnosticKind::UnknownKey(key.to_string()));
            return;
        };

        match self.expander.expand_table(value, &record.variables) {
            Ok(expanded) if keyword.is_list() => {
                record.set_dependencies(keyword, parse_dependency_list(&expanded));
            }
            Ok(expanded) => record.set_field(keyword, expanded),
            Err(err) => expansion_failed(record, line_no, err),
        }
    }

    fn apply_variable(&self, record: &mut Record, line_no: usize, key: &str, value: &str) {
        // The binding being defined is visible to its own expansion, so a
        // self-reference is caught as a cycle rather than reading an older
        // definition.
        let expanded = self.expander.expand(value, |name| {
            if name.eq_ignore_ascii_case(key) {
                Some(value)
            } else {
                record.variables.find(name)
            }
        });

        match expanded {
            Ok(expanded) => record.variables.add(key, expanded),
            Err(err) => expansion_failed(record, line_no, err),
        }
    }

    fn strip_terminator<'a>(&self, line: &'a str) -> &'a str {
        if self.options.legacy_line_endings {
            return match line.char_indices().next_back() {
                Some((idx, _)) => &line[..idx],
                None => line,
            };
        }
        let line = line.strip_suffix('\n').unwrap_or(line);
        line.strip_suffix('\r').unwrap_or(line)
    }
}

fn push_diagnostic(record: &mut Record, line: usize, kind: DiagnosticKind) {
    record.diagnostics.push(Diagnostic { line, kind });
}

fn expansion_failed(record: &mut Record, line_no: usize, err: Error) {
    warn!("{}:{line_no}: {err}", record.source_id);
    if let Error::RecursionLimitExceeded { variable, depth } = err {
        push_diagnostic(
            record,
            line_no,
            DiagnosticKind::RecursionLimitExceeded { variable, depth },
        );
    }
}

fn truncate(line: &str, max: usize) -> &str {
    let mut cut = max.min(line.len());
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    &line[..cut]
}

/// C `isspace`, vertical tab included.
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// A single line, split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'a> {
    Blank,
    Comment,
    Field { key: &'a str, value: &'a str },
    Variable { key: &'a str, value: &'a str },
    /// Missing key, key not starting with a letter, or no operator.
    Malformed,
    UnknownOperator(char),
}

impl<'a> Directive<'a> {
    fn parse(line: &'a str) -> Self {
        let content = line.trim_start_matches(is_space);
        if content.is_empty() {
            return Self::Blank;
        }
        if content.starts_with('#') {
            return Self::Comment;
        }

        let key_len = line.find(|c| !is_key_char(c)).unwrap_or(line.len());
        let key = &line[..key_len];
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Self::Malformed;
        }

        let mut rest = line[key_len..].trim_start_matches(is_space).chars();
        let op = rest.next();
        let value = rest.as_str().trim_start_matches(is_space);

        match op {
            Some(':') => Self::Field { key, value },
            Some('=') => Self::Variable { key, value },
            Some(other) => Self::UnknownOperator(other),
            None => Self::Malformed,
        }
    }
}

/// Parse the file at `path` with default options.
///
/// Returns [`Error::Io`] when the file cannot be read, which callers can tell
/// apart from a successfully parsed but empty record.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Record> {
    Parser::default().parse_file(path.as_ref())
}

/// Parse in-memory `.pc` contents with default options.
pub fn parse_str(source_id: &str, content: &str) -> Record {
    Parser::default().parse_str(source_id, content)
}
