//! The parsed representation of one `.pc` file.

use std::fmt;

use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::variables::VariableTable;

/// Field keywords with a meaning to the parser. Matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Name,
    Description,
    Version,
    Cflags,
    Libs,
    Requires,
    Conflicts,
}

impl Keyword {
    pub const ALL: [Keyword; 7] = [
        Self::Name,
        Self::Description,
        Self::Version,
        Self::Cflags,
        Self::Libs,
        Self::Requires,
        Self::Conflicts,
    ];

    /// Recognize a field key, ignoring ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kw| kw.as_str().eq_ignore_ascii_case(key))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Version => "Version",
            Self::Cflags => "CFLAGS",
            Self::Libs => "LIBS",
            Self::Requires => "Requires",
            Self::Conflicts => "Conflicts",
        }
    }

    /// Whether the field holds a dependency list rather than a plain string.
    pub fn is_list(self) -> bool {
        matches!(self, Self::Requires | Self::Conflicts)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition hit on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// No usable key, or no operator after the key. The line was skipped.
    MalformedLine,
    /// The key was followed by something other than `:` or `=`.
    /// The line was skipped.
    UnknownOperator(char),
    /// A `Key:` line with a key the parser does not interpret.
    UnknownKey(String),
    /// Variable expansion recursed too deeply. The line had no effect.
    RecursionLimitExceeded { variable: String, depth: usize },
}

impl DiagnosticKind {
    /// Whether this condition is an error surfaced through
    /// [`Record::check`], as opposed to tolerated input.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::RecursionLimitExceeded { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            DiagnosticKind::MalformedLine => f.write_str("malformed line"),
            DiagnosticKind::UnknownOperator(op) => write!(f, "unknown operator '{op}'"),
            DiagnosticKind::UnknownKey(key) => write!(f, "unknown field '{key}'"),
            DiagnosticKind::RecursionLimitExceeded { variable, depth } => write!(
                f,
                "expansion of '{variable}' exceeded the maximum depth of {depth}"
            ),
        }
    }
}

/// Structured contents of a package metadata file.
///
/// Built line by line by the [`Parser`](crate::parser::Parser). Scalar fields
/// hold expanded values; a later line for the same field overwrites the
/// earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Identifier of the input this record was parsed from (usually a path).
    pub source_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub cflags: Option<String>,
    pub libs: Option<String>,
    pub requires: Vec<Dependency>,
    pub conflicts: Vec<Dependency>,
    pub variables: VariableTable,
    /// `Key: value` lines with unrecognized keys, raw, in file order.
    pub unknown_fields: Vec<(String, String)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Record {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// The expanded value of a scalar field, or `None` for unset and list
    /// fields.
    pub fn field(&self, keyword: Keyword) -> Option<&str> {
        let value = match keyword {
            Keyword::Name => &self.name,
            Keyword::Description => &self.description,
            Keyword::Version => &self.version,
            Keyword::Cflags => &self.cflags,
            Keyword::Libs => &self.libs,
            Keyword::Requires | Keyword::Conflicts => return None,
        };
        value.as_deref()
    }

    pub(crate) fn set_field(&mut self, keyword: Keyword, value: String) {
        let slot = match keyword {
            Keyword::Name => &mut self.name,
            Keyword::Description => &mut self.description,
            Keyword::Version => &mut self.version,
            Keyword::Cflags => &mut self.cflags,
            Keyword::Libs => &mut self.libs,
            Keyword::Requires | Keyword::Conflicts => return,
        };
        *slot = Some(value);
    }

    /// The dependency list of a list field, or `None` for scalar fields.
    pub fn dependencies(&self, keyword: Keyword) -> Option<&[Dependency]> {
        match keyword {
            Keyword::Requires => Some(&self.requires),
            Keyword::Conflicts => Some(&self.conflicts),
            _ => None,
        }
    }

    pub(crate) fn set_dependencies(&mut self, keyword: Keyword, deps: Vec<Dependency>) {
        match keyword {
            Keyword::Requires => self.requires = deps,
            Keyword::Conflicts => self.conflicts = deps,
            _ => {}
        }
    }

    /// The value of a variable (most recent definition), as stored.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.find(name)
    }

    /// Raw value of the last unrecognized field named `key`, ignoring case.
    pub fn unknown_field(&self, key: &str) -> Option<&str> {
        self.unknown_fields
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Diagnostics that represent errors rather than tolerated input.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Turn the first error diagnostic, if any, into an [`Error`].
    pub fn check(&self) -> Result<()> {
        match self.errors().next().map(|d| &d.kind) {
            Some(DiagnosticKind::RecursionLimitExceeded { variable, depth }) => {
                Err(Error::RecursionLimitExceeded {
                    variable: variable.clone(),
                    depth: *depth,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether no field, dependency or variable was set.
    pub fn is_empty(&self) -> bool {
        Keyword::ALL.iter().all(|kw| self.field(*kw).is_none())
            && self.requires.is_empty()
            && self.conflicts.is_empty()
            && self.variables.is_empty()
    }
}
