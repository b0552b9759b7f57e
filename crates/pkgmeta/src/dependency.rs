//! Dependency list parsing for `Requires` and `Conflicts` fields.
//!
//! A dependency list is a sequence of `name [operator version]` items. Commas
//! and whitespace are interchangeable separators, so all of these are the
//! same two-item list:
//!
//! ```text
//! a b
//! a, b
//! a,b
//! ```
//!
//! This matters in practice because build systems substitute empty
//! placeholders, turning `@EXTRA_REQUIRES@, zlib` into `, zlib`.
//!
//! The grammar is irregular (an operator is only recognized when whitespace
//! separates it from the name, unknown operator runs are tolerated), so it is
//! scanned with an explicit state machine rather than a general grammar.

use std::fmt;

use log::{debug, trace};

use crate::version::Comparator;

/// One entry of a dependency list.
///
/// A version is present exactly when the comparator is not
/// [`Comparator::None`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    package: String,
    comparator: Comparator,
    version: Option<String>,
}

impl Dependency {
    /// An unconstrained dependency on `package`.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            comparator: Comparator::None,
            version: None,
        }
    }

    /// A dependency constrained by `comparator version`.
    ///
    /// With [`Comparator::None`] the version is discarded.
    pub fn with_constraint(
        package: impl Into<String>,
        comparator: Comparator,
        version: impl Into<String>,
    ) -> Self {
        let version = match comparator {
            Comparator::None => None,
            _ => Some(version.into()),
        };
        Self {
            package: package.into(),
            comparator,
            version,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Whether a package at `version` satisfies this dependency.
    pub fn is_satisfied_by(&self, version: &str) -> bool {
        match &self.version {
            Some(required) => self.comparator.eval(version, required),
            None => true,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {} {}", self.package, self.comparator, version),
            None => f.write_str(&self.package),
        }
    }
}

/// Split an (already expanded) dependency list into its entries, in order of
/// appearance.
///
/// ```
/// use pkgmeta::dependency::{parse_dependency_list, Dependency};
/// use pkgmeta::version::Comparator;
///
/// let deps = parse_dependency_list("zlib, foo >= 1.2, bar");
/// assert_eq!(deps, vec![
///     Dependency::new("zlib"),
///     Dependency::with_constraint("foo", Comparator::Ge, "1.2"),
///     Dependency::new("bar"),
/// ]);
/// ```
pub fn parse_dependency_list(text: &str) -> Vec<Dependency> {
    DependencyScanner::new(text).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between items, skipping separators.
    Outside,
    /// Inside a package name.
    Name,
    /// Name captured, whitespace before an operator.
    BeforeOp,
    /// Inside an operator run.
    InOp,
    /// Operator captured, whitespace before the version.
    AfterOp,
    /// Inside a version.
    InVersion,
}

fn is_space(c: u8) -> bool {
    // C `isspace`, which also counts vertical tab.
    c.is_ascii_whitespace() || c == 0x0b
}

fn is_separator(c: u8) -> bool {
    c == b',' || is_space(c)
}

fn is_operator(c: u8) -> bool {
    matches!(c, b'<' | b'>' | b'!' | b'=')
}

struct DependencyScanner<'a> {
    text: &'a str,
    state: ScanState,
    /// Start of the token currently being scanned.
    start: usize,
    package: &'a str,
    operator: &'a str,
    deps: Vec<Dependency>,
}

impl<'a> DependencyScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            state: ScanState::Outside,
            start: 0,
            package: "",
            operator: "",
            deps: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Dependency> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i];

            match self.state {
                ScanState::Outside => {
                    if !is_separator(c) {
                        self.start = i;
                        self.state = ScanState::Name;
                    }
                }
                ScanState::Name => {
                    if is_space(c) {
                        self.package = &text[self.start..i];
                        let next = bytes[i..].iter().copied().find(|b| !is_space(*b));
                        if next.is_some_and(is_operator) {
                            self.state = ScanState::BeforeOp;
                        } else {
                            self.emit();
                        }
                    } else if c == b',' {
                        self.package = &text[self.start..i];
                        self.emit();
                    }
                }
                ScanState::BeforeOp => {
                    if is_operator(c) {
                        self.start = i;
                        self.state = ScanState::InOp;
                    }
                }
                ScanState::InOp => {
                    if !is_operator(c) {
                        self.operator = &text[self.start..i];
                        self.state = ScanState::AfterOp;
                        // The first character after the operator may already
                        // be part of the version.
                        continue;
                    }
                }
                ScanState::AfterOp => {
                    if c == b',' {
                        self.emit();
                    } else if !is_space(c) {
                        self.start = i;
                        self.state = ScanState::InVersion;
                    }
                }
                ScanState::InVersion => {
                    if is_separator(c) {
                        self.emit_versioned(&text[self.start..i]);
                    }
                }
            }

            i += 1;
        }

        match self.state {
            ScanState::Outside => {}
            ScanState::Name => {
                self.package = &text[self.start..];
                self.emit();
            }
            ScanState::InVersion => self.emit_versioned(&text[self.start..]),
            ScanState::BeforeOp | ScanState::InOp | ScanState::AfterOp => {
                debug!(
                    "dependency '{}' has an operator but no version, ignoring the constraint",
                    self.package
                );
                self.emit();
            }
        }

        self.deps
    }

    /// Emit the pending package without a version constraint.
    fn emit(&mut self) {
        self.push(Dependency::new(self.package));
    }

    fn emit_versioned(&mut self, version: &str) {
        let dep = match Comparator::from_operator(self.operator) {
            Some(comparator) => Dependency::with_constraint(self.package, comparator, version),
            None => {
                debug!(
                    "unknown version operator '{}' for '{}', ignoring the constraint",
                    self.operator, self.package
                );
                Dependency::new(self.package)
            }
        };
        self.push(dep);
    }

    fn push(&mut self, dep: Dependency) {
        trace!("parsed dependency: {dep}");
        self.deps.push(dep);
        self.package = "";
        self.operator = "";
        self.state = ScanState::Outside;
    }
}
