//! `pkgmeta` — parser for pkg-config style package metadata (`.pc`) files.
//!
//! A `.pc` file describes a library: its name and version, the compiler and
//! linker flags needed to use it, and the packages it requires or conflicts
//! with. This crate turns such a file into a [`Record`] that build tooling can
//! consume; resolving flags across packages is left to the caller.
//!
//! # Architecture
//!
//! - [`variables`] — ordered variable table, later definitions shadow earlier
//! - [`expand`] — recursive `${name}` interpolation with a depth guard
//! - [`dependency`] — state-machine tokenizer for `Requires` / `Conflicts`
//! - [`version`] — version comparators and RPM-style version comparison
//! - [`record`] — the parsed record and per-line diagnostics
//! - [`parser`] — line parser driving all of the above
//! - [`error`] — error types and result alias
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgmeta::parser::parse_file;
//!
//! let record = parse_file("/usr/lib/pkgconfig/zlib.pc").unwrap();
//! println!("{} {}", record.name.as_deref().unwrap_or("?"), record.version.as_deref().unwrap_or("?"));
//! for dep in &record.requires {
//!     println!("requires {dep}");
//! }
//! ```

pub mod dependency;
pub mod error;
pub mod expand;
pub mod parser;
pub mod record;
pub mod variables;
pub mod version;

pub use dependency::Dependency;
pub use error::{Error, Result};
pub use parser::{ParseOptions, Parser, parse_file, parse_str};
pub use record::Record;
pub use version::Comparator;

/// The version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default limit on nested `${...}` references.
///
/// Deep enough for any real `.pc` file; reaching it means a variable refers
/// back to itself.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 64;

/// Default cap, in bytes, on a single expanded value.
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 65_535;

/// Default cap, in bytes, on the variable values one expansion may read.
///
/// Bounds the work of references that multiply without producing output,
/// such as `b=${a}${a}` chains over an empty `a`.
pub const DEFAULT_MAX_EXPANSION_SCAN: usize = 1 << 20;

/// Default cap, in bytes, on a single input line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 65_535;
