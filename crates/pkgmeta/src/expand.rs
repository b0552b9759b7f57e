//! `${name}` variable interpolation.
//!
//! Values in a `.pc` file may reference variables with `${name}`. A variable's
//! value may itself contain references, so expansion is recursive. Recursion
//! is bounded by an explicit depth counter: a self-referencing variable
//! (`x=${x}`, or a longer cycle) fails with
//! [`Error::RecursionLimitExceeded`] instead of exhausting the stack.
//!
//! Undefined variables expand to the empty string. An unterminated `${`
//! treats the rest of the input as the variable name.
//!
//! Output is written into a single buffer owned by the top-level call, so
//! nested expansions append in place and cannot clobber each other. The
//! buffer is capped at [`Expander::max_len`] bytes; anything past the cap is
//! dropped.
//!
//! The total work of one call is capped as well. Every variable value read
//! during expansion is charged against [`Expander::max_scan`] bytes, so
//! values that double at each level but expand to nothing still terminate
//! quickly. Running out of budget stops expansion the same way the output
//! cap does.

use log::{trace, warn};

use crate::error::{Error, Result};
use crate::variables::VariableTable;
use crate::{DEFAULT_MAX_EXPANSION_DEPTH, DEFAULT_MAX_EXPANSION_SCAN, DEFAULT_MAX_VALUE_LENGTH};

const MARKER: &str = "${";

/// Recursive `${name}` expander with depth, length and work limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expander {
    max_depth: usize,
    max_len: usize,
    max_scan: usize,
}

impl Default for Expander {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPANSION_DEPTH, DEFAULT_MAX_VALUE_LENGTH)
    }
}

impl Expander {
    pub fn new(max_depth: usize, max_len: usize) -> Self {
        Self {
            max_depth,
            max_len,
            max_scan: DEFAULT_MAX_EXPANSION_SCAN,
        }
    }

    /// Replace the per-call budget of variable value bytes read.
    pub fn with_max_scan(mut self, max_scan: usize) -> Self {
        self.max_scan = max_scan;
        self
    }

    /// Maximum nesting of variable references.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Maximum length of an expanded value, in bytes.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Maximum number of variable value bytes one call may read, counting
    /// every lookup at every depth.
    pub fn max_scan(&self) -> usize {
        self.max_scan
    }

    /// Expand every `${name}` in `text`, resolving names through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecursionLimitExceeded`] when references nest deeper
    /// than [`max_depth`](Self::max_depth).
    pub fn expand<'v, F>(&self, text: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(text.len().min(self.max_len));
        let mut budget = self.max_scan;
        self.expand_into(text, &lookup, 0, &mut budget, &mut out)?;
        Ok(out)
    }

    /// Expand `text` against the bindings in `table`.
    pub fn expand_table(&self, text: &str, table: &VariableTable) -> Result<String> {
        self.expand(text, |name| table.find(name))
    }

    /// Returns `Ok(false)` once the output cap or the scan budget has been
    /// reached.
    fn expand_into<'v, F>(
        &self,
        text: &str,
        lookup: &F,
        depth: usize,
        budget: &mut usize,
        out: &mut String,
    ) -> Result<bool>
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let mut rest = text;

        while let Some(pos) = rest.find(MARKER) {
            if !self.push_bounded(out, &rest[..pos]) {
                return Ok(false);
            }

            let after = &rest[pos + MARKER.len()..];
            let (name, remainder) = match after.find('}') {
                Some(end) => (&after[..end], &after[end + 1..]),
                None => (after, ""),
            };

            match lookup(name) {
                Some(value) => {
                    if depth >= self.max_depth {
                        return Err(Error::RecursionLimitExceeded {
                            variable: name.to_string(),
                            depth: self.max_depth,
                        });
                    }
                    // An empty value still costs one unit.
                    let cost = value.len().max(1);
                    if cost > *budget {
                        *budget = 0;
                        warn!(
                            "expansion read more than {} bytes of variable values, stopping",
                            self.max_scan
                        );
                        return Ok(false);
                    }
                    *budget -= cost;
                    if !self.expand_into(value, lookup, depth + 1, budget, out)? {
                        return Ok(false);
                    }
                }
                None => trace!("variable '{name}' is not defined, expanding to nothing"),
            }

            rest = remainder;
        }

        Ok(self.push_bounded(out, rest))
    }

    fn push_bounded(&self, out: &mut String, s: &str) -> bool {
        let room = self.max_len.saturating_sub(out.len());
        if s.len() <= room {
            out.push_str(s);
            return true;
        }

        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&s[..cut]);
        warn!(
            "expanded value exceeds {} bytes, dropping the remainder",
            self.max_len
        );
        false
    }
}

/// Expand `text` against `table` with the default limits.
pub fn expand(text: &str, table: &VariableTable) -> Result<String> {
    Expander::default().expand_table(text, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> VariableTable {
        pairs.iter().copied().collect()
    }

    #[test]
    fn text_without_marker_is_unchanged() {
        let vars = table(&[("prefix", "/usr")]);
        assert_eq!(expand("hello world", &vars).unwrap(), "hello world");
        assert_eq!(expand("", &vars).unwrap(), "");
        assert_eq!(expand("cost: $5 {x}", &vars).unwrap(), "cost: $5 {x}");
    }

    #[test]
    fn simple_reference() {
        let vars = table(&[("prefix", "/usr")]);
        assert_eq!(expand("${prefix}/lib", &vars).unwrap(), "/usr/lib");
    }

    #[test]
    fn multiple_references() {
        let vars = table(&[("prefix", "/usr"), ("suffix", "64")]);
        assert_eq!(
            expand("-L${prefix}/lib${suffix} -I${prefix}/include", &vars).unwrap(),
            "-L/usr/lib64 -I/usr/include"
        );
    }

    #[test]
    fn nested_references_resolve_transitively() {
        let vars = table(&[
            ("prefix", "/usr"),
            ("exec_prefix", "${prefix}"),
            ("libdir", "${exec_prefix}/lib"),
        ]);
        assert_eq!(
            expand("${libdir}/pkgconfig", &vars).unwrap(),
            "/usr/lib/pkgconfig"
        );
    }

    #[test]
    fn missing_variable_expands_to_nothing() {
        let vars = VariableTable::new();
        assert_eq!(expand("x${MISSING}y", &vars).unwrap(), "xy");
    }

    #[test]
    fn lookup_ignores_case() {
        let vars = table(&[("Prefix", "/usr")]);
        assert_eq!(expand("${PREFIX}", &vars).unwrap(), "/usr");
    }

    #[test]
    fn most_recent_definition_wins() {
        let vars = table(&[("prefix", "/usr"), ("prefix", "/opt")]);
        assert_eq!(expand("${prefix}", &vars).unwrap(), "/opt");
    }

    #[test]
    fn unterminated_marker_uses_rest_as_name() {
        let vars = table(&[("prefix", "/usr")]);
        assert_eq!(expand("a${prefix", &vars).unwrap(), "a/usr");
        assert_eq!(expand("a${nothing here", &vars).unwrap(), "a");
        assert_eq!(expand("${", &vars).unwrap(), "");
    }

    #[test]
    fn empty_name_is_undefined() {
        let vars = table(&[("prefix", "/usr")]);
        assert_eq!(expand("a${}b", &vars).unwrap(), "ab");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let vars = table(&[("x", "1")]);
        assert_eq!(expand("$x ${x} $", &vars).unwrap(), "$x 1 $");
    }

    #[test]
    fn self_reference_hits_recursion_limit() {
        let vars = table(&[("X", "${X}")]);
        let err = expand("${X}", &vars).unwrap_err();
        match err {
            Error::RecursionLimitExceeded { variable, depth } => {
                assert_eq!(variable, "X");
                assert_eq!(depth, DEFAULT_MAX_EXPANSION_DEPTH);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn indirect_cycle_hits_recursion_limit() {
        let vars = table(&[("a", "${b}"), ("b", "x${a}")]);
        assert!(matches!(
            expand("${a}", &vars),
            Err(Error::RecursionLimitExceeded { .. })
        ));
    }

    #[test]
    fn depth_limit_is_exact() {
        // v0 -> v1 -> v2 -> v3: three nested lookups below the top level.
        let vars = table(&[("v3", "end"), ("v2", "${v3}"), ("v1", "${v2}"), ("v0", "${v1}")]);
        assert_eq!(
            Expander::new(4, 1024).expand_table("${v0}", &vars).unwrap(),
            "end"
        );
        assert!(Expander::new(3, 1024).expand_table("${v0}", &vars).is_err());
    }

    #[test]
    fn output_is_truncated_at_max_len() {
        let vars = table(&[("x", "0123456789")]);
        let expander = Expander::new(8, 15);
        assert_eq!(
            expander.expand_table("ab${x}${x}", &vars).unwrap(),
            "ab0123456789012"
        );
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        let expander = Expander::new(8, 4);
        // "é" is two bytes; cutting at byte 4 would split the second one.
        assert_eq!(
            expander.expand_table("aéé", &VariableTable::new()).unwrap(),
            "aé"
        );
    }

    #[test]
    fn exponential_growth_is_capped() {
        let mut vars = table(&[("l0", "xxxxxxxxxx")]);
        for i in 1..=20 {
            let prev = format!("${{l{}}}", i - 1);
            vars.add(format!("l{i}"), format!("{prev}{prev}"));
        }
        let expander = Expander::new(64, 4096);
        let out = expander.expand_table("${l20}", &vars).unwrap();
        assert_eq!(out.len(), 4096);
    }

    fn doubling_table(levels: usize, leaf: &str) -> VariableTable {
        let mut vars = table(&[("l0", leaf)]);
        for i in 1..=levels {
            let prev = format!("${{l{}}}", i - 1);
            vars.add(format!("l{i}"), format!("{prev}{prev}"));
        }
        vars
    }

    #[test]
    fn empty_doubling_stops_at_scan_budget() {
        // 2^40 lookups if walked in full; the budget cuts it off early.
        let vars = doubling_table(40, "");
        assert_eq!(expand("a${l40}b", &vars).unwrap(), "a");
    }

    #[test]
    fn scan_budget_counts_every_lookup() {
        let vars = doubling_table(3, "");
        // Each of l1..l3 is 10 bytes: one l3, two l2 and four l1 reads make
        // 70, plus one unit for each of the eight empty l0 reads.
        let exact = Expander::default().with_max_scan(78);
        assert_eq!(exact.expand_table("${l3}!", &vars).unwrap(), "!");
        let short = Expander::default().with_max_scan(77);
        assert_eq!(short.expand_table("${l3}!", &vars).unwrap(), "");
    }

    #[test]
    fn scan_budget_does_not_mask_recursion_errors() {
        let vars = table(&[("X", "${X}")]);
        assert!(matches!(
            Expander::default().with_max_scan(1 << 20).expand_table("${X}", &vars),
            Err(Error::RecursionLimitExceeded { .. })
        ));
    }

    #[test]
    fn custom_lookup_closure() {
        let defined = "/pending";
        let vars = table(&[("prefix", "/usr")]);
        let out = Expander::default()
            .expand("${self}:${prefix}", |name| {
                if name == "self" {
                    Some(defined)
                } else {
                    vars.find(name)
                }
            })
            .unwrap();
        assert_eq!(out, "/pending:/usr");
    }
}
