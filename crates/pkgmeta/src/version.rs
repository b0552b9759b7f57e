//! Version constraints and RPM-style version comparison.
//!
//! Dependency entries such as `glib-2.0 >= 2.50` carry a [`Comparator`] and a
//! version string. Versions are compared the way pkg-config does it, using the
//! `rpmvercmp` rules:
//!
//! - Versions are split into runs of digits and runs of letters; any other
//!   character only separates runs.
//! - Digit runs compare numerically (leading zeros ignored), letter runs
//!   compare bytewise.
//! - A digit run is newer than a letter run in the same position.
//! - With all shared runs equal, the version with more runs is newer.
//! - `~` sorts before everything, including the end of the string, so
//!   `1.0~rc1` is older than `1.0`.

use std::cmp::Ordering;
use std::fmt;

/// Relational operator constraining an acceptable version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// No constraint; any version is acceptable.
    #[default]
    None,
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparator {
    /// Map an operator run from a dependency list to a comparator.
    ///
    /// Only `=`, `<`, `<=`, `>` and `>=` are defined. Anything else,
    /// including runs built from `!`, yields `None`.
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Eq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// The operator as written in a `.pc` file; empty for [`Comparator::None`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `actual <op> required` holds.
    pub fn eval(self, actual: &str, required: &str) -> bool {
        let ord = compare(actual, required);
        match self {
            Self::None => true,
            Self::Eq => ord == Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two version strings with `rpmvercmp` semantics.
///
/// ```
/// use std::cmp::Ordering;
/// use pkgmeta::version::compare;
///
/// assert_eq!(compare("1.2.10", "1.2.9"), Ordering::Greater);
/// assert_eq!(compare("1.01", "1.1"), Ordering::Equal);
/// assert_eq!(compare("1.0~rc1", "1.0"), Ordering::Less);
/// ```
pub fn compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    loop {
        a = skip_separators(a);
        b = skip_separators(b);

        match (a.first() == Some(&b'~'), b.first() == Some(&b'~')) {
            (true, true) => {
                a = &a[1..];
                b = &b[1..];
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let (Some(&first), false) = (a.first(), b.is_empty()) else {
            return match (a.is_empty(), b.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                _ => Ordering::Greater,
            };
        };

        let numeric = first.is_ascii_digit();
        let (seg_a, rest_a) = split_segment(a, numeric);
        let (seg_b, rest_b) = split_segment(b, numeric);

        // `b` starts with the other kind of run.
        if seg_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let seg_a = trim_zeros(seg_a);
            let seg_b = trim_zeros(seg_b);
            seg_a.len().cmp(&seg_b.len()).then_with(|| seg_a.cmp(seg_b))
        } else {
            seg_a.cmp(seg_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }
}

fn skip_separators(s: &[u8]) -> &[u8] {
    let n = s
        .iter()
        .take_while(|c| !c.is_ascii_alphanumeric() && **c != b'~')
        .count();
    &s[n..]
}

fn split_segment(s: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let n = s
        .iter()
        .take_while(|c| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        })
        .count();
    s.split_at(n)
}

fn trim_zeros(s: &[u8]) -> &[u8] {
    let n = s.iter().take_while(|c| **c == b'0').count();
    &s[n..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_mapping() {
        assert_eq!(Comparator::from_operator("="), Some(Comparator::Eq));
        assert_eq!(Comparator::from_operator("<"), Some(Comparator::Lt));
        assert_eq!(Comparator::from_operator("<="), Some(Comparator::Le));
        assert_eq!(Comparator::from_operator(">"), Some(Comparator::Gt));
        assert_eq!(Comparator::from_operator(">="), Some(Comparator::Ge));

        for op in ["!", "!=", "==", "=<", "=>", "<>", "<<", ""] {
            assert_eq!(Comparator::from_operator(op), None, "operator {op:?}");
        }
    }

    #[test]
    fn display_round_trips_operator() {
        for cmp in [
            Comparator::Eq,
            Comparator::Lt,
            Comparator::Le,
            Comparator::Gt,
            Comparator::Ge,
        ] {
            assert_eq!(Comparator::from_operator(&cmp.to_string()), Some(cmp));
        }
        assert_eq!(Comparator::None.to_string(), "");
        assert_eq!(Comparator::default(), Comparator::None);
    }

    #[test]
    fn equal_versions() {
        assert_eq!(compare("1.0", "1.0"), Ordering::Equal);
        assert_eq!(compare("0", "0"), Ordering::Equal);
        assert_eq!(compare("001", "1"), Ordering::Equal);
        assert_eq!(compare("1.0", "1_0"), Ordering::Equal);
    }

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(compare("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare("1.9", "1.10"), Ordering::Less);
        assert_eq!(compare("2.0", "10.0"), Ordering::Less);
    }

    #[test]
    fn more_runs_is_newer() {
        assert_eq!(compare("1.0.0", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn digits_beat_letters() {
        assert_eq!(compare("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(compare("1.0.1", "1.0a"), Ordering::Greater);
        assert_eq!(compare("1.a", "1.1"), Ordering::Less);
    }

    #[test]
    fn letter_runs_compare_bytewise() {
        assert_eq!(compare("1.0b", "1.0a"), Ordering::Greater);
        assert_eq!(compare("alpha", "beta"), Ordering::Less);
    }

    #[test]
    fn tilde_sorts_first() {
        assert_eq!(compare("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(compare("1.0", "1.0~rc1"), Ordering::Greater);
        assert_eq!(compare("1.0~rc1", "1.0~rc2"), Ordering::Less);
    }

    #[test]
    fn comparator_eval() {
        assert!(Comparator::None.eval("anything", "1.0"));
        assert!(Comparator::Eq.eval("1.2", "1.2"));
        assert!(!Comparator::Eq.eval("1.2", "1.3"));
        assert!(Comparator::Ge.eval("1.2.12", "1.2.11"));
        assert!(Comparator::Ge.eval("1.2.11", "1.2.11"));
        assert!(!Comparator::Gt.eval("1.2.11", "1.2.11"));
        assert!(Comparator::Lt.eval("1.9", "1.10"));
        assert!(Comparator::Le.eval("1.10", "1.10"));
        assert!(!Comparator::Le.eval("1.11", "1.10"));
    }
}
