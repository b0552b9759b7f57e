//! Ordered variable table with override-by-shadowing semantics.
//!
//! Variable definitions (`prefix=/usr`) are appended in file order. A later
//! definition of the same name shadows the earlier ones for lookups, but the
//! earlier bindings are kept so the full definition history stays visible.
//! Names compare ASCII-case-insensitively.

/// A single `name=value` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// Variable bindings in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    entries: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. It takes priority over every earlier binding of the
    /// same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Variable {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Look up the most recent binding for `name`, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Iterate over all bindings in definition order, shadowed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter()
    }

    /// Distinct variable names in order of first definition.
    pub fn names(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for v in &self.entries {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(&v.name)) {
                seen.push(v.name.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for VariableTable {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.add(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<'a> IntoIterator for &'a VariableTable {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_on_empty_table() {
        let table = VariableTable::new();
        assert!(table.is_empty());
        assert_eq!(table.find("prefix"), None);
    }

    #[test]
    fn later_definition_shadows_earlier() {
        let mut table = VariableTable::new();
        table.add("prefix", "/usr");
        table.add("prefix", "/opt");

        assert_eq!(table.find("prefix"), Some("/opt"));
        // Shadowed binding is still there.
        assert_eq!(table.len(), 2);
        let values: Vec<_> = table.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["/usr", "/opt"]);
    }

    #[test]
    fn lookup_ignores_case() {
        let table: VariableTable = [("LibDir", "/usr/lib")].into_iter().collect();
        assert_eq!(table.find("libdir"), Some("/usr/lib"));
        assert_eq!(table.find("LIBDIR"), Some("/usr/lib"));
        assert!(table.contains("libDir"));
    }

    #[test]
    fn shadowing_is_case_insensitive() {
        let mut table = VariableTable::new();
        table.add("PREFIX", "/usr");
        table.add("prefix", "/opt");
        assert_eq!(table.find("Prefix"), Some("/opt"));
    }

    #[test]
    fn names_are_distinct_in_first_definition_order() {
        let table: VariableTable = [
            ("prefix", "/usr"),
            ("libdir", "${prefix}/lib"),
            ("PREFIX", "/opt"),
            ("includedir", "${prefix}/include"),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.names(), vec!["prefix", "libdir", "includedir"]);
    }

    #[test]
    fn unrelated_names_do_not_match() {
        let table: VariableTable = [("prefix", "/usr")].into_iter().collect();
        assert_eq!(table.find("prefi"), None);
        assert_eq!(table.find("prefixx"), None);
    }
}
