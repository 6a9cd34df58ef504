use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Source of variable values at evaluation time.
///
/// Names are case-sensitive. Returning `None` means the variable is unbound,
/// which evaluates to the empty string.
pub trait Environment {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl Environment for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

/// Owned name/value map, built fresh for each evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: FxHashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind `name`, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Environment for Variables {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Self::new();
        variables.extend(iter);
        variables
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// Environment backed by a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

/// Wrap a lookup closure as an [`Environment`].
pub fn from_fn<F>(lookup: F) -> FromFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    FromFn(lookup)
}

impl<F> Environment for FromFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        (self.0)(name).map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_lookup_is_case_sensitive() {
        let vars = Variables::new().with("HOME", "/home/u");
        assert_eq!(vars.lookup("HOME").as_deref(), Some("/home/u"));
        assert_eq!(vars.lookup("home"), None);
    }

    #[test]
    fn insert_replaces_previous_value() {
        let mut vars = Variables::new();
        assert_eq!(vars.insert("PWD", "/a"), None);
        assert_eq!(vars.insert("PWD", "/b"), Some("/a".to_string()));
        assert_eq!(vars.get("PWD"), Some("/b"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn collects_from_pairs() {
        let vars: Variables = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("B"), Some("2"));
    }

    #[test]
    fn std_maps_are_environments() {
        let mut hash = HashMap::new();
        hash.insert("X".to_string(), "1".to_string());
        assert_eq!(hash.lookup("X").as_deref(), Some("1"));

        let mut tree = BTreeMap::new();
        tree.insert("Y".to_string(), "2".to_string());
        assert_eq!(tree.lookup("Y").as_deref(), Some("2"));
        assert_eq!(tree.lookup("X"), None);
    }

    #[test]
    fn closure_environment() {
        let env = from_fn(|name| (name == "USER").then(|| "root".to_string()));
        assert_eq!(env.lookup("USER").as_deref(), Some("root"));
        assert_eq!(env.lookup("HOME"), None);
    }
}
