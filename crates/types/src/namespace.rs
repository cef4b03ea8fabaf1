use std::fmt;

/// Hierarchical address used to scope provider lookups, e.g. `source.github`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Namespace(Vec<String>);

impl Namespace {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty namespace; lookups address bare field names.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a namespace extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Namespaces from this one up to the root, most specific first.
    ///
    /// `source.github` yields `source.github`, `source`, and the root namespace.
    pub fn ancestors(&self) -> impl Iterator<Item = Namespace> + '_ {
        (0..=self.0.len()).rev().map(move |length| Namespace(self.0[..length].to_vec()))
    }

    /// Dotted path of `field` inside this namespace, e.g. `source.github.api_key`.
    pub fn path_of(&self, field: &str) -> String {
        if self.0.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.0.join("."), field)
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for Namespace {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
