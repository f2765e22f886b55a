use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::FeedError;

/// Set of `(prefix, uri)` pairs collected from a component tree.
pub type NamespaceSet = BTreeSet<Namespace>;

/// Namespace of an element, an attribute or a component name.
///
/// Both parts are empty when the component is not namespaced. A prefix is only
/// meaningful together with a URI, so a prefix without URI is rejected.
/// Each part can be back-filled once, from empty to non-empty, and is never
/// overwritten afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace {
    prefix: String,
    uri: String,
}

impl Namespace {
    /// Creates a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NoNamespaceUri`] when a non-empty prefix comes without URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrapy_rss::meta::Namespace;
    ///
    /// let ns = Namespace::new(Some("dc"), Some("http://purl.org/dc/elements/1.1/")).unwrap();
    /// assert_eq!(ns.prefix(), "dc");
    ///
    /// assert!(Namespace::new(Some("dc"), None).is_err());
    /// ```
    pub fn new(prefix: Option<&str>, uri: Option<&str>) -> Result<Self, FeedError> {
        let prefix = prefix.unwrap_or_default();
        let uri = uri.unwrap_or_default();
        if !prefix.is_empty() && uri.is_empty() {
            return Err(FeedError::NoNamespaceUri(prefix.to_string()));
        }
        Ok(Namespace {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether a namespace URI is set.
    pub fn is_set(&self) -> bool {
        !self.uri.is_empty()
    }

    /// Back-fills the prefix.
    ///
    /// Setting the current prefix again is a no-op.
    ///
    /// # Errors
    ///
    /// [`FeedError::NoNamespaceUri`] if there is no URI yet,
    /// [`FeedError::NamespaceAlreadySet`] if another prefix is already set.
    pub fn set_prefix(&mut self, prefix: &str) -> Result<(), FeedError> {
        if self.prefix == prefix {
            return Ok(());
        }
        if self.uri.is_empty() {
            return Err(FeedError::NoNamespaceUri(prefix.to_string()));
        }
        if !self.prefix.is_empty() {
            return Err(FeedError::NamespaceAlreadySet("prefix"));
        }
        self.prefix = prefix.to_string();
        Ok(())
    }

    /// Back-fills the URI.
    ///
    /// # Errors
    ///
    /// [`FeedError::NamespaceAlreadySet`] if another URI is already set.
    pub fn set_uri(&mut self, uri: &str) -> Result<(), FeedError> {
        if self.uri == uri {
            return Ok(());
        }
        if !self.uri.is_empty() {
            return Err(FeedError::NamespaceAlreadySet("URI"));
        }
        self.uri = uri.to_string();
        Ok(())
    }

    /// Namespaces of this component alone: the pair itself when a URI is set.
    pub fn get_namespaces(&self) -> NamespaceSet {
        let mut namespaces = NamespaceSet::new();
        if self.is_set() {
            namespaces.insert(self.clone());
        }
        namespaces
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "xmlns=\"{}\"", self.uri)
        } else {
            write!(f, "xmlns:{}=\"{}\"", self.prefix, self.uri)
        }
    }
}

/// Name of an attribute or a child element.
///
/// A name of the form `prefix__name` declares the namespace prefix `prefix`
/// unless an explicit prefix is given. Trailing underscores are kept in the
/// public name and stripped from the XML name, so `required_` can be used where
/// `required` is reserved.
///
/// Names are equal when their namespace URIs and local names are equal; the
/// prefix is metadata.
#[derive(Debug, Clone)]
pub struct NsComponentName {
    name: String,
    ns: Namespace,
    pub_name: String,
    priv_name: String,
}

impl NsComponentName {
    /// # Errors
    ///
    /// [`FeedError::NoNamespaceUri`] when a prefix (explicit or from the `prefix__name`
    /// form) is set without URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrapy_rss::meta::NsComponentName;
    ///
    /// let name = NsComponentName::new("media__content", None, Some("http://search.yahoo.com/mrss/")).unwrap();
    /// assert_eq!(name.name(), "content");
    /// assert_eq!(name.ns_prefix(), "media");
    /// assert_eq!(name.pub_name(), "media__content");
    /// assert_eq!(name.priv_name(), "__media__content");
    /// ```
    pub fn new(
        name: &str,
        ns_prefix: Option<&str>,
        ns_uri: Option<&str>,
    ) -> Result<Self, FeedError> {
        let (secondary_prefix, local_name) = split_compound_name(name);
        let prefix = ns_prefix.filter(|p| !p.is_empty()).or(secondary_prefix);
        let ns = Namespace::new(prefix, ns_uri)?;
        Ok(NsComponentName {
            name: local_name.to_string(),
            ns,
            pub_name: name.to_string(),
            priv_name: format!("__{}", name),
        })
    }

    /// Local name without namespace information.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub fn ns_prefix(&self) -> &str {
        self.ns.prefix()
    }

    pub fn ns_uri(&self) -> &str {
        self.ns.uri()
    }

    /// Local name as written to XML: trailing underscores are stripped.
    pub fn local_name(&self) -> &str {
        let trimmed = self.name.trim_end_matches('_');
        if trimmed.is_empty() { &self.name } else { trimmed }
    }

    /// `(namespace_uri, local_name)` pair for namespaced XML output.
    pub fn xml_name(&self) -> (&str, &str) {
        (self.ns.uri(), self.local_name())
    }

    /// Public name, `prefix__name` or `name`.
    pub fn pub_name(&self) -> &str {
        &self.pub_name
    }

    /// Storage name, `__prefix__name` or `__name`.
    pub fn priv_name(&self) -> &str {
        &self.priv_name
    }
}

/// Splits `prefix__name` into its parts. Double underscores that are part of
/// a trailing underscore run do not separate a prefix.
fn split_compound_name(name: &str) -> (Option<&str>, &str) {
    let significant = name.trim_end_matches('_');
    match significant.find("__") {
        Some(idx) if idx > 0 => (Some(&name[..idx]), &name[idx + 2..]),
        _ => (None, name),
    }
}

impl PartialEq for NsComponentName {
    fn eq(&self, other: &Self) -> bool {
        self.ns.uri() == other.ns.uri() && self.name == other.name
    }
}

impl Eq for NsComponentName {}

impl Hash for NsComponentName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns.uri().hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for NsComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pub_name)
    }
}
