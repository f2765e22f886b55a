//! Namespace bookkeeping for the streaming exporter.

use log::debug;

use crate::meta::{Namespace, NamespaceSet};

/// Namespaces in effect on one written element.
///
/// A scope holds the declarations made on the element itself plus everything
/// visible from its ancestors. Scopes are immutable: a child scope is built
/// from its parent, so nothing has to be undone when an element ends.
#[derive(Debug, Clone, Default)]
pub(crate) struct NamespaceScope {
    /// Namespaces declared on this element.
    declared: Vec<Namespace>,
    /// Namespaces known on this element, outermost first.
    visible: Vec<Namespace>,
}

impl NamespaceScope {
    pub(crate) fn root(declared: Vec<Namespace>) -> Self {
        Self {
            visible: declared.clone(),
            declared,
        }
    }

    pub(crate) fn child(&self, declared: Vec<Namespace>) -> Self {
        let visible = self.visible.iter().chain(declared.iter()).cloned().collect();
        Self { declared, visible }
    }

    pub(crate) fn declared(&self) -> &[Namespace] {
        &self.declared
    }

    /// URI bound to `prefix`. The innermost declaration wins.
    pub(crate) fn uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.visible
            .iter()
            .rev()
            .find(|ns| ns.prefix() == prefix)
            .map(Namespace::uri)
    }

    /// Whether `ns` is the namespace currently bound to its prefix.
    pub(crate) fn is_open(&self, ns: &Namespace) -> bool {
        self.uri_for_prefix(ns.prefix()) == Some(ns.uri())
    }

    /// Non-empty prefix still bound to `uri`. Attributes cannot use the
    /// default namespace.
    fn attribute_prefix_for(&self, uri: &str) -> Option<&str> {
        self.visible
            .iter()
            .rev()
            .filter(|ns| ns.uri() == uri && !ns.prefix().is_empty())
            .map(Namespace::prefix)
            .find(|prefix| self.uri_for_prefix(prefix) == Some(uri))
    }
}

#[derive(Debug)]
struct Binding {
    ns: Namespace,
    /// False when the binding is inherited and only pinned for this element.
    declare: bool,
}

/// Namespace declarations of one start tag.
///
/// Bindings are collected in order: the element name first, then its
/// attributes, then namespaces hoisted from descendants. A prefix taken by
/// an earlier binding is never rebound within the same tag.
#[derive(Debug)]
pub(crate) struct DeclarationPlan<'s> {
    scope: &'s NamespaceScope,
    bindings: Vec<Binding>,
}

impl<'s> DeclarationPlan<'s> {
    pub(crate) fn new(scope: &'s NamespaceScope) -> Self {
        Self {
            scope,
            bindings: Vec::new(),
        }
    }

    fn bound(&self, prefix: &str) -> Option<&str> {
        match self.bindings.iter().find(|b| b.ns.prefix() == prefix) {
            Some(binding) => Some(binding.ns.uri()),
            None => self.scope.uri_for_prefix(prefix),
        }
    }

    /// Binds the namespace under its own prefix. Returns false if the prefix
    /// is already taken by another namespace in this tag.
    fn bind(&mut self, ns: &Namespace) -> bool {
        if let Some(binding) = self.bindings.iter().find(|b| b.ns.prefix() == ns.prefix()) {
            return binding.ns.uri() == ns.uri();
        }
        let declare = !self.scope.is_open(ns);
        self.bindings.push(Binding {
            ns: ns.clone(),
            declare,
        });
        true
    }

    /// Qualified element name. The element's namespace always binds since it
    /// comes first; an un-namespaced element inside a default namespace
    /// resets it with `xmlns=""`.
    pub(crate) fn element_name(&mut self, ns: &Namespace, local_name: &str) -> String {
        if !ns.is_set() {
            if self.bound("").is_some_and(|uri| !uri.is_empty()) {
                self.bind(&Namespace::default());
            }
            return local_name.to_string();
        }
        if self.bind(ns) {
            return qualified(ns.prefix(), local_name);
        }
        let prefix = self.generate_prefix(ns.uri());
        qualified(&prefix, local_name)
    }

    /// Qualified attribute name. Attributes without prefix or whose prefix is
    /// taken get an existing prefix of the namespace or a generated `nsN` one.
    pub(crate) fn attribute_name(&mut self, ns: &Namespace, local_name: &str) -> String {
        if !ns.is_set() {
            return local_name.to_string();
        }
        if !ns.prefix().is_empty() && self.bind(ns) {
            return qualified(ns.prefix(), local_name);
        }
        if let Some(prefix) = self.existing_attribute_prefix(ns.uri()) {
            return qualified(&prefix, local_name);
        }
        let prefix = self.generate_prefix(ns.uri());
        qualified(&prefix, local_name)
    }

    /// Declares namespaces used further down the tree so descendants do not
    /// repeat them. Default namespaces and prefixes that are ambiguous or
    /// already taken in this tag are left to the descendants.
    pub(crate) fn hoist(&mut self, candidates: &NamespaceSet) {
        for ns in candidates {
            if ns.prefix().is_empty() || !ns.is_set() {
                continue;
            }
            if self.bound(ns.prefix()) == Some(ns.uri()) {
                continue;
            }
            if self.bindings.iter().any(|b| b.ns.prefix() == ns.prefix()) {
                continue;
            }
            let ambiguous = candidates
                .iter()
                .any(|other| other.prefix() == ns.prefix() && other.uri() != ns.uri());
            if ambiguous {
                debug!(
                    "Prefix {} is used with several namespaces below, not hoisting {}",
                    ns.prefix(),
                    ns.uri()
                );
                continue;
            }
            self.bind(ns);
        }
    }

    /// Namespaces to declare on the tag, in binding order.
    pub(crate) fn into_declarations(self) -> Vec<Namespace> {
        self.bindings
            .into_iter()
            .filter(|b| b.declare)
            .map(|b| b.ns)
            .collect()
    }

    fn existing_attribute_prefix(&self, uri: &str) -> Option<String> {
        if let Some(binding) = self
            .bindings
            .iter()
            .find(|b| b.ns.uri() == uri && !b.ns.prefix().is_empty())
        {
            return Some(binding.ns.prefix().to_string());
        }
        self.scope
            .attribute_prefix_for(uri)
            .filter(|prefix| self.bound(prefix) == Some(uri))
            .map(str::to_string)
    }

    fn generate_prefix(&mut self, uri: &str) -> String {
        let prefix = (0..)
            .map(|idx| format!("ns{}", idx))
            .find(|prefix| self.bound(prefix).is_none())
            .unwrap_or_default();
        self.bindings.push(Binding {
            ns: Namespace::new(Some(&prefix), Some(uri)).unwrap_or_default(),
            declare: true,
        });
        prefix
    }
}

fn qualified(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}
