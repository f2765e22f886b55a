use std::fmt;

use crate::error::{ComponentKind, FeedError};
use crate::meta::nscomponent::{Namespace, NamespaceSet};
use crate::meta::value::{Serializer, Value, serialize_default};

/// An XML attribute of an element, or the element's text content.
///
/// Attributes are declared once in an [`ElementSchema`](crate::meta::ElementSchema)
/// with the builder methods below. Every element instance gets its own copy.
/// A value given at declaration time is a default: it is serialized but does
/// not make the owning element assigned on its own.
///
/// # Examples
///
/// ```
/// use scrapy_rss::meta::{ElementAttribute, serialize_lowercase};
///
/// let permalink = ElementAttribute::new()
///     .with_value(true)
///     .serializer(serialize_lowercase);
/// assert!(permalink.assigned());
/// assert_eq!(permalink.serialize().as_deref(), Some("true"));
///
/// let content = ElementAttribute::new().required(true).content(true);
/// assert!(!content.assigned());
/// assert!(content.is_content());
/// ```
#[derive(Clone)]
pub struct ElementAttribute {
    value: Option<Value>,
    explicit: bool,
    required: bool,
    is_content: bool,
    serializer: Serializer,
    ns: Namespace,
}

impl Default for ElementAttribute {
    fn default() -> Self {
        ElementAttribute {
            value: None,
            explicit: false,
            required: false,
            is_content: false,
            serializer: serialize_default,
            ns: Namespace::default(),
        }
    }
}

impl fmt::Debug for ElementAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementAttribute")
            .field("value", &self.value)
            .field("required", &self.required)
            .field("is_content", &self.is_content)
            .field("ns", &self.ns)
            .finish()
    }
}

impl ElementAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default value for every instance.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Marks the attribute as the element's text content.
    pub fn content(mut self, is_content: bool) -> Self {
        self.is_content = is_content;
        self
    }

    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Puts the attribute into a namespace.
    ///
    /// # Errors
    ///
    /// [`FeedError::NoNamespaceUri`] for a prefix without URI.
    pub fn with_namespace(mut self, prefix: Option<&str>, uri: &str) -> Result<Self, FeedError> {
        self.ns = Namespace::new(prefix, Some(uri))?;
        Ok(self)
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_content(&self) -> bool {
        self.is_content
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub fn assigned(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the value was set on this instance rather than inherited from
    /// the declaration.
    pub(crate) fn explicitly_assigned(&self) -> bool {
        self.explicit && self.value.is_some()
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.explicit = true;
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.explicit = true;
    }

    /// Restores the declared default.
    pub(crate) fn reset_to(&mut self, template: &ElementAttribute) {
        self.value = template.value.clone();
        self.explicit = false;
    }

    pub(crate) fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.ns
    }

    /// Serialized value, `None` when unassigned.
    pub fn serialize(&self) -> Option<String> {
        self.value.as_ref().map(self.serializer)
    }

    /// # Errors
    ///
    /// [`FeedError::InvalidComponent`] when the attribute is required but unassigned.
    pub fn validate(&self, path: &[String]) -> Result<(), FeedError> {
        if self.required && !self.assigned() {
            return Err(FeedError::InvalidComponent {
                kind: ComponentKind::Attribute,
                path: path.to_vec(),
                message: "missing required attribute".to_string(),
            });
        }
        Ok(())
    }

    pub fn get_namespaces(&self, assigned_only: bool) -> NamespaceSet {
        if assigned_only && !self.assigned() {
            return NamespaceSet::new();
        }
        self.ns.get_namespaces()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_attribute_must_be_assigned() {
        let mut attr = ElementAttribute::new().required(true);
        let path = vec!["enclosure".to_string(), "url".to_string()];
        let err = attr.validate(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid attribute 'enclosure.url': missing required attribute"
        );

        attr.set_value(Value::from("http://example.com/1.mp3"));
        assert!(attr.validate(&path).is_ok());
    }

    #[test]
    fn declared_value_is_a_default() {
        let template = ElementAttribute::new().with_value(true);
        let mut attr = template.clone();
        assert!(attr.assigned());
        assert!(!attr.explicitly_assigned());

        attr.set_value(Value::from(false));
        assert!(attr.explicitly_assigned());

        attr.clear();
        assert!(!attr.assigned());

        attr.reset_to(&template);
        assert_eq!(attr.value(), Some(&Value::Bool(true)));
        assert!(!attr.explicitly_assigned());
    }

    #[test]
    fn unassigned_attribute_is_not_serialized() {
        let attr = ElementAttribute::new();
        assert_eq!(attr.serialize(), None);
        assert!(attr.validate(&[]).is_ok());
    }

    #[test]
    fn namespaces_follow_assignment() {
        let mut attr = ElementAttribute::new()
            .with_namespace(Some("prefix"), "id1")
            .unwrap();
        assert!(attr.get_namespaces(true).is_empty());
        assert_eq!(attr.get_namespaces(false).len(), 1);
        attr.set_value(Value::from(1));
        assert_eq!(attr.get_namespaces(true).len(), 1);
    }
}
