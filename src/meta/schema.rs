use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::FeedError;
use crate::meta::attribute::ElementAttribute;
use crate::meta::element::{Component, Element};
use crate::meta::nscomponent::NsComponentName;

/// Cross-component rule run by [`Element::validate`] before the structural
/// checks. Receives the element and its path.
pub type Validator = fn(&Element, &[String]) -> Result<(), FeedError>;

/// Names that collide with element accessors. Prefix them with underscores or
/// add trailing underscores instead.
const RESERVED_NAMES: &[&str] = &[
    "attrs",
    "children",
    "required_attrs",
    "required_children",
    "content_name",
    "required",
    "assigned",
    "base_element_cls",
    "settings",
    "elements",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name.trim_start_matches('_'))
}

/// Position of a component in its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Attribute(usize),
    Child(usize),
}

/// Declaration of an element class: its attributes, children, item fields and
/// validators, merged with those of its ancestors.
///
/// Schemas are immutable and shared behind [`Arc`]; instances are created with
/// [`ElementSchema::instance`].
///
/// # Examples
///
/// ```
/// use scrapy_rss::meta::{ElementAttribute, ElementSchema};
///
/// let enclosure = ElementSchema::builder("EnclosureElement")
///     .attribute("url", ElementAttribute::new().required(true))
///     .attribute("length", ElementAttribute::new().required(true))
///     .attribute("type", ElementAttribute::new().required(true))
///     .build()
///     .unwrap();
///
/// let mut element = enclosure.instance();
/// element.set("url", "http://example.com/1.mp3").unwrap();
/// assert!(element.assigned());
/// assert!(element.validate(&[]).is_err());
/// ```
pub struct ElementSchema {
    class_name: String,
    base: Option<Arc<ElementSchema>>,
    attr_names: Vec<NsComponentName>,
    attrs: Vec<ElementAttribute>,
    child_names: Vec<NsComponentName>,
    children: Vec<Component>,
    content: Option<usize>,
    fields: Vec<String>,
    validators: Vec<Validator>,
    rss_item: Option<Arc<ElementSchema>>,
}

impl fmt::Debug for ElementSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSchema")
            .field("class_name", &self.class_name)
            .field("attrs", &self.attr_names)
            .field("children", &self.child_names)
            .field("fields", &self.fields)
            .finish()
    }
}

impl ElementSchema {
    pub fn builder(class_name: &str) -> ElementBuilder {
        ElementBuilder::new(class_name)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn base(&self) -> Option<&Arc<ElementSchema>> {
        self.base.as_ref()
    }

    pub fn attr_names(&self) -> &[NsComponentName] {
        &self.attr_names
    }

    pub fn child_names(&self) -> &[NsComponentName] {
        &self.child_names
    }

    /// Public names of all attributes then all children.
    pub fn component_names(&self) -> Vec<String> {
        self.attr_names
            .iter()
            .chain(self.child_names.iter())
            .map(|name| name.pub_name().to_string())
            .collect()
    }

    pub fn content_name(&self) -> Option<&NsComponentName> {
        self.content.map(|idx| &self.attr_names[idx])
    }

    pub(crate) fn content_index(&self) -> Option<usize> {
        self.content
    }

    pub fn required_attrs(&self) -> Vec<&NsComponentName> {
        self.attr_names
            .iter()
            .zip(&self.attrs)
            .filter(|(_, attr)| attr.is_required())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn required_children(&self) -> Vec<&NsComponentName> {
        self.child_names
            .iter()
            .zip(&self.children)
            .filter(|(_, child)| child.is_required())
            .map(|(name, _)| name)
            .collect()
    }

    /// Item fields, declared on feed item schemas.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    pub(crate) fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub(crate) fn attr_templates(&self) -> &[ElementAttribute] {
        &self.attrs
    }

    pub(crate) fn child_templates(&self) -> &[Component] {
        &self.children
    }

    /// Schema of the RSS item attached to every feed item of this class.
    pub fn rss_item_schema(&self) -> Option<&Arc<ElementSchema>> {
        self.rss_item.as_ref()
    }

    pub(crate) fn locate(&self, name: &str) -> Option<Slot> {
        if let Some(idx) = self.attr_names.iter().position(|n| n.pub_name() == name) {
            return Some(Slot::Attribute(idx));
        }
        self.child_names
            .iter()
            .position(|n| n.pub_name() == name)
            .map(Slot::Child)
    }

    /// Whether `self` is `other` or extends it, directly or transitively.
    pub fn is_subclass_of(&self, other: &Arc<ElementSchema>) -> bool {
        if std::ptr::eq(self, Arc::as_ptr(other)) {
            return true;
        }
        let mut current = self.base.as_ref();
        while let Some(schema) = current {
            if Arc::ptr_eq(schema, other) {
                return true;
            }
            current = schema.base.as_ref();
        }
        false
    }

    /// New instance with every component copied from the declaration.
    pub fn instance(self: &Arc<Self>) -> Element {
        Element::new(self)
    }
}

/// Builder for [`ElementSchema`].
pub struct ElementBuilder {
    class_name: String,
    base: Option<Arc<ElementSchema>>,
    attrs: Vec<(String, ElementAttribute)>,
    children: Vec<(String, Component)>,
    fields: Vec<String>,
    validators: Vec<Validator>,
    rss_item: Option<Arc<ElementSchema>>,
}

impl ElementBuilder {
    pub fn new(class_name: &str) -> Self {
        ElementBuilder {
            class_name: class_name.to_string(),
            base: None,
            attrs: Vec::new(),
            children: Vec::new(),
            fields: Vec::new(),
            validators: Vec::new(),
            rss_item: None,
        }
    }

    /// Inherits every component, field and validator of `base`.
    pub fn extends(mut self, base: &Arc<ElementSchema>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    pub fn attribute(mut self, name: &str, attribute: ElementAttribute) -> Self {
        self.attrs.push((name.to_string(), attribute));
        self
    }

    pub fn child(mut self, name: &str, child: impl Into<Component>) -> Self {
        self.children.push((name.to_string(), child.into()));
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.to_string());
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Attaches an empty RSS item of class `schema` to every feed item created
    /// from this schema.
    pub fn rss_item(mut self, schema: &Arc<ElementSchema>) -> Self {
        self.rss_item = Some(Arc::clone(schema));
        self
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidComponentName`] for a reserved component name
    /// - [`FeedError::NoNamespaceUri`] for a `prefix__name` component without URI
    /// - [`FeedError::NamespacedContent`] for a namespaced content attribute
    /// - [`FeedError::MultipleContent`] when more than one attribute is content
    pub fn build(self) -> Result<Arc<ElementSchema>, FeedError> {
        let (mut attr_names, mut attrs, mut child_names, mut children, mut fields, mut validators) =
            match &self.base {
                Some(base) => (
                    base.attr_names.clone(),
                    base.attrs.clone(),
                    base.child_names.clone(),
                    base.children.clone(),
                    base.fields.clone(),
                    base.validators.clone(),
                ),
                None => Default::default(),
            };
        let rss_item = self
            .rss_item
            .or_else(|| self.base.as_ref().and_then(|b| b.rss_item.clone()));

        for (name, mut attr) in self.attrs {
            if is_reserved(&name) {
                return Err(FeedError::InvalidComponentName(name));
            }
            let component_name = declared_name(&name, attr.namespace().prefix(), attr.namespace().uri())?;
            if attr.is_content() && attr.namespace().is_set() {
                return Err(FeedError::NamespacedContent(name));
            }
            if !component_name.ns_prefix().is_empty() {
                attr.namespace_mut().set_prefix(component_name.ns_prefix())?;
            }
            remove_named(&mut child_names, &mut children, &name);
            upsert(&mut attr_names, &mut attrs, component_name, attr);
        }

        for (name, mut child) in self.children {
            if is_reserved(&name) {
                return Err(FeedError::InvalidComponentName(name));
            }
            let component_name = declared_name(&name, child.namespace().prefix(), child.namespace().uri())?;
            if !component_name.ns_prefix().is_empty() {
                child.namespace_mut().set_prefix(component_name.ns_prefix())?;
            }
            remove_named(&mut attr_names, &mut attrs, &name);
            upsert(&mut child_names, &mut children, component_name, child);
        }

        let content_attrs: Vec<usize> = attrs
            .iter()
            .enumerate()
            .filter(|(_, attr)| attr.is_content())
            .map(|(idx, _)| idx)
            .collect();
        if content_attrs.len() > 1 {
            return Err(FeedError::MultipleContent(self.class_name));
        }

        for field in self.fields {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        validators.extend(self.validators);

        debug!(
            "Built element schema {} with {} attributes and {} children",
            self.class_name,
            attrs.len(),
            children.len()
        );

        Ok(Arc::new(ElementSchema {
            class_name: self.class_name,
            base: self.base,
            attr_names,
            attrs,
            child_names,
            children,
            content: content_attrs.first().copied(),
            fields,
            validators,
            rss_item,
        }))
    }
}

fn declared_name(name: &str, prefix: &str, uri: &str) -> Result<NsComponentName, FeedError> {
    let prefix = (!prefix.is_empty()).then_some(prefix);
    let uri = (!uri.is_empty()).then_some(uri);
    NsComponentName::new(name, prefix, uri)
}

/// Replaces the component with the same public name in place, or appends it.
fn upsert<T>(names: &mut Vec<NsComponentName>, values: &mut Vec<T>, name: NsComponentName, value: T) {
    match names.iter().position(|n| n.pub_name() == name.pub_name()) {
        Some(idx) => {
            names[idx] = name;
            values[idx] = value;
        }
        None => {
            names.push(name);
            values.push(value);
        }
    }
}

fn remove_named<T>(names: &mut Vec<NsComponentName>, values: &mut Vec<T>, name: &str) {
    if let Some(idx) = names.iter().position(|n| n.pub_name() == name) {
        names.remove(idx);
        values.remove(idx);
    }
}
