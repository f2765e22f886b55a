use std::sync::Arc;

use crate::error::{ComponentKind, FeedError};
use crate::meta::attribute::ElementAttribute;
use crate::meta::multiple::MultipleElements;
use crate::meta::nscomponent::{Namespace, NamespaceSet, NsComponentName};
use crate::meta::schema::{ElementSchema, Slot};
use crate::meta::value::{Input, Value};

/// An instance of an element class.
///
/// Components are addressed by their public name (`"title"`,
/// `"media__content"`). Setting a component accepts anything convertible to
/// [`Input`] and dispatches on it:
///
/// - `None` clears the component
/// - a scalar sets an attribute, or the content (or single child) of a child element
/// - a mapping builds a new child element from named components
/// - a list fills repeated elements
/// - an element of the same class or a derived class replaces the child
///
/// # Examples
///
/// ```
/// use scrapy_rss::meta::Input;
/// use scrapy_rss::rss::RSS_ITEM;
///
/// let mut item = RSS_ITEM.instance();
/// item.set("title", "Title").unwrap();
/// item.set(
///     "guid",
///     Input::map([("isPermaLink", Input::from(false)), ("value", Input::from("Identifier"))]),
/// )
/// .unwrap();
/// item.set("category", vec!["first", "second"]).unwrap();
///
/// assert_eq!(item.child("title").unwrap().content().unwrap(), "Title");
/// assert_eq!(item.multiple("category").unwrap().len(), 2);
/// assert!(item.validate(&[]).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Element {
    schema: Arc<ElementSchema>,
    ns: Namespace,
    required: bool,
    attrs: Vec<ElementAttribute>,
    children: Vec<Component>,
    // set by the last successful assignment of a non-empty value
    explicit: bool,
}

/// Child slot of an element: a single element or a repeated one.
#[derive(Debug, Clone)]
pub enum Component {
    Element(Element),
    Multiple(MultipleElements),
}

/// Borrowed view of any component.
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    Attribute(&'a ElementAttribute),
    Element(&'a Element),
    Multiple(&'a MultipleElements),
}

impl ComponentRef<'_> {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRef::Attribute(_) => ComponentKind::Attribute,
            ComponentRef::Element(_) => ComponentKind::Element,
            ComponentRef::Multiple(_) => ComponentKind::MultipleElements,
        }
    }

    pub fn assigned(&self) -> bool {
        match self {
            ComponentRef::Attribute(attr) => attr.assigned(),
            ComponentRef::Element(element) => element.assigned(),
            ComponentRef::Multiple(multiple) => multiple.assigned(),
        }
    }
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Element(_) => ComponentKind::Element,
            Component::Multiple(_) => ComponentKind::MultipleElements,
        }
    }

    pub fn assigned(&self) -> bool {
        match self {
            Component::Element(element) => element.assigned(),
            Component::Multiple(multiple) => multiple.assigned(),
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Component::Element(element) => element.is_required(),
            Component::Multiple(multiple) => multiple.is_required(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        match self {
            Component::Element(element) => element.namespace(),
            Component::Multiple(multiple) => multiple.namespace(),
        }
    }

    pub(crate) fn namespace_mut(&mut self) -> &mut Namespace {
        match self {
            Component::Element(element) => &mut element.ns,
            Component::Multiple(multiple) => multiple.namespace_mut(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Component::Element(element) => element.clear(),
            Component::Multiple(multiple) => multiple.clear(),
        }
    }

    pub fn validate(&self, path: &[String]) -> Result<(), FeedError> {
        match self {
            Component::Element(element) => element.validate(path),
            Component::Multiple(multiple) => multiple.validate(path),
        }
    }

    pub fn get_namespaces(&self, assigned_only: bool) -> NamespaceSet {
        match self {
            Component::Element(element) => element.get_namespaces(assigned_only, false),
            Component::Multiple(multiple) => multiple.get_namespaces(assigned_only),
        }
    }
}

impl From<Element> for Component {
    fn from(element: Element) -> Self {
        Component::Element(element)
    }
}

impl From<MultipleElements> for Component {
    fn from(multiple: MultipleElements) -> Self {
        Component::Multiple(multiple)
    }
}

impl Element {
    /// Empty instance of `schema`.
    pub fn new(schema: &Arc<ElementSchema>) -> Self {
        Element {
            schema: Arc::clone(schema),
            ns: Namespace::default(),
            required: false,
            attrs: schema.attr_templates().to_vec(),
            children: schema.child_templates().to_vec(),
            explicit: false,
        }
    }

    /// Instance of `schema` initialized from `input`.
    ///
    /// A mapping sets named components. A scalar sets the content attribute,
    /// or the single child when the element has no attributes.
    ///
    /// # Errors
    ///
    /// [`FeedError::UnknownComponents`] for names the schema does not declare,
    /// [`FeedError::InvalidConstructorArgs`] for inputs that cannot initialize
    /// an element, and any setter error.
    pub fn from_input(schema: &Arc<ElementSchema>, input: impl Into<Input>) -> Result<Self, FeedError> {
        let mut element = Element::new(schema);
        element.apply(input.into())?;
        Ok(element)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// # Errors
    ///
    /// [`FeedError::NoNamespaceUri`] for a prefix without URI.
    pub fn with_namespace(mut self, prefix: Option<&str>, uri: &str) -> Result<Self, FeedError> {
        self.ns = Namespace::new(prefix, Some(uri))?;
        Ok(self)
    }

    pub fn schema(&self) -> &Arc<ElementSchema> {
        &self.schema
    }

    pub fn class_name(&self) -> &str {
        self.schema.class_name()
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

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether anything was set on this element or one of its descendants.
    /// Declared attribute defaults do not count; assigning an empty mapping
    /// to a child does.
    pub fn assigned(&self) -> bool {
        self.explicit
            || self.attrs.iter().any(ElementAttribute::explicitly_assigned)
            || self.children.iter().any(Component::assigned)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&NsComponentName, &ElementAttribute)> {
        self.schema.attr_names().iter().zip(self.attrs.iter())
    }

    pub fn children(&self) -> impl Iterator<Item = (&NsComponentName, &Component)> {
        self.schema.child_names().iter().zip(self.children.iter())
    }

    pub fn content_name(&self) -> Option<&NsComponentName> {
        self.schema.content_name()
    }

    /// Value of the content attribute.
    pub fn content(&self) -> Option<&Value> {
        self.schema
            .content_index()
            .and_then(|idx| self.attrs[idx].value())
    }

    pub fn serialize_content(&self) -> Option<String> {
        self.schema
            .content_index()
            .and_then(|idx| self.attrs[idx].serialize())
    }

    /// Assigned non-content attributes with their serialized values, in
    /// declaration order.
    pub fn serialize_attrs(&self) -> Vec<(&NsComponentName, String)> {
        self.attributes()
            .filter(|(_, attr)| !attr.is_content())
            .filter_map(|(name, attr)| attr.serialize().map(|value| (name, value)))
            .collect()
    }

    pub fn component(&self, name: &str) -> Result<ComponentRef<'_>, FeedError> {
        match self.schema.locate(name) {
            Some(Slot::Attribute(idx)) => Ok(ComponentRef::Attribute(&self.attrs[idx])),
            Some(Slot::Child(idx)) => Ok(match &self.children[idx] {
                Component::Element(element) => ComponentRef::Element(element),
                Component::Multiple(multiple) => ComponentRef::Multiple(multiple),
            }),
            None => Err(self.unknown_component(name)),
        }
    }

    pub fn attribute(&self, name: &str) -> Result<&ElementAttribute, FeedError> {
        match self.component(name)? {
            ComponentRef::Attribute(attr) => Ok(attr),
            other => Err(kind_mismatch(name, ComponentKind::Attribute, other.kind())),
        }
    }

    /// Value of an attribute.
    pub fn attr(&self, name: &str) -> Result<Option<&Value>, FeedError> {
        Ok(self.attribute(name)?.value())
    }

    pub fn child(&self, name: &str) -> Result<&Element, FeedError> {
        match self.component(name)? {
            ComponentRef::Element(element) => Ok(element),
            other => Err(kind_mismatch(name, ComponentKind::Element, other.kind())),
        }
    }

    pub fn child_mut(&mut self, name: &str) -> Result<&mut Element, FeedError> {
        match self.schema.locate(name) {
            Some(Slot::Child(idx)) => match &mut self.children[idx] {
                Component::Element(element) => Ok(element),
                Component::Multiple(_) => Err(kind_mismatch(
                    name,
                    ComponentKind::Element,
                    ComponentKind::MultipleElements,
                )),
            },
            Some(Slot::Attribute(_)) => Err(kind_mismatch(
                name,
                ComponentKind::Element,
                ComponentKind::Attribute,
            )),
            None => Err(self.unknown_component(name)),
        }
    }

    pub fn multiple(&self, name: &str) -> Result<&MultipleElements, FeedError> {
        match self.component(name)? {
            ComponentRef::Multiple(multiple) => Ok(multiple),
            other => Err(kind_mismatch(
                name,
                ComponentKind::MultipleElements,
                other.kind(),
            )),
        }
    }

    pub fn multiple_mut(&mut self, name: &str) -> Result<&mut MultipleElements, FeedError> {
        match self.schema.locate(name) {
            Some(Slot::Child(idx)) => match &mut self.children[idx] {
                Component::Multiple(multiple) => Ok(multiple),
                Component::Element(_) => Err(kind_mismatch(
                    name,
                    ComponentKind::MultipleElements,
                    ComponentKind::Element,
                )),
            },
            Some(Slot::Attribute(_)) => Err(kind_mismatch(
                name,
                ComponentKind::MultipleElements,
                ComponentKind::Attribute,
            )),
            None => Err(self.unknown_component(name)),
        }
    }

    /// Assigns a component.
    ///
    /// # Errors
    ///
    /// - [`FeedError::UnknownComponent`] if the schema has no such component
    /// - [`FeedError::InvalidAttributeValue`] for a non-scalar attribute value
    /// - [`FeedError::InvalidElementValue`] for a value a child element cannot take
    /// - [`FeedError::InvalidElementType`] for a repeated element of the wrong class
    pub fn set(&mut self, name: &str, value: impl Into<Input>) -> Result<(), FeedError> {
        let value = value.into();
        let explicit = !value.is_none();
        match self.schema.locate(name) {
            Some(Slot::Attribute(idx)) => self.set_attribute(idx, value)?,
            Some(Slot::Child(idx)) => self.set_child(idx, value)?,
            None => return Err(self.unknown_component(name)),
        }
        self.explicit = explicit;
        Ok(())
    }

    /// Clears every attribute and child. Declared attribute defaults are
    /// restored.
    pub fn clear(&mut self) {
        let schema = Arc::clone(&self.schema);
        for (attr, template) in self.attrs.iter_mut().zip(schema.attr_templates()) {
            attr.reset_to(template);
        }
        for child in &mut self.children {
            child.clear();
        }
        self.explicit = false;
    }

    /// Checks custom rules, then required attributes and children. An
    /// unassigned element that is not required is valid.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidComponent`] naming the path of the first invalid component.
    pub fn validate(&self, path: &[String]) -> Result<(), FeedError> {
        for validator in self.schema.validators().iter().rev() {
            validator(self, path)?;
        }
        if !self.assigned() {
            if self.required {
                return Err(FeedError::InvalidComponent {
                    kind: ComponentKind::Element,
                    path: path.to_vec(),
                    message: "missing required element".to_string(),
                });
            }
            return Ok(());
        }
        for (name, attr) in self.attributes() {
            attr.validate(&child_path(path, name.pub_name()))?;
        }
        for (name, child) in self.children() {
            child.validate(&child_path(path, name.pub_name()))?;
        }
        Ok(())
    }

    /// Namespaces used by this element, its attributes and, unless
    /// `attrs_only`, its descendants.
    pub fn get_namespaces(&self, assigned_only: bool, attrs_only: bool) -> NamespaceSet {
        let mut namespaces = self.ns.get_namespaces();
        for attr in &self.attrs {
            namespaces.extend(attr.get_namespaces(assigned_only));
        }
        if !attrs_only {
            for child in &self.children {
                if !assigned_only || child.assigned() {
                    namespaces.extend(child.get_namespaces(assigned_only));
                }
            }
        }
        namespaces
    }

    pub(crate) fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.ns
    }

    pub(crate) fn apply(&mut self, input: Input) -> Result<(), FeedError> {
        match input {
            Input::None => Ok(()),
            Input::Map(pairs) => self.apply_pairs(pairs),
            Input::Scalar(value) => self.apply_scalar(value),
            Input::Element(_) => Err(FeedError::InvalidConstructorArgs(
                "Initialization from another Element instance is not supported".to_string(),
            )),
            Input::List(_) => Err(FeedError::InvalidConstructorArgs(format!(
                "Element of type '{}' supports only single unnamed argument",
                self.class_name()
            ))),
            Input::Attribute(_) => Err(FeedError::InvalidConstructorArgs(format!(
                "Element of type '{}' does not accept ElementAttribute as argument",
                self.class_name()
            ))),
        }
    }

    pub(crate) fn apply_pairs(&mut self, pairs: Vec<(String, Input)>) -> Result<(), FeedError> {
        let unknown: Vec<String> = pairs
            .iter()
            .filter(|(name, _)| self.schema.locate(name).is_none())
            .map(|(name, _)| name.clone())
            .collect();
        if !unknown.is_empty() {
            return Err(FeedError::UnknownComponents {
                class: self.class_name().to_string(),
                names: unknown,
                supported: self.schema.component_names(),
            });
        }
        for (name, value) in pairs {
            self.set(&name, value)?;
        }
        Ok(())
    }

    fn apply_scalar(&mut self, value: Value) -> Result<(), FeedError> {
        if let Some(idx) = self.schema.content_index() {
            self.attrs[idx].set_value(value);
            return Ok(());
        }
        if self.attrs.is_empty() && self.children.len() == 1 {
            return self.set_child(0, Input::Scalar(value));
        }
        Err(FeedError::InvalidConstructorArgs(format!(
            "Element of type '{}' does not support unnamed non-mapping arguments \
             (no content attribute, another attribute exists or no single child)",
            self.class_name()
        )))
    }

    fn set_attribute(&mut self, idx: usize, value: Input) -> Result<(), FeedError> {
        match value {
            Input::None => {
                self.attrs[idx].clear();
                Ok(())
            }
            Input::Scalar(value) => {
                self.attrs[idx].set_value(value);
                Ok(())
            }
            Input::Attribute(_) => Err(self.invalid_attribute(
                idx,
                "attribute value cannot be instance of ElementAttribute class".to_string(),
            )),
            other => Err(self.invalid_attribute(
                idx,
                format!("attribute value must be a scalar, not {}", other.describe()),
            )),
        }
    }

    fn set_child(&mut self, idx: usize, value: Input) -> Result<(), FeedError> {
        let schema = Arc::clone(&self.schema);
        let name = schema.child_names()[idx].pub_name();
        match &mut self.children[idx] {
            Component::Multiple(multiple) => {
                multiple.clear();
                if value.is_none() {
                    return Ok(());
                }
                multiple.add(value)
            }
            Component::Element(current) => current.assign_to_slot(name, value),
        }
    }

    /// Applies a value assigned to the slot this element occupies.
    fn assign_to_slot(&mut self, name: &str, value: Input) -> Result<(), FeedError> {
        match value {
            Input::None => {
                self.clear();
                Ok(())
            }
            Input::Element(mut new) => {
                if !new.schema.is_subclass_of(&self.schema) {
                    return Err(invalid_element_value(
                        name,
                        self.class_name(),
                        format!("<{} element>", new.class_name()),
                        format!("value is not instance of '{}'", self.class_name()),
                    ));
                }
                if !new.adopt_slot_settings(self) {
                    return Err(invalid_element_value(
                        name,
                        self.class_name(),
                        format!("<{} element>", new.class_name()),
                        "Value class or its attributes are incompatible".to_string(),
                    ));
                }
                *self = new;
                Ok(())
            }
            Input::Map(pairs) => {
                let mut new = Element::new(&self.schema);
                new.ns = self.ns.clone();
                new.required = self.required;
                new.apply_pairs(pairs)?;
                *self = new;
                Ok(())
            }
            Input::Scalar(value) => {
                let schema = Arc::clone(&self.schema);
                let required = schema.required_attrs();
                let content_only = match schema.content_name() {
                    Some(content) => {
                        required.is_empty() || (required.len() == 1 && required[0] == content)
                    }
                    None => false,
                };
                if content_only {
                    if let Some(idx) = schema.content_index() {
                        self.attrs[idx].set_value(value);
                        return Ok(());
                    }
                }
                if self.children.len() == 1 && required.is_empty() {
                    return self.set_child(0, Input::Scalar(value));
                }
                Err(invalid_element_value(
                    name,
                    self.class_name(),
                    format!("'{}'", value),
                    "element requires named attributes".to_string(),
                ))
            }
            other => Err(invalid_element_value(
                name,
                self.class_name(),
                other.describe(),
                "value must be an element, a mapping or a scalar".to_string(),
            )),
        }
    }

    /// Takes the required flag and missing namespace parts of the slot.
    /// Returns whether the namespaces agree afterwards.
    fn adopt_slot_settings(&mut self, slot: &Element) -> bool {
        self.required = slot.required;
        if !self.ns.is_set() && slot.ns.is_set() && self.ns.set_uri(slot.ns_uri()).is_err() {
            return false;
        }
        if self.ns.prefix().is_empty()
            && !slot.ns.prefix().is_empty()
            && self.ns.uri() == slot.ns.uri()
            && self.ns.set_prefix(slot.ns_prefix()).is_err()
        {
            return false;
        }
        self.ns == slot.ns
    }

    fn invalid_attribute(&self, idx: usize, reason: String) -> FeedError {
        FeedError::InvalidAttributeValue {
            component: self.schema.attr_names()[idx].pub_name().to_string(),
            reason,
        }
    }

    fn unknown_component(&self, name: &str) -> FeedError {
        FeedError::UnknownComponent {
            name: name.to_string(),
            supported: self.schema.component_names(),
        }
    }
}

pub(crate) fn child_path(path: &[String], name: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(name.to_string());
    child
}

fn kind_mismatch(name: &str, expected: ComponentKind, actual: ComponentKind) -> FeedError {
    FeedError::ComponentKindMismatch {
        name: name.to_string(),
        expected,
        actual,
    }
}

fn invalid_element_value(name: &str, class: &str, value: String, reason: String) -> FeedError {
    FeedError::InvalidElementValue {
        component: name.to_string(),
        class: class.to_string(),
        value,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ElementAttribute, ElementSchema, MultipleElements};

    fn content_schema(class: &str) -> Arc<ElementSchema> {
        ElementSchema::builder(class)
            .attribute("value", ElementAttribute::new().required(true).content(true))
            .build()
            .unwrap()
    }

    fn guid_schema() -> Arc<ElementSchema> {
        ElementSchema::builder("Guid")
            .attribute("isPermaLink", ElementAttribute::new().with_value(true))
            .attribute("value", ElementAttribute::new().required(true).content(true))
            .build()
            .unwrap()
    }

    fn enclosure_schema() -> Arc<ElementSchema> {
        ElementSchema::builder("Enclosure")
            .attribute("url", ElementAttribute::new().required(true))
            .attribute("length", ElementAttribute::new().required(true))
            .attribute("type", ElementAttribute::new().required(true))
            .build()
            .unwrap()
    }

    fn parent_schema() -> Arc<ElementSchema> {
        ElementSchema::builder("Parent")
            .child("title", content_schema("Title").instance())
            .child("guid", guid_schema().instance())
            .child("enclosure", enclosure_schema().instance())
            .child("category", MultipleElements::new(&content_schema("Category")))
            .build()
            .unwrap()
    }

    #[test]
    fn scalar_sets_content_of_child() {
        let mut parent = parent_schema().instance();
        assert!(!parent.assigned());
        parent.set("title", "Some title").unwrap();
        assert!(parent.assigned());
        assert_eq!(parent.child("title").unwrap().content().unwrap(), "Some title");

        parent.set("guid", "id-1").unwrap();
        let guid = parent.child("guid").unwrap();
        assert_eq!(guid.attr("isPermaLink").unwrap(), Some(&Value::Bool(true)));
        assert_eq!(guid.content().unwrap(), "id-1");
    }

    #[test]
    fn scalar_into_element_with_required_attrs_fails() {
        let mut parent = parent_schema().instance();
        let err = parent.set("enclosure", "http://example.com/").unwrap_err();
        assert!(matches!(err, FeedError::InvalidElementValue { ref component, .. } if component == "enclosure"));
        assert!(err.to_string().contains("category = [\"cat1\", \"cat2\"]"));
    }

    #[test]
    fn mapping_builds_new_child() {
        let mut parent = parent_schema().instance();
        parent
            .set(
                "enclosure",
                Input::map([("url", "http://example.com/1.mp3"), ("length", "0"), ("type", "audio/mpeg")]),
            )
            .unwrap();
        let enclosure = parent.child("enclosure").unwrap();
        assert_eq!(enclosure.attr("type").unwrap().unwrap(), "audio/mpeg");
        assert!(parent.validate(&[]).is_ok());

        let err = parent
            .set("enclosure", Input::map([("unknown", "x")]))
            .unwrap_err();
        assert!(matches!(err, FeedError::UnknownComponents { ref names, .. } if names == &["unknown"]));
    }

    #[test]
    fn default_attribute_does_not_assign_element() {
        let guid = guid_schema().instance();
        assert!(!guid.assigned());
        assert_eq!(guid.serialize_attrs().len(), 1);
        assert!(guid.validate(&[]).is_ok());

        let mut guid = guid;
        guid.set("isPermaLink", false).unwrap();
        assert!(guid.assigned());
        let err = guid.validate(&["guid".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid attribute 'guid.value': missing required attribute");
    }

    #[test]
    fn none_clears_component() {
        let mut parent = parent_schema().instance();
        parent.set("title", "t").unwrap();
        parent.set("category", vec!["a", "b"]).unwrap();
        parent.set("title", None::<&str>).unwrap();
        parent.set("category", Input::None).unwrap();
        assert!(!parent.assigned());
    }

    #[test]
    fn attribute_values_must_be_scalars() {
        let mut guid = guid_schema().instance();
        let err = guid.set("isPermaLink", ElementAttribute::new()).unwrap_err();
        assert!(matches!(err, FeedError::InvalidAttributeValue { .. }));
        let err = guid.set("isPermaLink", vec!["a"]).unwrap_err();
        assert!(matches!(err, FeedError::InvalidAttributeValue { .. }));
    }

    #[test]
    fn element_of_same_class_replaces_child() {
        let title_schema = content_schema("Title");
        let schema = ElementSchema::builder("Parent")
            .child("title", title_schema.instance().with_required(true))
            .build()
            .unwrap();
        let mut parent = schema.instance();
        let title = Element::from_input(&title_schema, "Replaced").unwrap();
        parent.set("title", title).unwrap();
        let child = parent.child("title").unwrap();
        assert!(child.is_required());
        assert_eq!(child.content().unwrap(), "Replaced");

        let other = Element::from_input(&content_schema("Title"), "Other class").unwrap();
        let err = parent.set("title", other).unwrap_err();
        assert!(err.to_string().contains("value is not instance of 'Title'"));
    }

    #[test]
    fn element_with_other_namespace_is_incompatible() {
        let title_schema = content_schema("Title");
        let schema = ElementSchema::builder("Parent")
            .child(
                "title",
                title_schema
                    .instance()
                    .with_namespace(Some("p"), "id1")
                    .unwrap(),
            )
            .build()
            .unwrap();
        let mut parent = schema.instance();

        let plain = Element::from_input(&title_schema, "x").unwrap();
        parent.set("title", plain).unwrap();
        assert_eq!(parent.child("title").unwrap().ns_prefix(), "p");

        let foreign = Element::from_input(&title_schema, "x")
            .unwrap()
            .with_namespace(Some("p"), "id2")
            .unwrap();
        let err = parent.set("title", foreign).unwrap_err();
        assert!(err.to_string().contains("incompatible"));
    }

    #[test]
    fn unknown_component_names_supported_ones() {
        let mut parent = parent_schema().instance();
        let err = parent.set("nonexistent", "x").unwrap_err();
        assert!(err.to_string().contains("No attribute 'nonexistent'"));
        assert!(err.to_string().contains("title"));
        assert!(parent.child("category").is_err());
        assert!(parent.multiple("title").is_err());
    }

    #[test]
    fn constructor_rules() {
        assert!(Element::from_input(&enclosure_schema(), "x").is_err());
        assert!(Element::from_input(&content_schema("T"), vec!["a", "b"]).is_err());
        let element = Element::from_input(&content_schema("T"), "x").unwrap();
        let err = Element::from_input(&content_schema("T"), element).unwrap_err();
        assert!(matches!(err, FeedError::InvalidConstructorArgs(_)));

        let wrapper = ElementSchema::builder("Wrapper")
            .child("inner", content_schema("Inner").instance())
            .build()
            .unwrap();
        let element = Element::from_input(&wrapper, "nested").unwrap();
        assert_eq!(element.child("inner").unwrap().content().unwrap(), "nested");
    }

    #[test]
    fn validation_reports_path() {
        let schema = ElementSchema::builder("Parent")
            .child("title", content_schema("Title").instance().with_required(true))
            .child("category", MultipleElements::new(&content_schema("Category")))
            .build()
            .unwrap();
        let mut parent = schema.instance();
        parent.set("category", vec!["ok"]).unwrap();
        let err = parent.validate(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid element 'title': missing required element");

        parent.set("title", "t").unwrap();
        assert!(parent.validate(&[]).is_ok());
    }

    #[test]
    fn clear_restores_defaults() {
        let mut guid = guid_schema().instance();
        guid.set("isPermaLink", false).unwrap();
        guid.set("value", "x").unwrap();
        guid.clear();
        assert!(!guid.assigned());
        assert_eq!(guid.attr("isPermaLink").unwrap(), Some(&Value::Bool(true)));
        assert_eq!(guid.content(), None);
    }

    #[test]
    fn namespaces_of_assigned_components() {
        let ns_child = content_schema("Child");
        let schema = ElementSchema::builder("Parent")
            .attribute(
                "a__attr",
                ElementAttribute::new().with_namespace(None, "id_a").unwrap(),
            )
            .child(
                "b__child",
                ns_child.instance().with_namespace(None, "id_b").unwrap(),
            )
            .build()
            .unwrap();
        let mut parent = schema.instance();
        assert!(parent.get_namespaces(true, false).is_empty());
        assert_eq!(parent.get_namespaces(false, false).len(), 2);

        parent.set("b__child", "x").unwrap();
        let namespaces = parent.get_namespaces(true, false);
        assert_eq!(namespaces.len(), 1);
        assert!(parent.get_namespaces(true, true).is_empty());
    }

    #[test]
    fn instances_never_share_components() {
        let schema = parent_schema();
        let mut first = schema.instance();
        let second = schema.instance();

        first.set("title", "first").unwrap();
        first.child_mut("guid").unwrap().set("isPermaLink", false).unwrap();
        first.multiple_mut("category").unwrap().append("c").unwrap();

        assert!(!second.assigned());
        assert_eq!(second.child("title").unwrap().content(), None);
        assert_eq!(
            second.child("guid").unwrap().attr("isPermaLink").unwrap(),
            Some(&Value::Bool(true))
        );
        assert!(second.multiple("category").unwrap().is_empty());
        assert!(schema.instance().multiple("category").unwrap().is_empty());
    }

    #[test]
    fn assigned_values_read_back_unchanged() {
        let mut parent = parent_schema().instance();
        let values = [Value::from(0), Value::from(""), Value::from("Заголовок ✓"), Value::from(-1.5)];
        for value in values {
            parent.set("title", value.clone()).unwrap();
            assert_eq!(parent.child("title").unwrap().content(), Some(&value));

            let mut guid = parent.child("guid").unwrap().clone();
            guid.set("isPermaLink", value.clone()).unwrap();
            assert_eq!(guid.attr("isPermaLink").unwrap(), Some(&value));
        }

        parent.set("title", Input::None).unwrap();
        assert_eq!(parent.child("title").unwrap().content(), None);
        assert!(!parent.child("title").unwrap().assigned());
    }

    #[test]
    fn required_content_follows_assignment() {
        let mut title = content_schema("Title").instance().with_required(true);
        let path = ["title".to_string()];
        assert_eq!(
            title.validate(&path).unwrap_err().to_string(),
            "Invalid element 'title': missing required element"
        );

        title.set("value", "Title").unwrap();
        assert!(title.validate(&path).is_ok());

        title.set("value", Input::None).unwrap();
        assert!(title.validate(&path).is_err());
    }

    #[test]
    fn empty_mapping_assigns_owner() {
        let mut image = crate::rss::channel_elements::IMAGE_ELEMENT.instance();
        image
            .set("width", Input::map(Vec::<(String, Input)>::new()))
            .unwrap();

        assert!(image.assigned());
        assert!(!image.child("width").unwrap().assigned());
        let err = image.validate(&["image".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid element 'image.url': missing required element");

        image.clear();
        assert!(!image.assigned());
    }
}
