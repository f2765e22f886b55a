use std::ops::Index;
use std::sync::Arc;

use crate::error::{ComponentKind, FeedError};
use crate::meta::element::{ComponentRef, Element, child_path};
use crate::meta::nscomponent::{Namespace, NamespaceSet};
use crate::meta::schema::ElementSchema;
use crate::meta::value::{Input, Value};

/// Repeated sibling elements of one element class, such as the `category`
/// elements of an RSS item.
///
/// Members inherit the namespace of the container when they have none.
/// Component access through the container (`attr`, `set`) is a shortcut that
/// only works while exactly one member exists.
///
/// # Examples
///
/// ```
/// use scrapy_rss::meta::MultipleElements;
/// use scrapy_rss::rss::CATEGORY_ELEMENT;
///
/// let mut categories = MultipleElements::new(&CATEGORY_ELEMENT);
/// categories.add(vec!["first", "second"]).unwrap();
/// categories.append("third").unwrap();
/// assert_eq!(categories.len(), 3);
///
/// let last = categories.pop().unwrap();
/// assert_eq!(last.content().unwrap(), "third");
/// assert!(categories.attr("value").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MultipleElements {
    base: Arc<ElementSchema>,
    ns: Namespace,
    required: bool,
    elements: Vec<Element>,
}

impl MultipleElements {
    pub fn new(base: &Arc<ElementSchema>) -> Self {
        MultipleElements {
            base: Arc::clone(base),
            ns: Namespace::default(),
            required: false,
            elements: Vec::new(),
        }
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

    /// Class of the members.
    pub fn base_schema(&self) -> &Arc<ElementSchema> {
        &self.base
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    pub(crate) fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.ns
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn assigned(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.elements.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    /// Content values of all members.
    pub fn contents(&self) -> Vec<Option<&Value>> {
        self.elements.iter().map(Element::content).collect()
    }

    /// Appends one member.
    ///
    /// The value can be an element of the base class or a derived class, a
    /// mapping of component values or a content value.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidElementType`] for an element of another class, or
    /// any error raised while building the member.
    pub fn append(&mut self, value: impl Into<Input>) -> Result<(), FeedError> {
        let element = self.check_value(value.into())?;
        self.elements.push(element);
        Ok(())
    }

    pub fn extend<I, T>(&mut self, values: I) -> Result<(), FeedError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        for value in values {
            self.append(value)?;
        }
        Ok(())
    }

    /// Appends every item of a list, or a single member otherwise.
    pub fn add(&mut self, value: impl Into<Input>) -> Result<(), FeedError> {
        match value.into() {
            Input::List(items) => self.extend(items),
            other => self.append(other),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Removes the last member.
    pub fn pop(&mut self) -> Option<Element> {
        self.elements.pop()
    }

    /// # Errors
    ///
    /// [`FeedError::IndexOutOfRange`] for an index past the end.
    pub fn pop_at(&mut self, index: usize) -> Result<Element, FeedError> {
        self.check_index(index)?;
        Ok(self.elements.remove(index))
    }

    /// # Errors
    ///
    /// [`FeedError::IndexOutOfRange`] for an index past the end.
    pub fn remove(&mut self, index: usize) -> Result<(), FeedError> {
        self.pop_at(index).map(|_| ())
    }

    /// Replaces the member at `index`.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidElementType`] for an element of another class,
    /// [`FeedError::IndexOutOfRange`] for an index past the end.
    pub fn replace(&mut self, index: usize, element: Element) -> Result<(), FeedError> {
        if !element.schema().is_subclass_of(&self.base) {
            return Err(self.invalid_type(&element));
        }
        self.check_index(index)?;
        self.elements[index] = element;
        Ok(())
    }

    /// Component of the single member.
    ///
    /// # Errors
    ///
    /// [`FeedError::AttributeAccess`] unless exactly one member exists or when
    /// the base class has no such component.
    pub fn component(&self, name: &str) -> Result<ComponentRef<'_>, FeedError> {
        self.check_component_name(name)?;
        match self.elements.as_slice() {
            [] => Err(FeedError::AttributeAccess(format!(
                "Instances of '{}' have not been assigned",
                self.base.class_name()
            ))),
            [single] => single.component(name),
            _ => Err(FeedError::AttributeAccess(
                "Cannot get attribute: more than one elements have been assigned. \
                 Choose element and get its' attribute."
                    .to_string(),
            )),
        }
    }

    /// Attribute value of the single member.
    pub fn attr(&self, name: &str) -> Result<Option<&Value>, FeedError> {
        match self.component(name)? {
            ComponentRef::Attribute(attr) => Ok(attr.value()),
            other => Err(FeedError::ComponentKindMismatch {
                name: name.to_string(),
                expected: ComponentKind::Attribute,
                actual: other.kind(),
            }),
        }
    }

    /// Sets a component of the single member. `None` clears the container.
    ///
    /// # Errors
    ///
    /// [`FeedError::AttributeAccess`] unless exactly one member exists or when
    /// the base class has no such component.
    pub fn set(&mut self, name: &str, value: impl Into<Input>) -> Result<(), FeedError> {
        self.check_component_name(name)?;
        let value = value.into();
        if value.is_none() {
            self.clear();
            return Ok(());
        }
        match self.elements.as_mut_slice() {
            [single] => single.set(name, value),
            elements => Err(FeedError::AttributeAccess(format!(
                "Cannot set attribute: {} elements have been assigned. \
                 Choose element and set its' attribute.",
                elements.len()
            ))),
        }
    }

    /// # Errors
    ///
    /// Always [`FeedError::UnsupportedSerialization`]: members are serialized
    /// one by one.
    pub fn serialize_attrs(&self) -> Result<Vec<(String, String)>, FeedError> {
        Err(FeedError::UnsupportedSerialization("MultipleElements".to_string()))
    }

    /// Validates every member, then the container's own requirement.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidComponent`] naming `path[index]` of the first
    /// invalid member.
    pub fn validate(&self, path: &[String]) -> Result<(), FeedError> {
        for (idx, element) in self.elements.iter().enumerate() {
            element.validate(&child_path(path, &format!("[{}]", idx)))?;
        }
        if self.required && self.elements.is_empty() {
            return Err(FeedError::InvalidComponent {
                kind: ComponentKind::MultipleElements,
                path: path.to_vec(),
                message: "missing required elements".to_string(),
            });
        }
        Ok(())
    }

    pub fn get_namespaces(&self, assigned_only: bool) -> NamespaceSet {
        let mut namespaces = self.ns.get_namespaces();
        for element in &self.elements {
            namespaces.extend(element.get_namespaces(assigned_only, false));
        }
        namespaces
    }

    fn check_value(&self, value: Input) -> Result<Element, FeedError> {
        let mut element = match value {
            Input::Element(element) => {
                if !element.schema().is_subclass_of(&self.base) {
                    return Err(self.invalid_type(&element));
                }
                element
            }
            Input::Map(pairs) => {
                let mut element = Element::new(&self.base);
                element.apply_pairs(pairs)?;
                element
            }
            Input::Scalar(value) => Element::from_input(&self.base, value)?,
            other => {
                return Err(FeedError::InvalidElementValue {
                    component: self.base.class_name().to_string(),
                    class: self.base.class_name().to_string(),
                    value: other.describe(),
                    reason: "value must be an element, a mapping or a content value".to_string(),
                });
            }
        };
        if !element.namespace().is_set() && self.ns.is_set() {
            element.namespace_mut().set_uri(self.ns.uri())?;
        }
        if element.ns_prefix().is_empty()
            && !self.ns.prefix().is_empty()
            && element.ns_uri() == self.ns.uri()
        {
            element.namespace_mut().set_prefix(self.ns.prefix())?;
        }
        Ok(element)
    }

    fn check_index(&self, index: usize) -> Result<(), FeedError> {
        if index >= self.elements.len() {
            return Err(FeedError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        Ok(())
    }

    fn check_component_name(&self, name: &str) -> Result<(), FeedError> {
        if self.base.locate(name).is_none() {
            return Err(FeedError::AttributeAccess(format!(
                "Elements of type '{}' does not have '{}' attribute or child",
                self.base.class_name(),
                name
            )));
        }
        Ok(())
    }

    fn invalid_type(&self, element: &Element) -> FeedError {
        FeedError::InvalidElementType {
            expected: self.base.class_name().to_string(),
            actual: element.class_name().to_string(),
        }
    }
}

impl Index<usize> for MultipleElements {
    type Output = Element;

    fn index(&self, index: usize) -> &Element {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a MultipleElements {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ElementAttribute;

    fn category_schema() -> Arc<ElementSchema> {
        ElementSchema::builder("Category")
            .attribute("domain", ElementAttribute::new())
            .attribute("value", ElementAttribute::new().required(true).content(true))
            .build()
            .unwrap()
    }

    #[test]
    fn add_accepts_scalars_mappings_and_lists() {
        let schema = category_schema();
        let mut categories = MultipleElements::new(&schema);
        categories.add("first").unwrap();
        categories
            .add(Input::map([("value", "second"), ("domain", "http://example.com/")]))
            .unwrap();
        categories.add(vec!["third", "fourth"]).unwrap();
        categories.append(Element::from_input(&schema, "fifth").unwrap()).unwrap();

        let contents: Vec<String> = categories
            .iter()
            .map(|e| e.content().unwrap().to_string())
            .collect();
        assert_eq!(contents, ["first", "second", "third", "fourth", "fifth"]);
        assert_eq!(categories[1].attr("domain").unwrap().unwrap(), "http://example.com/");
    }

    #[test]
    fn foreign_elements_are_rejected() {
        let mut categories = MultipleElements::new(&category_schema());
        let other = Element::from_input(&category_schema(), "x").unwrap();
        let err = categories.append(other.clone()).unwrap_err();
        assert!(matches!(err, FeedError::InvalidElementType { .. }));

        categories.append("ok").unwrap();
        assert!(categories.replace(0, other).is_err());
        assert!(categories.replace(3, categories[0].clone()).is_err());
    }

    #[test]
    fn proxy_access_requires_single_member() {
        let mut categories = MultipleElements::new(&category_schema());
        let err = categories.attr("value").unwrap_err();
        assert_eq!(err.to_string(), "Instances of 'Category' have not been assigned");

        categories.append("only").unwrap();
        assert_eq!(categories.attr("value").unwrap().unwrap(), "only");
        categories.set("domain", "d").unwrap();
        assert_eq!(categories[0].attr("domain").unwrap().unwrap(), "d");

        categories.append("second").unwrap();
        let err = categories.attr("value").unwrap_err();
        assert!(err.to_string().starts_with("Cannot get attribute: more than one"));
        let err = categories.set("domain", "d").unwrap_err();
        assert!(err.to_string().starts_with("Cannot set attribute: 2 elements"));

        let err = categories.attr("missing").unwrap_err();
        assert!(err.to_string().contains("does not have 'missing'"));

        categories.set("value", Input::None).unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn members_inherit_container_namespace() {
        let mut categories = MultipleElements::new(&category_schema())
            .with_namespace(Some("p"), "id1")
            .unwrap();
        categories.append("x").unwrap();
        assert_eq!(categories[0].ns_prefix(), "p");
        assert_eq!(categories[0].ns_uri(), "id1");
        assert_eq!(categories.get_namespaces(true).len(), 1);
    }

    #[test]
    fn validation_path_contains_index() {
        let mut categories = MultipleElements::new(&category_schema()).with_required(true);
        let err = categories.validate(&["category".to_string()]).unwrap_err();
        assert!(err.to_string().contains("missing required elements"));

        categories.append("ok").unwrap();
        categories.append(Input::map([("domain", "d")])).unwrap();
        let err = categories.validate(&["category".to_string()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid attribute 'category[1].value': missing required attribute"
        );
    }

    #[test]
    fn pop_and_remove() {
        let mut categories = MultipleElements::new(&category_schema());
        categories.add(vec!["a", "b", "c"]).unwrap();
        assert_eq!(categories.pop_at(0).unwrap().content().unwrap(), "a");
        categories.remove(1).unwrap();
        assert_eq!(categories.len(), 1);
        assert!(matches!(
            categories.pop_at(5),
            Err(FeedError::IndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(categories.serialize_attrs().is_err());
        assert!(categories.pop().is_some());
        assert!(!categories.assigned());
    }
}
