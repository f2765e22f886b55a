use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::FeedError;
use crate::meta::element::{ComponentRef, Element};
use crate::meta::multiple::MultipleElements;
use crate::meta::nscomponent::NamespaceSet;
use crate::meta::schema::ElementSchema;
use crate::meta::value::{Input, Value};

/// A scraped record: the element tree of its class plus free-form fields.
///
/// Fields hold arbitrary JSON data that is not exported; components are
/// exported as RSS. An RSS item can be attached to records whose own class
/// is not an RSS item (see [`ElementBuilder::rss_item`](crate::meta::ElementBuilder::rss_item)).
///
/// # Examples
///
/// ```
/// use scrapy_rss::meta::{ElementSchema, FeedItem};
/// use scrapy_rss::rss::RSS_ITEM;
/// use serde_json::json;
///
/// let schema = ElementSchema::builder("PageItem")
///     .extends(&RSS_ITEM)
///     .field("url")
///     .build()
///     .unwrap();
///
/// let mut item = FeedItem::from_json(&schema, json!({
///     "url": "http://example.com/page",
///     "title": "Page title",
///     "category": ["news", "tech"],
/// }))
/// .unwrap();
///
/// assert_eq!(item.field("url").unwrap(), Some(&json!("http://example.com/page")));
/// assert_eq!(item.multiple("category").unwrap().len(), 2);
/// assert!(item.set("url", "x").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FeedItem {
    element: Element,
    fields: BTreeMap<String, JsonValue>,
    rss: Option<Box<FeedItem>>,
}

impl FeedItem {
    /// Empty record. Schemas declared with an RSS item get an empty one attached.
    pub fn new(schema: &Arc<ElementSchema>) -> Self {
        FeedItem {
            element: Element::new(schema),
            fields: BTreeMap::new(),
            rss: schema
                .rss_item_schema()
                .map(|rss_schema| Box::new(FeedItem::new(rss_schema))),
        }
    }

    /// Record built from a JSON object whose keys are field or component names.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidFeedItem`] when `data` is not an object,
    /// [`FeedError::UnknownComponents`] for keys that are neither fields nor
    /// components, and any setter error.
    pub fn from_json(schema: &Arc<ElementSchema>, data: JsonValue) -> Result<Self, FeedError> {
        let JsonValue::Object(map) = data else {
            return Err(FeedError::InvalidFeedItem(format!(
                "Item of class '{}' must be built from a JSON object",
                schema.class_name()
            )));
        };
        let mut item = FeedItem::new(schema);
        let mut components = Vec::new();
        for (key, value) in map {
            if schema.has_field(&key) {
                item.fields.insert(key, value);
            } else {
                components.push((key, Input::from(value)));
            }
        }
        item.element.apply_pairs(components)?;
        Ok(item)
    }

    pub fn schema(&self) -> &Arc<ElementSchema> {
        self.element.schema()
    }

    pub fn class_name(&self) -> &str {
        self.element.class_name()
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    /// # Errors
    ///
    /// [`FeedError::UnknownField`] for an undeclared field.
    pub fn field(&self, name: &str) -> Result<Option<&JsonValue>, FeedError> {
        self.check_field(name)?;
        Ok(self.fields.get(name))
    }

    /// # Errors
    ///
    /// [`FeedError::UnknownField`] for an undeclared field.
    pub fn set_field(&mut self, name: &str, value: impl Into<JsonValue>) -> Result<(), FeedError> {
        self.check_field(name)?;
        self.fields.insert(name.to_string(), value.into());
        Ok(())
    }

    /// # Errors
    ///
    /// [`FeedError::UnknownField`] for an undeclared field.
    pub fn remove_field(&mut self, name: &str) -> Result<Option<JsonValue>, FeedError> {
        self.check_field(name)?;
        Ok(self.fields.remove(name))
    }

    /// Component of the record.
    ///
    /// # Errors
    ///
    /// [`FeedError::FieldGetter`] when `name` is a field.
    pub fn get(&self, name: &str) -> Result<ComponentRef<'_>, FeedError> {
        if self.schema().has_field(name) {
            return Err(FeedError::FieldGetter(name.to_string()));
        }
        self.element.component(name)
    }

    /// Assigns a component, with the same dispatch as [`Element::set`].
    ///
    /// # Errors
    ///
    /// [`FeedError::FieldSetter`] when `name` is a field.
    pub fn set(&mut self, name: &str, value: impl Into<Input>) -> Result<(), FeedError> {
        if self.schema().has_field(name) {
            return Err(FeedError::FieldSetter(name.to_string()));
        }
        self.element.set(name, value)
    }

    pub fn attr(&self, name: &str) -> Result<Option<&Value>, FeedError> {
        self.element.attr(name)
    }

    pub fn child(&self, name: &str) -> Result<&Element, FeedError> {
        self.element.child(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Result<&mut Element, FeedError> {
        self.element.child_mut(name)
    }

    pub fn multiple(&self, name: &str) -> Result<&MultipleElements, FeedError> {
        self.element.multiple(name)
    }

    pub fn multiple_mut(&mut self, name: &str) -> Result<&mut MultipleElements, FeedError> {
        self.element.multiple_mut(name)
    }

    /// Attached RSS item.
    pub fn rss(&self) -> Option<&FeedItem> {
        self.rss.as_deref()
    }

    pub fn rss_mut(&mut self) -> Option<&mut FeedItem> {
        self.rss.as_deref_mut()
    }

    pub fn set_rss(&mut self, rss: Option<FeedItem>) {
        self.rss = rss.map(Box::new);
    }

    pub fn assigned(&self) -> bool {
        self.element.assigned()
    }

    /// Validates every component of the record.
    pub fn validate(&self) -> Result<(), FeedError> {
        self.element.validate(&[])
    }

    pub fn get_namespaces(&self, assigned_only: bool) -> NamespaceSet {
        self.element.get_namespaces(assigned_only, false)
    }

    fn check_field(&self, name: &str) -> Result<(), FeedError> {
        if !self.schema().has_field(name) {
            return Err(FeedError::UnknownField(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rss::{RSS_ITEM, RSSED_ITEM};
    use serde_json::json;

    fn item_schema() -> Arc<ElementSchema> {
        ElementSchema::builder("ArticleItem")
            .extends(&RSSED_ITEM)
            .field("url")
            .field("body")
            .build()
            .unwrap()
    }

    #[test]
    fn fields_are_accessed_by_name() {
        let mut item = FeedItem::new(&item_schema());
        assert_eq!(item.field("url").unwrap(), None);
        item.set_field("url", "http://example.com/").unwrap();
        assert_eq!(item.field("url").unwrap(), Some(&json!("http://example.com/")));

        let err = item.set_field("unknown", 1).unwrap_err();
        assert!(err.to_string().contains("does not support field"));
        assert_eq!(item.remove_field("url").unwrap(), Some(json!("http://example.com/")));
    }

    #[test]
    fn component_accessors_reject_fields() {
        let mut item = FeedItem::new(&item_schema());
        let err = item.set("body", "text").unwrap_err();
        assert!(err.to_string().contains("to set field value"));
        let err = item.get("body").unwrap_err();
        assert!(err.to_string().contains("to get field value"));
    }

    #[test]
    fn rssed_item_carries_rss_item() {
        let mut item = FeedItem::new(&item_schema());
        let rss = item.rss_mut().unwrap();
        assert!(rss.schema().is_subclass_of(&RSS_ITEM));
        rss.set("title", "Title").unwrap();
        assert!(item.rss().unwrap().assigned());
        assert!(!item.assigned());

        item.set_rss(None);
        assert!(item.rss().is_none());
    }

    #[test]
    fn from_json_rejects_unknown_keys() {
        let err = FeedItem::from_json(&item_schema(), json!({"url": "x", "nonexistent": 1})).unwrap_err();
        assert!(err.to_string().contains("does not support components"));
        assert!(FeedItem::from_json(&item_schema(), json!([1, 2])).is_err());
    }

    #[test]
    fn from_json_sets_nested_components() {
        let item = FeedItem::from_json(
            &RSS_ITEM,
            json!({
                "title": "Title",
                "guid": {"isPermaLink": false, "value": "Identifier"},
                "enclosure": {"url": "http://example.com/1.mp3", "length": 0, "type": "audio/mpeg"},
            }),
        )
        .unwrap();
        let guid = item.child("guid").unwrap();
        assert_eq!(guid.attr("isPermaLink").unwrap(), Some(&Value::Bool(false)));
        assert!(item.validate().is_ok());
    }

    #[test]
    fn records_never_share_components() {
        let mut first = FeedItem::new(&RSS_ITEM);
        let second = FeedItem::new(&RSS_ITEM);

        first.set("title", "First").unwrap();
        first.child_mut("guid").unwrap().set("isPermaLink", false).unwrap();
        first.multiple_mut("category").unwrap().append("tag").unwrap();

        assert_eq!(second.child("title").unwrap().content(), None);
        assert_eq!(
            second.child("guid").unwrap().attr("isPermaLink").unwrap(),
            Some(&Value::Bool(true))
        );
        assert!(second.multiple("category").unwrap().is_empty());
        assert!(!second.assigned());
        assert_eq!(first.multiple("category").unwrap().len(), 1);

        let mut first = FeedItem::new(&item_schema());
        let second = FeedItem::new(&item_schema());
        first.rss_mut().unwrap().set("description", "Attached").unwrap();
        first.set_field("url", "http://example.com/1").unwrap();

        assert!(!second.rss().unwrap().assigned());
        assert_eq!(second.field("url").unwrap(), None);
    }
}
