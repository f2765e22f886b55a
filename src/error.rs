use std::fmt;

use thiserror::Error;

/// Kind of component a validation error points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Attribute,
    Element,
    MultipleElements,
    Item,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ComponentKind::Attribute => "attribute",
            ComponentKind::Element => "element",
            ComponentKind::MultipleElements => "multiple elements",
            ComponentKind::Item => "item",
        };
        f.write_str(kind)
    }
}

#[derive(Error, Debug)]
/// Feed error
pub enum FeedError {
    #[error("Component name '{0}' is reserved. Add one or more trailing underscores to use it")]
    InvalidComponentName(String),

    #[error("No URI for prefix '{0}'")]
    NoNamespaceUri(String),

    #[error("Namespace {0} is already non-empty")]
    NamespaceAlreadySet(&'static str),

    #[error("More than one attributes that's interpreted as content in the element '{0}' definition")]
    MultipleContent(String),

    #[error("Content cannot have namespace (attribute '{0}')")]
    NamespacedContent(String),

    #[error(
        "Could not assign value {value} to component '{component}' of class '{class}': {reason}. \
         For multiple allowed elements use list: category = [\"cat1\", \"cat2\"]"
    )]
    InvalidElementValue {
        component: String,
        class: String,
        value: String,
        reason: String,
    },

    #[error("Invalid value of attribute '{component}': {reason}")]
    InvalidAttributeValue { component: String, reason: String },

    #[error("{0}")]
    InvalidConstructorArgs(String),

    #[error(
        "Element does not support components: {names:?}. Class '{class}' supports only the next named arguments: {supported:?}"
    )]
    UnknownComponents {
        class: String,
        names: Vec<String>,
        supported: Vec<String>,
    },

    #[error("No attribute '{name}'. Supported components: {supported:?}")]
    UnknownComponent { name: String, supported: Vec<String> },

    #[error("Component '{name}' is {actual}, not {expected}")]
    ComponentKindMismatch {
        name: String,
        expected: ComponentKind,
        actual: ComponentKind,
    },

    #[error("{0}")]
    AttributeAccess(String),

    #[error("Elements must have type '{expected}' or descendant type, not '{actual}'")]
    InvalidElementType { expected: String, actual: String },

    #[error("Index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Class {0} does not support attributes serialization")]
    UnsupportedSerialization(String),

    #[error("Invalid {kind} '{}': {message}", display_path(.path))]
    InvalidComponent {
        kind: ComponentKind,
        path: Vec<String>,
        message: String,
    },

    #[error("Field '{0}' is not supported: does not support field")]
    UnknownField(String),

    #[error("Use item[{0:?}] = value to set field value")]
    FieldSetter(String),

    #[error("Use item[{0:?}] to get field value")]
    FieldGetter(String),

    #[error("{0}")]
    InvalidFeedItem(String),

    #[error("Invalid feed item components: {0}")]
    InvalidFeedItemComponents(#[source] Box<FeedError>),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("{0}")]
    InvalidExporter(String),

    #[error("Exporter state error: {0}")]
    InvalidState(String),

    #[error("Cannot open output {path}: {reason}")]
    OutputUnavailable { path: String, reason: String },

    #[error("XML writer error: {0}")]
    Xml(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

/// Renders a component name path the way it is written in code:
/// `channel.image.url`, `category[1].value`.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    let mut out = String::new();
    for part in path {
        if !out.is_empty() && !part.starts_with('[') {
            out.push('.');
        }
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_dotted_with_indices() {
        let path = vec![
            "channel".to_string(),
            "category".to_string(),
            "[1]".to_string(),
            "value".to_string(),
        ];
        assert_eq!(display_path(&path), "channel.category[1].value");
        assert_eq!(display_path(&[]), "<root>");
    }

    #[test]
    fn invalid_component_message_carries_path() {
        let error = FeedError::InvalidComponent {
            kind: ComponentKind::Attribute,
            path: vec!["enclosure".to_string(), "url".to_string()],
            message: "missing required attribute".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid attribute 'enclosure.url': missing required attribute"
        );
    }
}
