//! Declarative, namespace-aware XML element model.
//!
//! An [`ElementSchema`] declares the attributes and children of an element
//! class. [`Element`] instances hold the assigned values, [`MultipleElements`]
//! holds repeated siblings and [`FeedItem`] adds free-form fields on top of an
//! element tree.

pub mod attribute;
pub mod element;
pub mod item;
pub mod multiple;
pub mod nscomponent;
pub mod schema;
pub mod value;

pub use attribute::ElementAttribute;
pub use element::{Component, ComponentRef, Element};
pub use item::FeedItem;
pub use multiple::MultipleElements;
pub use nscomponent::{Namespace, NamespaceSet, NsComponentName};
pub use schema::{ElementBuilder, ElementSchema, Validator};
pub use value::{Input, Serializer, Value, serialize_default, serialize_lowercase, serialize_rfc822};
