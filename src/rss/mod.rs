//! Predefined RSS 2.0 element classes.
//!
//! Every element keeps its text in a content attribute named `value`, so a
//! scalar can be assigned to any of them directly:
//!
//! ```
//! use scrapy_rss::rss::RSS_ITEM;
//!
//! let mut item = RSS_ITEM.instance();
//! item.set("title", "Title").unwrap();
//! item.set("pubDate", chrono::Utc::now()).unwrap();
//! assert!(item.validate(&[]).is_ok());
//! ```

use std::sync::Arc;

use crate::meta::{ElementAttribute, ElementBuilder, ElementSchema};

pub mod channel;
pub mod channel_elements;
pub mod item_elements;
pub mod items;

pub use channel::{CHANNEL_ELEMENT, CloudConfig, ImageConfig, TextInputConfig};
pub use item_elements::*;
pub use items::{RSS_ITEM, RSSED_ITEM, new_rssed_item};

/// Name of the content attribute of predefined elements.
pub const CONTENT: &str = "value";

/// Builds a predefined schema. Definitions in this module are static and
/// well-formed, so a failure is a programming error.
pub(crate) fn predefined(builder: ElementBuilder) -> Arc<ElementSchema> {
    match builder.build() {
        Ok(schema) => schema,
        Err(e) => panic!("invalid predefined RSS element: {}", e),
    }
}

/// Element with a single content attribute.
pub(crate) fn content_element(class_name: &str, required: bool) -> Arc<ElementSchema> {
    predefined(
        ElementSchema::builder(class_name)
            .attribute(CONTENT, ElementAttribute::new().required(required).content(true)),
    )
}
