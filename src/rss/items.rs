use std::sync::{Arc, LazyLock};

use crate::error::{ComponentKind, FeedError};
use crate::meta::{Element, ElementSchema, FeedItem, MultipleElements};
use crate::rss::item_elements::*;
use crate::rss::predefined;

/// RSS 2.0 `<item>`. An item needs at least a title or a description.
///
/// Extend it to add namespaced elements:
///
/// ```
/// use scrapy_rss::meta::ElementSchema;
/// use scrapy_rss::rss::{RSS_ITEM, TITLE_ELEMENT};
///
/// let schema = ElementSchema::builder("DcItem")
///     .extends(&RSS_ITEM)
///     .child(
///         "dc__creator",
///         TITLE_ELEMENT
///             .instance()
///             .with_namespace(None, "http://purl.org/dc/elements/1.1/")
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
///
/// let mut item = schema.instance();
/// item.set("dc__creator", "Jane").unwrap();
/// assert_eq!(item.child("dc__creator").unwrap().ns_prefix(), "dc");
/// ```
pub static RSS_ITEM: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("RssItem")
            .child("title", TITLE_ELEMENT.instance())
            .child("link", LINK_ELEMENT.instance())
            .child("description", DESCRIPTION_ELEMENT.instance())
            .child("author", AUTHOR_ELEMENT.instance())
            .child("category", MultipleElements::new(&CATEGORY_ELEMENT))
            .child("comments", COMMENTS_ELEMENT.instance())
            .child("enclosure", ENCLOSURE_ELEMENT.instance())
            .child("guid", GUID_ELEMENT.instance())
            .child("pubDate", PUB_DATE_ELEMENT.instance())
            .child("source", SOURCE_ELEMENT.instance())
            .validator(require_title_or_description),
    )
});

/// Feed item without components of its own whose instances carry an empty
/// attached [`RSS_ITEM`].
pub static RSSED_ITEM: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| predefined(ElementSchema::builder("RssedItem").rss_item(&RSS_ITEM)));

/// New [`RSSED_ITEM`] record.
pub fn new_rssed_item() -> FeedItem {
    FeedItem::new(&RSSED_ITEM)
}

fn require_title_or_description(item: &Element, path: &[String]) -> Result<(), FeedError> {
    let title = item.child("title")?.assigned();
    let description = item.child("description")?.assigned();
    if !title && !description {
        return Err(FeedError::InvalidComponent {
            kind: ComponentKind::Item,
            path: path.to_vec(),
            message: "one of title or description must be present".to_string(),
        });
    }
    Ok(())
}
