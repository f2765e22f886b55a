/// Streaming RSS 2.0 writer.
///
/// The exporter writes the channel description once, then every item as it
/// arrives, without keeping exported items in memory. The implementation uses
/// `quick-xml` for serialization.
///
/// # Examples
///
/// ```
/// use scrapy_rss::core::item::ItemWriter;
/// use scrapy_rss::item::xml::FeedItemExporterBuilder;
/// use scrapy_rss::meta::FeedItem;
/// use scrapy_rss::rss::RSS_ITEM;
/// use serde_json::json;
/// use std::io::Cursor;
///
/// let items = vec![
///     FeedItem::from_json(&RSS_ITEM, json!({
///         "title": "Wireless Headphones",
///         "link": "http://example.com/P001",
///         "guid": {"isPermaLink": false, "value": "P001"},
///     }))
///     .unwrap(),
///     FeedItem::from_json(&RSS_ITEM, json!({"description": "USB-C Cable"})).unwrap(),
/// ];
///
/// let writer = FeedItemExporterBuilder::new()
///     .title("Catalog")
///     .link("http://example.com/")
///     .description("New products")
///     .from_writer(Cursor::new(Vec::new()))
///     .unwrap();
///
/// writer.open().unwrap();
/// writer.write(&items).unwrap();
/// writer.close().unwrap();
///
/// let xml = String::from_utf8(writer.into_inner().unwrap().into_inner()).unwrap();
/// assert!(xml.contains("<guid isPermaLink=\"false\">P001</guid>"));
/// assert!(xml.ends_with("</channel></rss>"));
/// ```
pub mod feed_exporter;

mod scope;

pub use feed_exporter::{FeedItemExporter, FeedItemExporterBuilder};

#[allow(deprecated)]
pub use feed_exporter::RssItemExporter;
