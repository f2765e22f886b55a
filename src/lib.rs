#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Scrapy RSS for Rust

 Declarative, namespace-aware RSS 2.0 records and a streaming feed exporter
 for scraping pipelines. Scraped records declare their RSS sub-documents as
 typed trees of elements and attributes; the exporter writes them into a
 valid RSS 2.0 feed one record at a time, without buffering the feed.

 ## Core Concepts

- **ElementSchema:** The static description of an element class: its attributes, its children and its validators. Schemas are built once with `ElementSchema::builder` and can extend each other.
- **Element:** An instance of a schema. Every instance owns its components; nothing is shared with the schema or with other instances.
- **ElementAttribute:** A scalar leaf of an element, rendered either as an XML attribute or as the element's text content.
- **MultipleElements:** A repeated child: an ordered list of sibling elements of one class.
- **FeedItem:** A scraped record combining free-form fields with element components.
- **FeedItemExporter:** The streaming writer of the RSS document. It implements `ItemWriter<FeedItem>`.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| pipeline      | Enables `FeedExportPipeline`, configured from crawl settings  |
| full          | Enables all available features                                |

 ## Getting Started

```rust
use scrapy_rss::{
    core::item::ItemWriter,
    error::FeedError,
    item::xml::FeedItemExporterBuilder,
    meta::{ElementSchema, FeedItem, Input},
    rss::{RSS_ITEM, TITLE_ELEMENT},
};
use std::io::Cursor;

fn main() -> Result<(), FeedError> {
    let schema = ElementSchema::builder("BookItem")
        .extends(&RSS_ITEM)
        .child(
            "dc__creator",
            TITLE_ELEMENT.instance().with_namespace(None, "http://purl.org/dc/elements/1.1/")?,
        )
        .field("isbn")
        .build()?;

    let mut item = FeedItem::new(&schema);
    item.set("title", "The Rust Programming Language")?;
    item.set("dc__creator", "Steve Klabnik")?;
    item.set("guid", Input::map([("isPermaLink", Input::from(false)), ("value", Input::from("978-1718503106"))]))?;
    item.set_field("isbn", "978-1718503106")?;

    let writer = FeedItemExporterBuilder::new()
        .title("Books")
        .link("http://example.com/books")
        .description("New books")
        .item_schema(&schema)
        .from_writer(Cursor::new(Vec::new()))?;

    writer.open()?;
    writer.write(&[item])?;
    writer.close()?;

    let xml = String::from_utf8(writer.into_inner()?.into_inner()).unwrap();
    assert!(xml.contains("<dc:creator>Steve Klabnik</dc:creator>"));
    assert!(xml.contains("<guid isPermaLink=\"false\">978-1718503106</guid>"));
    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Item writer lifecycle
pub mod core;

/// Error types of the element model and the exporter
pub mod error;

#[doc(inline)]
pub use error::*;

/// Feed writers and the export pipeline
pub mod item;

/// Element, attribute and item model
pub mod meta;

/// Predefined RSS 2.0 elements, channel and item
pub mod rss;

/// Formatting helpers
pub mod utils;
