mod common;

use std::io::{self, ErrorKind};

use common::MockFile;
use scrapy_rss::{
    core::item::ItemWriter,
    error::FeedError,
    item::xml::FeedItemExporterBuilder,
    meta::FeedItem,
    rss::RSS_ITEM,
};

fn failing_file() -> MockFile {
    let mut file = MockFile::default();
    file.expect_write()
        .returning(|_| Err(io::Error::from(ErrorKind::PermissionDenied)));
    file.expect_flush().returning(|| Ok(()));
    file
}

#[test]
fn write_failure_surfaces_when_feed_is_flushed() {
    let writer = FeedItemExporterBuilder::new()
        .title("Title")
        .link("http://example.com/feed")
        .description("Description")
        .from_writer(failing_file())
        .unwrap();

    let mut item = FeedItem::new(&RSS_ITEM);
    item.set("title", "buffered").unwrap();

    writer.open().unwrap();
    writer.write(&[item]).unwrap();
    let err = writer.close().unwrap_err();

    match err {
        FeedError::Xml(message) => assert!(message.starts_with("Failed to flush RSS stream")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn into_inner_reports_unflushed_data() {
    let writer = FeedItemExporterBuilder::new()
        .title("Title")
        .link("http://example.com/feed")
        .description("Description")
        .from_writer(failing_file())
        .unwrap();

    writer.open().unwrap();

    assert!(matches!(writer.into_inner(), Err(FeedError::Xml(_))));
}

#[test]
fn invalid_channel_email_is_rejected_before_writing() {
    let err = FeedItemExporterBuilder::new()
        .title("Title")
        .link("http://example.com/feed")
        .description("Description")
        .managing_editor("Editor")
        .from_writer(MockFile::default())
        .err()
        .unwrap();

    assert_eq!(
        err.to_string(),
        "Invalid channel: managing_editor must contain at least e-mail, passed: Editor"
    );
}
