use std::sync::{Arc, LazyLock};

use crate::meta::{ElementAttribute, ElementSchema, serialize_lowercase, serialize_rfc822};
use crate::rss::{CONTENT, content_element, predefined};

pub static TITLE_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("TitleElement", true));

pub static LINK_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("LinkElement", true));

pub static DESCRIPTION_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("DescriptionElement", true));

pub static AUTHOR_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("AuthorElement", true));

/// `<category domain="...">value</category>`
pub static CATEGORY_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("CategoryElement")
            .attribute("domain", ElementAttribute::new())
            .attribute(CONTENT, ElementAttribute::new().required(true).content(true)),
    )
});

pub static COMMENTS_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("CommentsElement", true));

/// Media object attached to an item.
pub static ENCLOSURE_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("EnclosureElement")
            .attribute("url", ElementAttribute::new().required(true))
            .attribute("length", ElementAttribute::new().required(true))
            .attribute("type", ElementAttribute::new().required(true)),
    )
});

/// Unique identifier of an item. `isPermaLink` defaults to `true`.
pub static GUID_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("GuidElement")
            .attribute(
                "isPermaLink",
                ElementAttribute::new()
                    .with_value(true)
                    .serializer(serialize_lowercase),
            )
            .attribute(CONTENT, ElementAttribute::new().required(true).content(true)),
    )
});

pub static PUB_DATE_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("PubDateElement").attribute(
            CONTENT,
            ElementAttribute::new()
                .required(true)
                .content(true)
                .serializer(serialize_rfc822),
        ),
    )
});

/// The RSS channel an item came from.
pub static SOURCE_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("SourceElement")
            .attribute("url", ElementAttribute::new().required(true))
            .attribute("title", ElementAttribute::new().content(true)),
    )
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Element;

    #[test]
    fn guid_serializes_lowercase_flag() {
        let mut guid = Element::from_input(&GUID_ELEMENT, "http://example.com/1").unwrap();
        assert_eq!(guid.serialize_attrs()[0].1, "true");
        guid.set("isPermaLink", false).unwrap();
        assert_eq!(guid.serialize_attrs()[0].1, "false");
    }

    #[test]
    fn enclosure_requires_every_attribute() {
        let mut enclosure = ENCLOSURE_ELEMENT.instance();
        enclosure.set("url", "http://example.com/1.mp3").unwrap();
        enclosure.set("length", 0).unwrap();
        let err = enclosure.validate(&["enclosure".to_string()]).unwrap_err();
        assert!(err.to_string().contains("enclosure.type"));
        enclosure.set("type", "audio/mpeg").unwrap();
        assert!(enclosure.validate(&[]).is_ok());
    }

    #[test]
    fn source_has_url_and_title() {
        let source = ElementSchema::builder("Wrapper")
            .child("source", SOURCE_ELEMENT.instance())
            .build()
            .unwrap();
        let mut wrapper = source.instance();
        let err = wrapper.set("source", "Title only").unwrap_err();
        assert!(matches!(err, crate::error::FeedError::InvalidElementValue { .. }));
        wrapper
            .child_mut("source")
            .unwrap()
            .set("url", "http://example.com/feed.xml")
            .unwrap();
        assert!(wrapper.validate(&[]).is_ok());
    }
}
