use std::sync::{Arc, LazyLock};

use crate::error::{ComponentKind, FeedError};
use crate::meta::{Element, ElementAttribute, ElementSchema, MultipleElements, serialize_rfc822};
use crate::rss::{CONTENT, content_element, predefined};

pub static LANGUAGE_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("LanguageElement", true));

pub static COPYRIGHT_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("CopyrightElement", true));

/// E-mail address of the person responsible for editorial content.
pub static MANAGING_EDITOR_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("ManagingEditorElement")
            .attribute(CONTENT, ElementAttribute::new().required(true).content(true))
            .validator(require_email),
    )
});

/// E-mail address of the person responsible for technical issues.
pub static WEB_MASTER_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("WebMasterElement")
            .attribute(CONTENT, ElementAttribute::new().required(true).content(true))
            .validator(require_email),
    )
});

pub static LAST_BUILD_DATE_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("LastBuildDateElement").attribute(
            CONTENT,
            ElementAttribute::new()
                .required(true)
                .content(true)
                .serializer(serialize_rfc822),
        ),
    )
});

pub static GENERATOR_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("GeneratorElement", true));

pub static DOCS_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("DocsElement", true));

/// Publish-subscribe registration: `<cloud domain port path registerProcedure protocol/>`.
pub static CLOUD_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("CloudElement")
            .attribute("domain", ElementAttribute::new().required(true))
            .attribute("port", ElementAttribute::new().required(true))
            .attribute("path", ElementAttribute::new().required(true))
            .attribute("registerProcedure", ElementAttribute::new().required(true))
            .attribute("protocol", ElementAttribute::new().required(true)),
    )
});

pub static TTL_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("TtlElement", true));

pub static IMAGE_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("ImageElement")
            .child(
                "url",
                content_element("ImageUrlElement", true).instance().with_required(true),
            )
            .child(
                "title",
                content_element("ImageTitleElement", true).instance().with_required(true),
            )
            .child(
                "link",
                content_element("ImageLinkElement", true).instance().with_required(true),
            )
            .child("width", content_element("ImageWidthElement", false).instance())
            .child("height", content_element("ImageHeightElement", false).instance())
            .child(
                "description",
                content_element("ImageDescriptionElement", false).instance(),
            ),
    )
});

pub static RATING_ELEMENT: LazyLock<Arc<ElementSchema>> =
    LazyLock::new(|| content_element("RatingElement", true));

pub static TEXT_INPUT_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    let mut builder = ElementSchema::builder("TextInputElement");
    for (name, class_name) in [
        ("title", "TextInputTitleElement"),
        ("description", "TextInputDescriptionElement"),
        ("name", "TextInputNameElement"),
        ("link", "TextInputLinkElement"),
    ] {
        builder = builder.child(name, content_element(class_name, true).instance().with_required(true));
    }
    predefined(builder)
});

/// Up to 24 `<hour>` children, 0 to 23 GMT.
pub static SKIP_HOURS_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(ElementSchema::builder("SkipHoursElement").child(
        "hour",
        MultipleElements::new(&content_element("SkipHoursHourElement", true)),
    ))
});

/// Up to seven `<day>` children, `Monday` to `Sunday`.
pub static SKIP_DAYS_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(ElementSchema::builder("SkipDaysElement").child(
        "day",
        MultipleElements::new(&content_element("SkipDaysDayElement", true)),
    ))
});

fn require_email(element: &Element, path: &[String]) -> Result<(), FeedError> {
    match element.content() {
        Some(value) if !value.to_string().contains('@') => Err(FeedError::InvalidComponent {
            kind: ComponentKind::Element,
            path: path.to_vec(),
            message: format!("must contain at least e-mail, passed: {}", value),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_must_contain_email() {
        let editor = Element::from_input(&MANAGING_EDITOR_ELEMENT, "John Doe").unwrap();
        let err = editor.validate(&["managingEditor".to_string()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid element 'managingEditor': must contain at least e-mail, passed: John Doe"
        );

        let editor = Element::from_input(&WEB_MASTER_ELEMENT, "john@example.com (John Doe)").unwrap();
        assert!(editor.validate(&[]).is_ok());
        assert!(WEB_MASTER_ELEMENT.instance().validate(&[]).is_ok());
    }

    #[test]
    fn image_requires_url_title_and_link() {
        let mut image = IMAGE_ELEMENT.instance();
        image.set("url", "http://example.com/logo.png").unwrap();
        let err = image.validate(&["image".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid element 'image.title': missing required element");
        image.set("title", "Logo").unwrap();
        image.set("link", "http://example.com/").unwrap();
        image.set("width", 88).unwrap();
        assert!(image.validate(&[]).is_ok());
    }

    #[test]
    fn skip_hours_take_a_list() {
        let mut skip = SKIP_HOURS_ELEMENT.instance();
        skip.set("hour", vec![0, 1, 23]).unwrap();
        assert_eq!(skip.multiple("hour").unwrap().len(), 3);

        let skip = Element::from_input(&SKIP_DAYS_ELEMENT, "Sunday").unwrap();
        assert_eq!(skip.multiple("day").unwrap()[0].content().unwrap(), "Sunday");
    }
}
