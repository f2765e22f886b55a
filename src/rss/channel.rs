use std::sync::{Arc, LazyLock};

use serde::Deserialize;

use crate::error::FeedError;
use crate::meta::{Element, ElementSchema, Input, MultipleElements};
use crate::rss::channel_elements::*;
use crate::rss::item_elements::{
    CATEGORY_ELEMENT, DESCRIPTION_ELEMENT, LINK_ELEMENT, PUB_DATE_ELEMENT, TITLE_ELEMENT,
};
use crate::rss::predefined;

/// The `<channel>` element. Title, link and description are required.
pub static CHANNEL_ELEMENT: LazyLock<Arc<ElementSchema>> = LazyLock::new(|| {
    predefined(
        ElementSchema::builder("ChannelElement")
            .child("title", TITLE_ELEMENT.instance().with_required(true))
            .child("link", LINK_ELEMENT.instance().with_required(true))
            .child("description", DESCRIPTION_ELEMENT.instance().with_required(true))
            .child("language", LANGUAGE_ELEMENT.instance())
            .child("copyright", COPYRIGHT_ELEMENT.instance())
            .child("managingEditor", MANAGING_EDITOR_ELEMENT.instance())
            .child("webMaster", WEB_MASTER_ELEMENT.instance())
            .child("pubDate", PUB_DATE_ELEMENT.instance())
            .child("lastBuildDate", LAST_BUILD_DATE_ELEMENT.instance())
            .child("category", MultipleElements::new(&CATEGORY_ELEMENT))
            .child("generator", GENERATOR_ELEMENT.instance())
            .child("docs", DOCS_ELEMENT.instance())
            .child("cloud", CLOUD_ELEMENT.instance())
            .child("ttl", TTL_ELEMENT.instance())
            .child("image", IMAGE_ELEMENT.instance())
            .child("rating", RATING_ELEMENT.instance())
            .child("textInput", TEXT_INPUT_ELEMENT.instance())
            .child("skipHours", SKIP_HOURS_ELEMENT.instance())
            .child("skipDays", SKIP_DAYS_ELEMENT.instance()),
    )
});

/// Settings of the channel `<cloud>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    pub domain: String,
    pub port: u16,
    pub path: String,
    pub register_procedure: String,
    pub protocol: String,
}

/// Settings of the channel `<image>` element. Title and link default to
/// the channel's own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageConfig {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Settings of the channel `<textInput>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextInputConfig {
    pub title: String,
    pub description: String,
    pub name: String,
    pub link: String,
}

impl CloudConfig {
    pub(crate) fn to_input(&self) -> Input {
        Input::map([
            ("domain", Input::from(&self.domain)),
            ("port", Input::from(self.port)),
            ("path", Input::from(&self.path)),
            ("registerProcedure", Input::from(&self.register_procedure)),
            ("protocol", Input::from(&self.protocol)),
        ])
    }
}

impl ImageConfig {
    pub(crate) fn to_input(&self) -> Input {
        Input::map([
            ("url", Input::from(&self.url)),
            ("title", Input::from(self.title.as_ref())),
            ("link", Input::from(self.link.as_ref())),
            ("width", Input::from(self.width)),
            ("height", Input::from(self.height)),
            ("description", Input::from(self.description.as_ref())),
        ])
    }
}

impl TextInputConfig {
    pub(crate) fn to_input(&self) -> Input {
        Input::map([
            ("title", Input::from(&self.title)),
            ("description", Input::from(&self.description)),
            ("name", Input::from(&self.name)),
            ("link", Input::from(&self.link)),
        ])
    }
}

/// Copies the channel title and link into an assigned image that lacks them.
pub(crate) fn fill_image_defaults(channel: &mut Element) -> Result<(), FeedError> {
    if !channel.child("image")?.assigned() {
        return Ok(());
    }
    for name in ["title", "link"] {
        let fallback = channel.child(name)?.content().cloned();
        let image = channel.child_mut("image")?;
        if image.child(name)?.content().is_none() {
            image.set(name, fallback)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_requires_title_link_and_description() {
        let mut channel = CHANNEL_ELEMENT.instance().with_required(true);
        let err = channel.validate(&["channel".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid element 'channel': missing required element");

        channel.set("title", "Feed").unwrap();
        let err = channel.validate(&["channel".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid element 'channel.link': missing required element");

        channel.set("link", "http://example.com/").unwrap();
        channel.set("description", "").unwrap();
        assert!(channel.validate(&[]).is_ok());
    }

    #[test]
    fn image_is_completed_from_channel() {
        let mut channel = CHANNEL_ELEMENT.instance();
        channel.set("title", "Feed").unwrap();
        channel.set("link", "http://example.com/").unwrap();
        let image = ImageConfig {
            url: "http://example.com/logo.png".to_string(),
            link: Some("http://example.com/about".to_string()),
            ..Default::default()
        };
        channel.set("image", image.to_input()).unwrap();
        fill_image_defaults(&mut channel).unwrap();

        let image = channel.child("image").unwrap();
        assert_eq!(image.child("title").unwrap().content().unwrap(), "Feed");
        assert_eq!(image.child("link").unwrap().content().unwrap(), "http://example.com/about");
        assert!(image.child("width").unwrap().content().is_none());
    }

    #[test]
    fn cloud_config_deserializes_camel_case() {
        let cloud: CloudConfig = serde_json::from_str(
            r#"{"domain": "rpc.sys.com", "port": 80, "path": "/RPC2",
                "registerProcedure": "pingMe", "protocol": "soap"}"#,
        )
        .unwrap();
        let mut channel = CHANNEL_ELEMENT.instance();
        channel.set("cloud", cloud.to_input()).unwrap();
        let cloud = channel.child("cloud").unwrap();
        assert_eq!(cloud.attr("registerProcedure").unwrap().unwrap(), "pingMe");
        assert!(cloud.validate(&[]).is_ok());
    }
}
