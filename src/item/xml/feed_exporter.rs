use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use log::{debug, info, warn};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::error::FeedError;
use crate::item::xml::scope::{DeclarationPlan, NamespaceScope};
use crate::meta::{Component, Element, ElementSchema, FeedItem, Input, Namespace, NamespaceSet};
use crate::rss::channel::fill_image_defaults;
use crate::rss::{CHANNEL_ELEMENT, CloudConfig, ImageConfig, RSS_ITEM, TextInputConfig};

const RSS_VERSION: &str = "2.0";

#[derive(Debug)]
enum ExportState {
    Created,
    Exporting { channel_scope: NamespaceScope },
    Finished,
}

/// Streams items into an RSS 2.0 document.
///
/// The document is written in three steps: [`start_exporting`](Self::start_exporting)
/// writes the XML declaration, `<rss>` and the channel description,
/// [`export_item`](Self::export_item) writes one `<item>` per call and
/// [`finish_exporting`](Self::finish_exporting) closes the document. Each item is
/// validated as a whole before its first byte is written.
///
/// Namespaces are declared on the element that first needs them. Namespaces of
/// the configuration and of the item class are declared once on `<rss>`.
///
/// # Examples
///
/// ```
/// use scrapy_rss::item::xml::FeedItemExporterBuilder;
/// use scrapy_rss::meta::FeedItem;
/// use scrapy_rss::rss::RSS_ITEM;
/// use std::io::Cursor;
///
/// let exporter = FeedItemExporterBuilder::new()
///     .title("Feed")
///     .link("http://example.com/")
///     .description("Latest news")
///     .from_writer(Cursor::new(Vec::new()))
///     .unwrap();
///
/// let mut item = FeedItem::new(&RSS_ITEM);
/// item.set("title", "First").unwrap();
/// item.set("category", vec!["news", "tech"]).unwrap();
///
/// exporter.start_exporting().unwrap();
/// exporter.export_item(&item).unwrap();
/// exporter.finish_exporting().unwrap();
///
/// let xml = String::from_utf8(exporter.into_inner().unwrap().into_inner()).unwrap();
/// assert!(xml.contains("<item><title>First</title><category>news</category><category>tech</category></item>"));
/// ```
pub struct FeedItemExporter<W: Write = File> {
    writer: RefCell<Writer<BufWriter<W>>>,
    channel: Element,
    item_schema: Arc<ElementSchema>,
    namespaces: Vec<Namespace>,
    state: RefCell<ExportState>,
}

/// Former name of [`FeedItemExporter`].
#[deprecated(note = "Use FeedItemExporter instead")]
pub type RssItemExporter<W = File> = FeedItemExporter<W>;

impl<W: Write> FeedItemExporter<W> {
    /// Writes the XML declaration, the `<rss>` start tag and the channel elements.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidState`] if called twice, [`FeedError::Xml`] on write failure.
    pub fn start_exporting(&self) -> Result<(), FeedError> {
        let mut state = self.state.borrow_mut();
        if !matches!(*state, ExportState::Created) {
            return Err(FeedError::InvalidState(
                "exporting has already been started".to_string(),
            ));
        }
        let mut guard = self.writer.borrow_mut();
        let writer = &mut *guard;

        write_event(
            writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
            "XML declaration",
        )?;

        let rss_scope = NamespaceScope::root(self.namespaces.clone());
        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", RSS_VERSION));
        push_declarations(&mut rss, rss_scope.declared());
        write_event(writer, Event::Start(rss), "<rss>")?;

        let (_, channel_scope) = open_element(writer, &self.channel, "channel", &rss_scope, true)?;
        write_children(writer, &self.channel, &channel_scope, true)?;

        info!("Started RSS feed export");
        *state = ExportState::Exporting { channel_scope };
        Ok(())
    }

    /// Writes one `<item>`.
    ///
    /// The item must be of the configured item class, or carry an attached RSS
    /// item of that class.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidState`] outside of `start_exporting`/`finish_exporting`
    /// - [`FeedError::InvalidFeedItem`] for an item of another class
    /// - [`FeedError::InvalidFeedItemComponents`] when validation fails; nothing is written
    /// - [`FeedError::Xml`] on write failure
    pub fn export_item(&self, item: &FeedItem) -> Result<(), FeedError> {
        let state = self.state.borrow();
        let ExportState::Exporting { channel_scope } = &*state else {
            return Err(FeedError::InvalidState(
                "items can only be exported between start and finish".to_string(),
            ));
        };
        let item = self.resolve_item(item)?;
        item.validate()
            .map_err(|e| FeedError::InvalidFeedItemComponents(Box::new(e)))?;

        let mut guard = self.writer.borrow_mut();
        let writer = &mut *guard;
        let (qname, item_scope) = open_element(writer, item.element(), "item", channel_scope, false)?;
        write_children(writer, item.element(), &item_scope, false)?;
        write_event(writer, Event::End(BytesEnd::new(qname.as_str())), "</item>")?;
        debug!("Exported item of class {}", item.class_name());
        Ok(())
    }

    /// Closes `<channel>` and `<rss>` and flushes the stream.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidState`] unless exporting was started and not finished yet.
    pub fn finish_exporting(&self) -> Result<(), FeedError> {
        let mut state = self.state.borrow_mut();
        if !matches!(*state, ExportState::Exporting { .. }) {
            return Err(FeedError::InvalidState(
                "exporting has not been started or is already finished".to_string(),
            ));
        }
        {
            let mut guard = self.writer.borrow_mut();
            let writer = &mut *guard;
            write_event(writer, Event::End(BytesEnd::new("channel")), "</channel>")?;
            write_event(writer, Event::End(BytesEnd::new("rss")), "</rss>")?;
        }
        *state = ExportState::Finished;
        info!("Finished RSS feed export");
        self.flush_stream()
    }

    /// Channel description written by `start_exporting`.
    pub fn channel(&self) -> &Element {
        &self.channel
    }

    /// Namespaces declared on `<rss>`.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn item_schema(&self) -> &Arc<ElementSchema> {
        &self.item_schema
    }

    /// Flushes and returns the underlying stream.
    ///
    /// # Errors
    ///
    /// [`FeedError::Xml`] when the buffered data cannot be written.
    pub fn into_inner(self) -> Result<W, FeedError> {
        self.writer
            .into_inner()
            .into_inner()
            .into_inner()
            .map_err(|e| FeedError::Xml(format!("Failed to flush RSS stream: {}", e.error())))
    }

    fn flush_stream(&self) -> Result<(), FeedError> {
        self.writer
            .borrow_mut()
            .get_mut()
            .flush()
            .map_err(|e| FeedError::Xml(format!("Failed to flush RSS stream: {}", e)))
    }

    fn resolve_item<'i>(&self, item: &'i FeedItem) -> Result<&'i FeedItem, FeedError> {
        if item.schema().is_subclass_of(&self.item_schema) {
            return Ok(item);
        }
        match item.rss() {
            Some(rss) if rss.schema().is_subclass_of(&self.item_schema) => Ok(rss),
            _ => Err(FeedError::InvalidFeedItem(format!(
                "Item must have 'rss' field of type '{}' or be an instance of it, got '{}'",
                self.item_schema.class_name(),
                item.class_name()
            ))),
        }
    }
}

impl<W: Write> ItemWriter<FeedItem> for FeedItemExporter<W> {
    fn write(&self, items: &[FeedItem]) -> ItemWriterResult {
        for item in items {
            self.export_item(item)?;
        }
        Ok(())
    }

    fn flush(&self) -> ItemWriterResult {
        self.flush_stream()
    }

    fn open(&self) -> ItemWriterResult {
        self.start_exporting()
    }

    fn close(&self) -> ItemWriterResult {
        self.finish_exporting()
    }
}

fn write_event<'e, W: Write>(
    writer: &mut Writer<W>,
    event: Event<'e>,
    what: &str,
) -> Result<(), FeedError> {
    writer
        .write_event(event)
        .map_err(|e| FeedError::Xml(format!("Failed to write {}: {}", what, e)))
}

fn push_declarations(start: &mut BytesStart<'_>, declarations: &[Namespace]) {
    for ns in declarations {
        if ns.prefix().is_empty() {
            start.push_attribute(("xmlns", ns.uri()));
        } else {
            let name = format!("xmlns:{}", ns.prefix());
            start.push_attribute((name.as_str(), ns.uri()));
        }
    }
}

/// Writes the start tag and text content of an element. Returns the qualified
/// name for the end tag and the scope of the children.
fn open_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    local_name: &str,
    scope: &NamespaceScope,
    attrs_only: bool,
) -> Result<(String, NamespaceScope), FeedError> {
    let mut plan = DeclarationPlan::new(scope);
    let qname = plan.element_name(element.namespace(), local_name);
    let attrs: Vec<(String, String)> = element
        .serialize_attrs()
        .into_iter()
        .map(|(name, value)| (plan.attribute_name(name.namespace(), name.local_name()), value))
        .collect();
    if !attrs_only {
        let mut descendants = NamespaceSet::new();
        for (_, child) in element.children() {
            if child.assigned() {
                descendants.extend(child.get_namespaces(true));
            }
        }
        plan.hoist(&descendants);
    }
    let child_scope = scope.child(plan.into_declarations());

    let mut start = BytesStart::new(qname.as_str());
    push_declarations(&mut start, child_scope.declared());
    for (name, value) in &attrs {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    write_event(writer, Event::Start(start), "start tag")?;

    if let Some(content) = element.serialize_content() {
        if !content.is_empty() {
            write_event(writer, Event::Text(BytesText::new(&content)), "text content")?;
        }
    }
    Ok((qname, child_scope))
}

/// Writes every assigned child of `element`, depth-first in declaration order.
fn write_children<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    scope: &NamespaceScope,
    attrs_only: bool,
) -> Result<(), FeedError> {
    for (name, child) in element.children() {
        if !child.assigned() {
            continue;
        }
        match child {
            Component::Element(child) => write_element(writer, child, name.local_name(), scope, attrs_only)?,
            Component::Multiple(multiple) => {
                for member in multiple {
                    write_element(writer, member, name.local_name(), scope, attrs_only)?;
                }
            }
        }
    }
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    local_name: &str,
    scope: &NamespaceScope,
    attrs_only: bool,
) -> Result<(), FeedError> {
    let (qname, child_scope) = open_element(writer, element, local_name, scope, attrs_only)?;
    write_children(writer, element, &child_scope, attrs_only)?;
    write_event(writer, Event::End(BytesEnd::new(qname.as_str())), "end tag")
}

/// Builder for [`FeedItemExporter`].
///
/// Title, link and description of the channel are mandatory; every other
/// RSS 2.0 channel element is optional.
///
/// # Examples
///
/// ```
/// use scrapy_rss::item::xml::FeedItemExporterBuilder;
/// use std::io::Cursor;
///
/// let exporter = FeedItemExporterBuilder::new()
///     .title("Feed")
///     .link("http://example.com/")
///     .description("")
///     .language("en-us")
///     .managing_editor("editor@example.com (Editor)")
///     .categories(["news", "tech"])
///     .ttl(60)
///     .namespace("dc", "http://purl.org/dc/elements/1.1/")
///     .from_writer(Cursor::new(Vec::new()))
///     .unwrap();
/// assert_eq!(exporter.namespaces().len(), 1);
///
/// let missing = FeedItemExporterBuilder::new()
///     .title("Feed")
///     .from_writer(Cursor::new(Vec::new()));
/// assert!(missing.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeedItemExporterBuilder {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    language: Option<String>,
    copyright: Option<String>,
    managing_editor: Option<String>,
    webmaster: Option<String>,
    pubdate: Option<DateTime<FixedOffset>>,
    last_build_date: Option<DateTime<FixedOffset>>,
    categories: Vec<String>,
    generator: Option<String>,
    docs: Option<String>,
    cloud: Option<CloudConfig>,
    ttl: Option<u32>,
    image: Option<ImageConfig>,
    rating: Option<String>,
    text_input: Option<TextInputConfig>,
    skip_hours: Vec<u8>,
    skip_days: Vec<String>,
    namespaces: Vec<(String, String)>,
    item_schema: Option<Arc<ElementSchema>>,
}

impl FeedItemExporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the channel.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// URL of the website the channel corresponds to.
    pub fn link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    /// Description of the channel. An empty description is allowed.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn copyright(mut self, copyright: &str) -> Self {
        self.copyright = Some(copyright.to_string());
        self
    }

    /// E-mail of the editor, optionally followed by a name.
    pub fn managing_editor(mut self, managing_editor: &str) -> Self {
        self.managing_editor = Some(managing_editor.to_string());
        self
    }

    /// E-mail of the webmaster, optionally followed by a name.
    pub fn webmaster(mut self, webmaster: &str) -> Self {
        self.webmaster = Some(webmaster.to_string());
        self
    }

    pub fn pubdate(mut self, pubdate: DateTime<FixedOffset>) -> Self {
        self.pubdate = Some(pubdate);
        self
    }

    /// Defaults to the time the exporter is built.
    pub fn last_build_date(mut self, last_build_date: DateTime<FixedOffset>) -> Self {
        self.last_build_date = Some(last_build_date);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    /// Defaults to the name and version of this crate.
    pub fn generator(mut self, generator: &str) -> Self {
        self.generator = Some(generator.to_string());
        self
    }

    pub fn docs(mut self, docs: &str) -> Self {
        self.docs = Some(docs.to_string());
        self
    }

    pub fn cloud(mut self, cloud: CloudConfig) -> Self {
        self.cloud = Some(cloud);
        self
    }

    /// Minutes the channel can be cached.
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn image(mut self, image: ImageConfig) -> Self {
        self.image = Some(image);
        self
    }

    pub fn rating(mut self, rating: &str) -> Self {
        self.rating = Some(rating.to_string());
        self
    }

    pub fn text_input(mut self, text_input: TextInputConfig) -> Self {
        self.text_input = Some(text_input);
        self
    }

    pub fn skip_hours(mut self, hours: impl IntoIterator<Item = u8>) -> Self {
        self.skip_hours.extend(hours);
        self
    }

    pub fn skip_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_days.extend(days.into_iter().map(Into::into));
        self
    }

    /// Adds a namespace declared on `<rss>`.
    pub fn namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.push((prefix.to_string(), uri.to_string()));
        self
    }

    pub fn namespaces<I, P, U>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        self.namespaces
            .extend(namespaces.into_iter().map(|(p, u)| (p.into(), u.into())));
        self
    }

    /// Class of exported items, [`RSS_ITEM`] by default.
    pub fn item_schema(mut self, schema: &Arc<ElementSchema>) -> Self {
        self.item_schema = Some(Arc::clone(schema));
        self
    }

    /// Builds an exporter writing to `wtr`. Nothing is written until
    /// `start_exporting`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::NotConfigured`] naming every missing mandatory channel setting
    /// - [`FeedError::InvalidChannel`] for an invalid channel element
    pub fn from_writer<W: Write>(self, wtr: W) -> Result<FeedItemExporter<W>, FeedError> {
        let item_schema = self
            .item_schema
            .clone()
            .unwrap_or_else(|| Arc::clone(&RSS_ITEM));
        let channel = self.build_channel()?;
        let namespaces = self.resolve_namespaces(&item_schema)?;

        Ok(FeedItemExporter {
            writer: RefCell::new(Writer::new(BufWriter::new(wtr))),
            channel,
            item_schema,
            namespaces,
            state: RefCell::new(ExportState::Created),
        })
    }

    /// Builds an exporter writing to a new file at `path`.
    ///
    /// # Errors
    ///
    /// [`FeedError::OutputUnavailable`] when the file cannot be created, and
    /// the errors of [`from_writer`](Self::from_writer).
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<FeedItemExporter<File>, FeedError> {
        let file = File::create(path.as_ref()).map_err(|e| FeedError::OutputUnavailable {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        self.from_writer(file)
    }

    fn build_channel(&self) -> Result<Element, FeedError> {
        let missing: Vec<&str> = [
            ("title", self.title.is_none()),
            ("link", self.link.is_none()),
            ("description", self.description.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(FeedError::NotConfigured(format!(
                "channel {} must be set",
                missing.join(", ")
            )));
        }
        for (name, email) in [
            ("managing_editor", &self.managing_editor),
            ("webmaster", &self.webmaster),
        ] {
            if let Some(email) = email {
                if !email.contains('@') {
                    return Err(FeedError::InvalidChannel(format!(
                        "{} must contain at least e-mail, passed: {}",
                        name, email
                    )));
                }
            }
        }

        let generator = self
            .generator
            .clone()
            .unwrap_or_else(|| format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        let last_build_date = self
            .last_build_date
            .unwrap_or_else(|| Local::now().fixed_offset());

        let mut channel = CHANNEL_ELEMENT.instance().with_required(true);
        let components = [
            ("title", Input::from(self.title.as_ref())),
            ("link", Input::from(self.link.as_ref())),
            ("description", Input::from(self.description.as_ref())),
            ("language", Input::from(self.language.as_ref())),
            ("copyright", Input::from(self.copyright.as_ref())),
            ("managingEditor", Input::from(self.managing_editor.as_ref())),
            ("webMaster", Input::from(self.webmaster.as_ref())),
            ("pubDate", Input::from(self.pubdate)),
            ("lastBuildDate", Input::from(last_build_date)),
            ("category", Input::from(self.categories.clone())),
            ("generator", Input::from(generator)),
            ("docs", Input::from(self.docs.as_ref())),
            ("cloud", self.cloud.as_ref().map_or(Input::None, CloudConfig::to_input)),
            ("ttl", Input::from(self.ttl)),
            ("image", self.image.as_ref().map_or(Input::None, ImageConfig::to_input)),
            ("rating", Input::from(self.rating.as_ref())),
            (
                "textInput",
                self.text_input
                    .as_ref()
                    .map_or(Input::None, TextInputConfig::to_input),
            ),
        ];
        for (name, value) in components {
            if !value.is_none() {
                channel.set(name, value)?;
            }
        }
        if !self.skip_hours.is_empty() {
            channel.set("skipHours", Input::map([("hour", self.skip_hours.clone())]))?;
        }
        if !self.skip_days.is_empty() {
            channel.set("skipDays", Input::map([("day", self.skip_days.clone())]))?;
        }
        fill_image_defaults(&mut channel)?;

        channel
            .validate(&["channel".to_string()])
            .map_err(|e| FeedError::InvalidChannel(e.to_string()))?;
        Ok(channel)
    }

    // namespaces of the configuration and of the item class go on <rss>,
    // except default namespaces and prefixes bound to several URIs
    fn resolve_namespaces(&self, item_schema: &Arc<ElementSchema>) -> Result<Vec<Namespace>, FeedError> {
        let mut candidates = NamespaceSet::new();
        for (prefix, uri) in &self.namespaces {
            candidates.insert(Namespace::new(Some(prefix.as_str()), Some(uri.as_str()))?);
        }
        candidates.extend(item_schema.instance().get_namespaces(false, false));

        let mut by_prefix: BTreeMap<&str, Vec<&Namespace>> = BTreeMap::new();
        for ns in &candidates {
            by_prefix.entry(ns.prefix()).or_default().push(ns);
        }
        let mut namespaces = Vec::new();
        for (prefix, group) in by_prefix {
            if prefix.is_empty() {
                debug!("Default namespaces are declared on the elements that use them");
                continue;
            }
            if group.len() > 1 {
                warn!(
                    "Prefix {} is bound to several namespaces, declaring it on elements instead",
                    prefix
                );
                continue;
            }
            namespaces.extend(group.into_iter().cloned());
        }
        Ok(namespaces)
    }
}
