//! Scraping pipeline stage exporting every record to an RSS file.
//!
//! The pipeline is configured with [`FeedSettings`], usually loaded from the
//! crawler settings in JSON form:
//!
//! ```json
//! {
//!     "FEED_FILE": "/tmp/feed.rss",
//!     "FEED_TITLE": "Feed",
//!     "FEED_LINK": "http://example.com/",
//!     "FEED_DESCRIPTION": "Latest records",
//!     "FEED_NAMESPACES": {"dc": "http://purl.org/dc/elements/1.1/"}
//! }
//! ```
//!
//! `FEED_ITEM_CLASS` (or its older name `FEED_ITEM_CLS`) and `FEED_EXPORTER`
//! select a registered item schema and exporter preset by name.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::sync::Arc;

use log::{debug, info};
use serde::Deserialize;

use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::error::FeedError;
use crate::item::xml::{FeedItemExporter, FeedItemExporterBuilder};
use crate::meta::{ElementSchema, FeedItem};
use crate::rss::RSS_ITEM;

const DEFAULT_ITEM_CLASS: &str = "RssItem";
const DEFAULT_EXPORTER: &str = "FeedItemExporter";

/// Customizes the exporter builder before the pipeline adds the channel
/// settings. Registered presets play the role of exporter subclasses.
pub type ExporterPreset = fn(FeedItemExporterBuilder) -> FeedItemExporterBuilder;

/// Feed settings of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedSettings {
    #[serde(rename = "FEED_FILE", default)]
    pub file: Option<String>,
    #[serde(rename = "FEED_TITLE", default)]
    pub title: Option<String>,
    #[serde(rename = "FEED_LINK", default)]
    pub link: Option<String>,
    /// May be empty, but must be present.
    #[serde(rename = "FEED_DESCRIPTION", default)]
    pub description: Option<String>,
    #[serde(rename = "FEED_ITEM_CLASS", alias = "FEED_ITEM_CLS", default)]
    pub item_class: Option<String>,
    #[serde(rename = "FEED_NAMESPACES", default)]
    pub namespaces: BTreeMap<String, String>,
    #[serde(rename = "FEED_EXPORTER", default)]
    pub exporter: Option<String>,
}

impl FeedSettings {
    /// Reads settings from a JSON object. Unrelated keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, FeedError> {
        serde_json::from_str(json).map_err(|e| FeedError::Settings(e.to_string()))
    }

    pub fn from_json_reader<R: Read>(rdr: R) -> Result<Self, FeedError> {
        serde_json::from_reader(rdr).map_err(|e| FeedError::Settings(e.to_string()))
    }

    fn missing(&self) -> Vec<&'static str> {
        let non_empty = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        let mut missing = Vec::new();
        if !non_empty(&self.file) {
            missing.push("FEED_FILE");
        }
        if !non_empty(&self.title) {
            missing.push("FEED_TITLE");
        }
        if !non_empty(&self.link) {
            missing.push("FEED_LINK");
        }
        if self.description.is_none() {
            missing.push("FEED_DESCRIPTION");
        }
        missing
    }
}

/// Pipeline stage writing every processed record to the feed file.
///
/// # Examples
///
/// ```
/// use scrapy_rss::item::pipeline::{FeedExportPipelineBuilder, FeedSettings};
/// use scrapy_rss::meta::FeedItem;
/// use scrapy_rss::rss::RSS_ITEM;
///
/// let dir = std::env::temp_dir().join("scrapy_rss_pipeline_doc.rss");
/// let settings = FeedSettings {
///     file: Some(dir.display().to_string()),
///     title: Some("Feed".to_string()),
///     link: Some("http://example.com/".to_string()),
///     description: Some(String::new()),
///     ..Default::default()
/// };
///
/// let pipeline = FeedExportPipelineBuilder::new().settings(settings).build();
/// pipeline.open().unwrap();
///
/// let mut item = FeedItem::new(&RSS_ITEM);
/// item.set("title", "First").unwrap();
/// let item = pipeline.process_item(item).unwrap();
/// assert_eq!(item.child("title").unwrap().content().unwrap(), "First");
///
/// pipeline.close().unwrap();
/// let xml = std::fs::read_to_string(&dir).unwrap();
/// assert!(xml.contains("<item><title>First</title></item>"));
/// ```
pub struct FeedExportPipeline {
    settings: FeedSettings,
    item_classes: BTreeMap<String, Arc<ElementSchema>>,
    exporters: BTreeMap<String, ExporterPreset>,
    exporter: RefCell<Option<FeedItemExporter<File>>>,
}

/// Former name of [`FeedExportPipeline`].
#[deprecated(note = "Use FeedExportPipeline instead")]
pub type RssExportPipeline = FeedExportPipeline;

impl FeedExportPipeline {
    /// Creates the feed file and writes the channel description.
    ///
    /// # Errors
    ///
    /// - [`FeedError::NotConfigured`] naming every missing setting, or for an
    ///   unknown item class
    /// - [`FeedError::InvalidExporter`] for an unknown exporter
    /// - [`FeedError::OutputUnavailable`] when the file cannot be created
    pub fn open(&self) -> Result<(), FeedError> {
        if self.exporter.borrow().is_some() {
            return Err(FeedError::InvalidState("pipeline is already open".to_string()));
        }
        let missing = self.settings.missing();
        if !missing.is_empty() {
            return Err(FeedError::NotConfigured(format!(
                "{} parameter does not exist",
                missing.join(", ")
            )));
        }

        let item_class = self
            .settings
            .item_class
            .as_deref()
            .unwrap_or(DEFAULT_ITEM_CLASS);
        let item_schema = self.item_classes.get(item_class).ok_or_else(|| {
            FeedError::NotConfigured(format!("FEED_ITEM_CLASS '{}' is not registered", item_class))
        })?;

        let exporter_name = self.settings.exporter.as_deref().unwrap_or(DEFAULT_EXPORTER);
        let preset = self.exporters.get(exporter_name).ok_or_else(|| {
            FeedError::InvalidExporter(format!(
                "FEED_EXPORTER must be FeedItemExporter or its preset, not '{}'",
                exporter_name
            ))
        })?;

        // presence checked above
        let file = self.settings.file.as_deref().unwrap_or_default();
        let builder = preset(FeedItemExporterBuilder::new())
            .title(self.settings.title.as_deref().unwrap_or_default())
            .link(self.settings.link.as_deref().unwrap_or_default())
            .description(self.settings.description.as_deref().unwrap_or_default())
            .namespaces(self.settings.namespaces.clone())
            .item_schema(item_schema);
        let exporter = builder.from_path(file)?;
        exporter.start_exporting()?;

        info!(
            "Exporting {} items with {} to {}",
            item_schema.class_name(),
            exporter_name,
            file
        );
        *self.exporter.borrow_mut() = Some(exporter);
        Ok(())
    }

    /// Exports the record and passes it on to the next stage.
    ///
    /// # Errors
    ///
    /// [`FeedError::InvalidState`] when the pipeline is not open, and the
    /// errors of [`FeedItemExporter::export_item`].
    pub fn process_item(&self, item: FeedItem) -> Result<FeedItem, FeedError> {
        self.with_exporter(|exporter| exporter.export_item(&item))?;
        Ok(item)
    }

    /// Finishes the document and closes the feed file.
    pub fn close(&self) -> Result<(), FeedError> {
        let exporter = self
            .exporter
            .borrow_mut()
            .take()
            .ok_or_else(|| FeedError::InvalidState("pipeline is not open".to_string()))?;
        exporter.finish_exporting()?;
        exporter.into_inner()?;
        info!("Feed file closed");
        Ok(())
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    fn with_exporter<F>(&self, f: F) -> Result<(), FeedError>
    where
        F: FnOnce(&FeedItemExporter<File>) -> Result<(), FeedError>,
    {
        match self.exporter.borrow().as_ref() {
            Some(exporter) => f(exporter),
            None => Err(FeedError::InvalidState("pipeline is not open".to_string())),
        }
    }
}

impl ItemWriter<FeedItem> for FeedExportPipeline {
    fn write(&self, items: &[FeedItem]) -> ItemWriterResult {
        self.with_exporter(|exporter| exporter.write(items))
    }

    fn flush(&self) -> ItemWriterResult {
        self.with_exporter(|exporter| exporter.flush())
    }

    fn open(&self) -> ItemWriterResult {
        FeedExportPipeline::open(self)
    }

    fn close(&self) -> ItemWriterResult {
        FeedExportPipeline::close(self)
    }
}

/// Builder for [`FeedExportPipeline`].
///
/// [`RSS_ITEM`] is registered as `RssItem`, the plain exporter as
/// `FeedItemExporter` and `RssItemExporter`.
pub struct FeedExportPipelineBuilder {
    settings: FeedSettings,
    item_classes: BTreeMap<String, Arc<ElementSchema>>,
    exporters: BTreeMap<String, ExporterPreset>,
}

impl Default for FeedExportPipelineBuilder {
    fn default() -> Self {
        let mut item_classes = BTreeMap::new();
        item_classes.insert(DEFAULT_ITEM_CLASS.to_string(), Arc::clone(&RSS_ITEM));
        let mut exporters: BTreeMap<String, ExporterPreset> = BTreeMap::new();
        exporters.insert(DEFAULT_EXPORTER.to_string(), |builder| builder);
        exporters.insert("RssItemExporter".to_string(), |builder| builder);
        Self {
            settings: FeedSettings::default(),
            item_classes,
            exporters,
        }
    }
}

impl FeedExportPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: FeedSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers an item schema under its class name.
    pub fn item_class(mut self, schema: &Arc<ElementSchema>) -> Self {
        debug!("Registering item class {}", schema.class_name());
        self.item_classes
            .insert(schema.class_name().to_string(), Arc::clone(schema));
        self
    }

    /// Registers an exporter preset selectable with `FEED_EXPORTER`.
    pub fn exporter(mut self, name: &str, preset: ExporterPreset) -> Self {
        self.exporters.insert(name.to_string(), preset);
        self
    }

    pub fn build(self) -> FeedExportPipeline {
        FeedExportPipeline {
            settings: self.settings,
            item_classes: self.item_classes,
            exporters: self.exporters,
            exporter: RefCell::new(None),
        }
    }
}
