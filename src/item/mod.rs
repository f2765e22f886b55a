/// RSS 2.0 streaming export.
pub mod xml;

#[cfg(feature = "pipeline")]
/// This module provides a scraping pipeline that exports items to an RSS file.
pub mod pipeline;
