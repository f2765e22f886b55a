use crate::error::FeedError;

/// Result of an [`ItemWriter`] operation.
pub type ItemWriterResult = Result<(), FeedError>;

/// Destination of exported items.
///
/// `open` is called once before the first chunk, `write` once per chunk and
/// `close` once after the last one.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
