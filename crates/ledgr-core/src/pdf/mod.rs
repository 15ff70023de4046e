//! PDF text source for statements.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::SourceError;
use crate::statement::SourceDocument;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Something that can turn raw document bytes into statement text.
pub trait TextSource {
    /// Load a document from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Number of pages in the loaded document.
    fn page_count(&self) -> usize;

    /// Full document text.
    fn extract_text(&self) -> Result<String>;

    /// Load `data` and wrap its text as a [`SourceDocument`].
    fn read_document(&mut self, id: &str, data: &[u8]) -> Result<SourceDocument> {
        self.load(data)?;
        let text = self.extract_text()?;
        Ok(SourceDocument::new(id, text).with_pages(self.page_count()))
    }
}
