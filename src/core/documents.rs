use crate::domain::ports::{Document, DocumentRenderer, LayoutOptions};
use crate::domain::posting_list::{Closed, PostingList};
use crate::utils::error::{Result, SigepError};

/// Hands the closed posting list to the document renderer.
pub struct DocumentRendererGateway<'a, D: ?Sized> {
    renderer: &'a D,
    posting_list: Option<&'a PostingList<Closed>>,
    layout: &'a LayoutOptions,
}

impl<'a, D: DocumentRenderer + ?Sized> DocumentRendererGateway<'a, D> {
    pub fn new(
        renderer: &'a D,
        posting_list: Option<&'a PostingList<Closed>>,
        layout: &'a LayoutOptions,
    ) -> Self {
        Self {
            renderer,
            posting_list,
            layout,
        }
    }

    fn closed(&self) -> Result<&'a PostingList<Closed>> {
        self.posting_list.ok_or(SigepError::NotClosed)
    }

    pub fn render_labels(&self, layout: Option<&LayoutOptions>) -> Result<Document> {
        let list = self.closed()?;
        let document = self
            .renderer
            .render_labels(list, layout.unwrap_or(self.layout))?;
        tracing::debug!(batch_id = list.custom_id(), bytes = document.bytes.len(), "Labels rendered");
        Ok(document)
    }

    pub fn render_manifest(&self, layout: Option<&LayoutOptions>) -> Result<Document> {
        let list = self.closed()?;
        let document = self
            .renderer
            .render_posting_list(list, layout.unwrap_or(self.layout))?;
        tracing::debug!(batch_id = list.custom_id(), bytes = document.bytes.len(), "Manifest rendered");
        Ok(document)
    }
}
