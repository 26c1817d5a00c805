use crate::domain::data::Service;
use crate::domain::model::{
    ExtraService, FreightResponse, Package, PostingCard, TrackingCode, User, ZipCode,
};
use crate::domain::posting_list::{Closed, Open, PostingList};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Arguments of a freight quote, borrowed from a closed label.
#[derive(Debug, Clone, Copy)]
pub struct FreightQuery<'a> {
    pub posting_card: &'a PostingCard,
    pub services: &'a [Service],
    pub from: &'a ZipCode,
    pub to: &'a ZipCode,
    pub package: &'a Package,
    pub declared_value: f64,
    pub extra_services: &'a [ExtraService],
}

/// The carrier's remote registrar.
///
/// Every call is a single remote round trip. Implementations must not retry
/// and must report failures as `SigepError::RemoteOperation`.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn request_tracking_codes(
        &self,
        user: &User,
        service: Service,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>>;

    /// Submits an open list. The returned list is the carrier's authoritative copy
    /// and holds only the labels it accepted.
    async fn close_posting_list(
        &self,
        posting_list: PostingList<Open>,
        posting_card: &PostingCard,
    ) -> Result<PostingList<Closed>>;

    /// Estimated delivery time in days.
    async fn calculate_delivery_time(
        &self,
        service: Service,
        from: &ZipCode,
        to: &ZipCode,
    ) -> Result<u32>;

    async fn calculate_freights(&self, query: FreightQuery<'_>) -> Result<Vec<FreightResponse>>;

    async fn verify_service_availability(
        &self,
        posting_card: &PostingCard,
        service: Service,
        from: &ZipCode,
        to: &ZipCode,
    ) -> Result<bool>;

    async fn get_posting_card_status(&self, posting_card: &PostingCard) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub page_size: PageSize,
    pub labels_per_page: usize,
    /// Blank columns on the left of every label line.
    pub shipping_labels_margin: usize,
    /// Blank lines above the manifest header.
    pub posting_list_margin: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            page_size: PageSize::A4,
            labels_per_page: 4,
            shipping_labels_margin: 0,
            posting_list_margin: 0,
        }
    }
}

/// An in-memory rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)?;
        tracing::debug!(path = %path.display(), bytes = self.bytes.len(), "Document saved");
        Ok(())
    }
}

pub trait DocumentRenderer: Send + Sync {
    fn render_labels(
        &self,
        posting_list: &PostingList<Closed>,
        layout: &LayoutOptions,
    ) -> Result<Document>;

    fn render_posting_list(
        &self,
        posting_list: &PostingList<Closed>,
        layout: &LayoutOptions,
    ) -> Result<Document>;
}

/// Source of posting-list ids when the caller does not supply one.
pub trait BatchIdGenerator: Send + Sync {
    fn next_id(&self) -> u32;
}

impl<F> BatchIdGenerator for F
where
    F: Fn() -> u32 + Send + Sync,
{
    fn next_id(&self) -> u32 {
        self()
    }
}
