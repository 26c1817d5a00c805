use crate::config::toml_config::SessionConfig;
use crate::core::accumulator::BatchAccumulator;
use crate::core::allocator::TrackingCodeAllocator;
use crate::core::closer::{CloserState, PostingListCloser};
use crate::core::documents::DocumentRendererGateway;
use crate::core::metrics::{
    AvailabilityLookup, DeliveryTimeLookup, FreightLookup, LabelSequence, MetricsGateway,
};
use crate::domain::data::{Service, ServiceSelector};
use crate::domain::model::{
    AddressFields, Contract, Package, PackageFields, PartyAddress, PostingCard, TrackingCode,
    User, ZipCode,
};
use crate::domain::ports::{BatchIdGenerator, Document, DocumentRenderer, LayoutOptions, Registrar};
use crate::domain::posting_list::{Closed, PostingList};
use crate::utils::error::{Result, SigepError};
use crate::utils::validation::Validate;
use std::path::Path;

/// One shipping session: a registrar, a renderer and the batch being prepared.
///
/// The session owns the in-progress batch and the last closed posting list.
/// Metrics and rendering borrow the closed list; they never modify it.
///
/// Typical use:
///
/// 1. `PostingSession::from_config(&config, registrar, renderer)?`
/// 2. `set_sender`, `set_receiver`, `add_package` (once per package)
/// 3. `close_posting_list(None).await?`
/// 4. `generate_labels_document(path, None)?` / `generate_manifest_document(path, None)?`
/// 5. optionally `delivery_times()?`, `freights()?`, `service_availability()?`
pub struct PostingSession<R, D> {
    posting_card: PostingCard,
    registrar: R,
    renderer: D,
    layout: LayoutOptions,
    accumulator: BatchAccumulator,
    closer: PostingListCloser,
    posting_list: Option<PostingList<Closed>>,
}

impl<R: Registrar, D: DocumentRenderer> PostingSession<R, D> {
    pub fn new(posting_card: PostingCard, registrar: R, renderer: D) -> Self {
        Self {
            posting_card,
            registrar,
            renderer,
            layout: LayoutOptions::default(),
            accumulator: BatchAccumulator::new(),
            closer: PostingListCloser::new(),
            posting_list: None,
        }
    }

    /// Validates the configuration once and builds the session's posting card from it.
    pub fn from_config(config: &SessionConfig, registrar: R, renderer: D) -> Result<Self> {
        config.validate()?;
        let posting_card = config.posting_card()?;
        tracing::info!(
            posting_card = %posting_card.number,
            regional_direction = posting_card.contract.regional_direction.code,
            "Session created"
        );
        Ok(Self::new(posting_card, registrar, renderer).with_layout(config.layout.clone().unwrap_or_default()))
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_id_generator(mut self, generator: impl BatchIdGenerator + 'static) -> Self {
        self.closer = PostingListCloser::with_id_generator(generator);
        self
    }

    pub fn user(&self) -> &User {
        self.posting_card.user()
    }

    pub fn contract(&self) -> &Contract {
        &self.posting_card.contract
    }

    pub fn posting_card(&self) -> &PostingCard {
        &self.posting_card
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn renderer(&self) -> &D {
        &self.renderer
    }

    pub fn layout(&self) -> &LayoutOptions {
        &self.layout
    }

    pub fn add_package(&mut self, fields: PackageFields) -> Result<&Package> {
        self.accumulator.add_package(fields)
    }

    pub fn set_sender(&mut self, fields: AddressFields) -> Result<&PartyAddress> {
        self.accumulator.set_sender(fields)
    }

    pub fn set_receiver(&mut self, fields: AddressFields) -> Result<&PartyAddress> {
        self.accumulator.set_receiver(fields)
    }

    pub fn packages(&self) -> &[Package] {
        self.accumulator.packages()
    }

    pub fn sender(&self) -> Option<&PartyAddress> {
        self.accumulator.sender()
    }

    pub fn receiver(&self) -> Option<&PartyAddress> {
        self.accumulator.receiver()
    }

    pub fn closer_state(&self) -> CloserState {
        self.closer.state()
    }

    /// Closes the accumulated batch with the registrar.
    ///
    /// On success the closed list replaces the previous one and the batch is
    /// cleared. On failure the batch and the previously closed list are kept.
    pub async fn close_posting_list(&mut self, custom_id: Option<u32>) -> Result<&PostingList<Closed>> {
        let closed = self
            .closer
            .close(
                &mut self.accumulator,
                &self.registrar,
                &self.posting_card,
                custom_id,
            )
            .await?;
        Ok(self.posting_list.insert(closed))
    }

    pub fn posting_list(&self) -> Option<&PostingList<Closed>> {
        self.posting_list.as_ref()
    }

    /// Tracking codes of the closed list, in label order.
    pub fn tracking_codes(&self) -> Result<Vec<TrackingCode>> {
        self.posting_list
            .as_ref()
            .map(|list| list.tracking_codes().cloned().collect())
            .ok_or(SigepError::NotClosed)
    }

    /// Requests codes outside of a close, e.g. to pre-print labels elsewhere.
    pub async fn request_tracking_codes(
        &self,
        service: impl Into<ServiceSelector>,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        TrackingCodeAllocator::new(&self.registrar, self.user())
            .allocate(service, quantity)
            .await
    }

    /// Status of `posting_card`, or of the session's own card when `None`.
    pub async fn get_posting_card_status(&self, posting_card: Option<&PostingCard>) -> Result<bool> {
        let card = posting_card.unwrap_or(&self.posting_card);
        self.registrar.get_posting_card_status(card).await
    }

    pub fn metrics(&self) -> MetricsGateway<'_, R> {
        MetricsGateway::new(&self.registrar, self.posting_list.as_ref())
    }

    pub fn delivery_times(&self) -> Result<LabelSequence<'_, DeliveryTimeLookup<'_, R>>> {
        self.metrics().delivery_times()
    }

    pub fn freights(&self) -> Result<LabelSequence<'_, FreightLookup<'_, R>>> {
        self.metrics().freights()
    }

    pub fn service_availability(&self) -> Result<LabelSequence<'_, AvailabilityLookup<'_, R>>> {
        self.metrics().service_availability()
    }

    /// Single availability query for an explicit route, using the session's card.
    pub async fn verify_service_availability(
        &self,
        service: impl Into<ServiceSelector>,
        from: &ZipCode,
        to: &ZipCode,
    ) -> Result<bool> {
        let service: Service = service.into().resolve()?;
        self.metrics()
            .check_service_availability(&self.posting_card, service, from, to)
            .await
    }

    pub fn documents(&self) -> DocumentRendererGateway<'_, D> {
        DocumentRendererGateway::new(&self.renderer, self.posting_list.as_ref(), &self.layout)
    }

    pub fn render_labels(&self, layout: Option<&LayoutOptions>) -> Result<Document> {
        self.documents().render_labels(layout)
    }

    pub fn render_manifest(&self, layout: Option<&LayoutOptions>) -> Result<Document> {
        self.documents().render_manifest(layout)
    }

    pub fn generate_labels_document<P: AsRef<Path>>(
        &self,
        path: P,
        layout: Option<&LayoutOptions>,
    ) -> Result<()> {
        self.render_labels(layout)?.save(path)
    }

    pub fn generate_manifest_document<P: AsRef<Path>>(
        &self,
        path: P,
        layout: Option<&LayoutOptions>,
    ) -> Result<()> {
        self.render_manifest(layout)?.save(path)
    }
}
